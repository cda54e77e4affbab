//! drydock - heterogeneous host/CUDA toolchain build dispatcher.
//!
//! Extends a native-extension build pipeline so that a compilation unit set
//! spanning host C/C++ sources and CUDA device sources is compiled by the
//! correct toolchain per file, then linked into one shared module against
//! both host and device runtime libraries.

pub mod builder;
pub mod manifest;
pub mod util;

pub use builder::{
    BuildError, BuildResult, CompileDispatcher, CompileOptions, CudaLocator, CudaToolchain,
    ExtensionCustomizer, LinkOrchestrator, LinkSpec, ObjectArtifact, SourceKind, SourceUnit,
};
pub use manifest::Manifest;
