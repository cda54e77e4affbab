//! Build pipeline: toolchain resolution, per-source compiler dispatch,
//! and link orchestration.

pub mod dispatch;
pub mod errors;
pub mod extension;
pub mod link;
pub mod toolchain;

pub use dispatch::{
    CompileDispatcher, CompileFailure, CompileFlags, CompileOptions, ObjectArtifact, SourceKind,
    SourceUnit, ToolchainId,
};
pub use errors::BuildError;
pub use extension::{BaseBuild, CompileHandler, ExtensionCustomizer, LinkHandler, ManifestBuild};
pub use link::{BuildResult, LinkOrchestrator, LinkSpec, DEVICE_RUNTIME_LIBS};
pub use toolchain::{detect_host_toolchain, CudaLocator, CudaToolchain, Toolchain};
