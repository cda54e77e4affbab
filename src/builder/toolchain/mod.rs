//! Toolchain abstraction for the host and device compilers.
//!
//! The host (primary) toolchain is a C/C++ compiler and linker reached
//! through the [`Toolchain`] trait, with GCC/Clang and MSVC implementations.
//! The device (secondary) toolchain is the CUDA toolkit, resolved by
//! [`cuda::CudaLocator`] into a [`cuda::CudaToolchain`] descriptor.
//!
//! Command assembly is pure: implementations build a [`CommandSpec`] and
//! never spawn anything themselves.

use std::path::{Path, PathBuf};

mod detect;
mod gcc;
mod msvc;

pub mod cuda;

pub use cuda::{CudaLocator, CudaToolchain};
pub use detect::detect_host_toolchain;
pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

/// Source language of a host compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }
}

/// A command to execute: program plus arguments.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "cl.exe")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }
}

/// Input for a host compile step.
#[derive(Debug, Clone, Default)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines (name, optional value)
    pub defines: Vec<(String, Option<String>)>,
    /// Additional compiler flags
    pub cflags: Vec<String>,
}

/// Input for a shared-module link step.
#[derive(Debug, Clone, Default)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output shared module
    pub output: PathBuf,
    /// Library search paths
    pub lib_dirs: Vec<PathBuf>,
    /// Libraries to link (bare names, no -l prefix or .lib suffix)
    pub libs: Vec<String>,
    /// Additional linker flags
    pub ldflags: Vec<String>,
    /// Symbols the module exports
    pub exports: Vec<String>,
    /// Import library to generate, when the platform produces one
    pub implib: Option<PathBuf>,
}

/// The platform/family of a host toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Gcc,
    Clang,
    Msvc,
}

impl HostPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPlatform::Gcc => "gcc",
            HostPlatform::Clang => "clang",
            HostPlatform::Msvc => "msvc",
        }
    }
}

/// Trait for host toolchain implementations.
///
/// Each toolchain knows how to translate the toolchain-agnostic inputs into
/// its own command-line syntax.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain platform.
    fn platform(&self) -> HostPlatform;

    /// Get the C compiler path.
    fn compiler_path(&self) -> &Path;

    /// Generate a compile command for one source file.
    ///
    /// The C++ language-mode flag (or driver selection) is applied only when
    /// `lang` is [`Language::Cxx`]; plain C compiles must not receive it.
    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec;

    /// Generate a link command producing a shared extension module.
    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec;

    /// Get the object file extension.
    fn object_extension(&self) -> &str;

    /// Get the shared module extension.
    fn shared_lib_extension(&self) -> &str;

    /// Get the import library extension, for platforms that produce one.
    fn import_lib_extension(&self) -> &str;
}
