//! Per-source compiler dispatch.
//!
//! One compilation unit set may span host C/C++ sources, CUDA device
//! sources, and Windows resource/message-catalog sources. Each unit is
//! routed to the toolchain that understands it, and the toolchain-agnostic
//! flag options are translated into that toolchain's command-line syntax.
//!
//! Compilation is synchronous: one blocking process spawn per unit, in
//! caller order. The dispatcher stops at the first hard failure but hands
//! back the artifacts produced up to that point.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::builder::errors::BuildError;
use crate::builder::toolchain::{
    CommandSpec, CompileInput, CudaToolchain, Language, Toolchain,
};
use crate::util::process::ProcessBuilder;

/// Classification of a source file by extension. Closed set; dispatch over
/// it is exhaustive so a new kind cannot silently fall through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Host C source (`.c`)
    C,
    /// Host C++ source (`.cc`, `.cpp`, `.cxx`)
    Cxx,
    /// CUDA device source (`.cu`)
    Cuda,
    /// Windows resource script (`.rc`)
    Resource,
    /// Windows message catalog (`.mc`)
    MessageCatalog,
    /// Anything else; carries the offending extension for diagnostics
    Unknown(String),
}

impl SourceKind {
    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> SourceKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "c" => SourceKind::C,
            "cc" | "cpp" | "cxx" => SourceKind::Cxx,
            "cu" => SourceKind::Cuda,
            "rc" => SourceKind::Resource,
            "mc" => SourceKind::MessageCatalog,
            _ => SourceKind::Unknown(format!(".{ext}")),
        }
    }
}

/// A classified source file. Immutable once classified.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceUnit {
    /// Classify one source path.
    pub fn classify(path: impl Into<PathBuf>) -> SourceUnit {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        SourceUnit { path, kind }
    }
}

/// Which toolchain produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainId {
    Host,
    Device,
    /// Resource/message tools that bypass both main compilers
    Auxiliary,
}

/// One object file, produced from exactly one source unit.
#[derive(Debug, Clone)]
pub struct ObjectArtifact {
    pub source: PathBuf,
    pub object: PathBuf,
    pub toolchain: ToolchainId,
}

/// Compiler flag input as callers supply it.
///
/// The keyed form separates the two toolchains' incompatible flag syntaxes.
/// The flat form is a legacy shape: one list applied to both toolchains
/// identically. It is normalized into [`CompileOptions`] once at the
/// boundary and never branched on downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompileFlags {
    Flat(Vec<String>),
    Keyed {
        #[serde(default)]
        host: Vec<String>,
        #[serde(default)]
        device: Vec<String>,
    },
}

impl Default for CompileFlags {
    fn default() -> Self {
        CompileFlags::Flat(Vec::new())
    }
}

/// Canonical per-toolchain flag mapping. Missing keys default to empty.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub host: Vec<String>,
    pub device: Vec<String>,
}

impl From<CompileFlags> for CompileOptions {
    fn from(flags: CompileFlags) -> Self {
        match flags {
            CompileFlags::Flat(list) => CompileOptions {
                host: list.clone(),
                device: list,
            },
            CompileFlags::Keyed { host, device } => CompileOptions { host, device },
        }
    }
}

/// A failed compile run: the fatal error plus the artifacts that were
/// already produced (no rollback).
#[derive(Debug)]
pub struct CompileFailure {
    pub produced: Vec<ObjectArtifact>,
    pub error: BuildError,
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for CompileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Routes each source unit to the right compiler and executes it.
pub struct CompileDispatcher {
    host: Box<dyn Toolchain>,
    cuda: CudaToolchain,
    build_dir: PathBuf,
    include_dirs: Vec<PathBuf>,
    defines: Vec<(String, Option<String>)>,
    resource_tool: PathBuf,
    message_tool: PathBuf,
}

impl CompileDispatcher {
    /// Create a dispatcher writing objects into `build_dir`.
    pub fn new(host: Box<dyn Toolchain>, cuda: CudaToolchain, build_dir: PathBuf) -> Self {
        CompileDispatcher {
            host,
            cuda,
            build_dir,
            include_dirs: Vec::new(),
            defines: Vec::new(),
            resource_tool: PathBuf::from("rc"),
            message_tool: PathBuf::from("mc"),
        }
    }

    /// Extra include directories applied to every unit.
    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    /// Preprocessor defines applied to host and resource units.
    pub fn with_defines(mut self, defines: Vec<(String, Option<String>)>) -> Self {
        self.defines = defines;
        self
    }

    /// Override the resource compiler (defaults to `rc`).
    pub fn with_resource_tool(mut self, tool: PathBuf) -> Self {
        self.resource_tool = tool;
        self
    }

    /// Override the message compiler (defaults to `mc`).
    pub fn with_message_tool(mut self, tool: PathBuf) -> Self {
        self.message_tool = tool;
        self
    }

    pub fn host_toolchain(&self) -> &dyn Toolchain {
        self.host.as_ref()
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Object path for a source unit: build dir, source stem, per-kind
    /// extension.
    pub fn object_path(&self, unit: &SourceUnit) -> PathBuf {
        let stem = unit
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let ext = match unit.kind {
            SourceKind::Resource | SourceKind::MessageCatalog => "res",
            _ => self.host.object_extension(),
        };

        self.build_dir.join(format!("{stem}.{ext}"))
    }

    /// Compile every unit, one blocking spawn at a time, in caller order.
    ///
    /// Stops at the first failure; artifacts already produced are returned
    /// inside the [`CompileFailure`] for inspection.
    pub fn compile(
        &self,
        sources: &[SourceUnit],
        options: &CompileOptions,
    ) -> Result<Vec<ObjectArtifact>, CompileFailure> {
        // objects are named by source stem, so two sources sharing a stem
        // would overwrite each other's object; refuse up front
        for (i, unit) in sources.iter().enumerate() {
            let object = self.object_path(unit);
            if let Some(prior) = sources[..i].iter().find(|p| self.object_path(p) == object) {
                return Err(CompileFailure {
                    produced: Vec::new(),
                    error: BuildError::DuplicateObject {
                        first: prior.path.clone(),
                        second: unit.path.clone(),
                        object,
                    },
                });
            }
        }

        let mut produced = Vec::new();

        for unit in sources {
            match self.compile_unit(unit, options) {
                Ok(artifact) => produced.push(artifact),
                Err(error) => {
                    return Err(CompileFailure { produced, error });
                }
            }
        }

        Ok(produced)
    }

    /// Dispatch a single unit to its toolchain.
    fn compile_unit(
        &self,
        unit: &SourceUnit,
        options: &CompileOptions,
    ) -> Result<ObjectArtifact, BuildError> {
        let object = self.object_path(unit);

        match unit.kind {
            SourceKind::C => self.run_host(unit, &object, options, Language::C),
            SourceKind::Cxx => self.run_host(unit, &object, options, Language::Cxx),
            SourceKind::Cuda => self.run_device(unit, &object, options),
            SourceKind::Resource => self.run_resource(&unit.path, &object),
            SourceKind::MessageCatalog => self.run_message_catalog(unit, &object),
            SourceKind::Unknown(ref extension) => Err(BuildError::UnsupportedSourceKind {
                path: unit.path.clone(),
                object,
                extension: extension.clone(),
            }),
        }
    }

    /// Host compile command for a C/C++ unit. Pure assembly, no spawn.
    pub fn host_command(
        &self,
        unit: &SourceUnit,
        object: &Path,
        options: &CompileOptions,
        lang: Language,
    ) -> CommandSpec {
        let input = CompileInput {
            source: unit.path.clone(),
            output: object.to_path_buf(),
            include_dirs: self.include_dirs.clone(),
            defines: self.defines.clone(),
            cflags: options.host.clone(),
        };

        self.host.compile_command(&input, lang)
    }

    /// Device compile command for a CUDA unit. nvcc takes the source as a
    /// bare positional argument and the object via `-o`, regardless of the
    /// host compiler's output-flag syntax. nvcc links by default, so `-c`
    /// is supplied when the caller's device flags do not already carry it.
    pub fn device_command(
        &self,
        unit: &SourceUnit,
        object: &Path,
        options: &CompileOptions,
    ) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cuda.nvcc);

        cmd = cmd.args(options.device.iter().cloned());
        if !options.device.iter().any(|f| f == "-c") {
            cmd = cmd.arg("-c");
        }

        cmd = cmd.arg(format!("-I{}", self.cuda.include.display()));
        for dir in &self.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        cmd = cmd.arg(unit.path.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(object.display().to_string());

        cmd
    }

    /// Resource compile command: the resource compiler runs directly,
    /// bypassing both main compilers, with preprocessor options forwarded.
    pub fn resource_command(&self, source: &Path, object: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.resource_tool);

        for (name, value) in &self.defines {
            match value {
                Some(v) => cmd = cmd.arg(format!("/D{}={}", name, v)),
                None => cmd = cmd.arg(format!("/D{}", name)),
            }
        }

        cmd = cmd.arg(format!("/fo{}", object.display()));
        cmd = cmd.arg(source.display().to_string());

        cmd
    }

    /// Message-catalog generation command. The header lands beside the
    /// source; the resource script lands in the build directory.
    pub fn message_command(&self, source: &Path) -> CommandSpec {
        let header_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        CommandSpec::new(&self.message_tool)
            .arg("-h")
            .arg(header_dir.display().to_string())
            .arg("-r")
            .arg(self.build_dir.display().to_string())
            .arg(source.display().to_string())
    }

    fn run_host(
        &self,
        unit: &SourceUnit,
        object: &Path,
        options: &CompileOptions,
        lang: Language,
    ) -> Result<ObjectArtifact, BuildError> {
        tracing::debug!(
            "compiling {} -> {} ({})",
            unit.path.display(),
            object.display(),
            lang.as_str()
        );

        let spec = self.host_command(unit, object, options, lang);
        execute(&spec).map_err(|e| BuildError::compile(&unit.path, e))?;

        Ok(ObjectArtifact {
            source: unit.path.clone(),
            object: object.to_path_buf(),
            toolchain: ToolchainId::Host,
        })
    }

    fn run_device(
        &self,
        unit: &SourceUnit,
        object: &Path,
        options: &CompileOptions,
    ) -> Result<ObjectArtifact, BuildError> {
        tracing::debug!(
            "compiling {} -> {} (nvcc)",
            unit.path.display(),
            object.display()
        );

        let spec = self.device_command(unit, object, options);
        execute(&spec).map_err(|e| BuildError::compile(&unit.path, e))?;

        Ok(ObjectArtifact {
            source: unit.path.clone(),
            object: object.to_path_buf(),
            toolchain: ToolchainId::Device,
        })
    }

    fn run_resource(&self, source: &Path, object: &Path) -> Result<ObjectArtifact, BuildError> {
        tracing::debug!(
            "compiling resource {} -> {}",
            source.display(),
            object.display()
        );

        let spec = self.resource_command(source, object);
        execute(&spec).map_err(|e| BuildError::compile(source, e))?;

        Ok(ObjectArtifact {
            source: source.to_path_buf(),
            object: object.to_path_buf(),
            toolchain: ToolchainId::Auxiliary,
        })
    }

    /// Two-step pipeline: generate the resource script and header from the
    /// catalog, then compile the generated script. Both steps must succeed.
    fn run_message_catalog(
        &self,
        unit: &SourceUnit,
        object: &Path,
    ) -> Result<ObjectArtifact, BuildError> {
        tracing::debug!("generating resource script for {}", unit.path.display());

        let spec = self.message_command(&unit.path);
        execute(&spec).map_err(|e| BuildError::compile(&unit.path, e))?;

        let stem = unit
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let generated_rc = self.build_dir.join(format!("{stem}.rc"));

        let mut artifact = self.run_resource(&generated_rc, object)?;
        // report the catalog, not the intermediate script, as the source
        artifact.source = unit.path.clone();
        Ok(artifact)
    }
}

fn execute(spec: &CommandSpec) -> Result<(), BuildError> {
    ProcessBuilder::new(&spec.program)
        .args(spec.args.iter())
        .exec_checked()?;
    Ok(())
}
