//! Link orchestration.
//!
//! Links the host and device objects into one shared module against both
//! toolchains' runtime libraries. Re-linking is skipped when the output is
//! already newer than every object; this is a coarse timestamp check, not a
//! content hash, and that is a documented limitation rather than a bug.

use std::path::{Path, PathBuf};

use crate::builder::dispatch::ObjectArtifact;
use crate::builder::errors::BuildError;
use crate::builder::toolchain::{CommandSpec, CudaToolchain, LinkInput, Toolchain};
use crate::util::fs::modified_time;
use crate::util::process::ProcessBuilder;

/// Device runtime libraries every mixed link requires. Objects produced by
/// nvcc reference the runtime even when the caller's library list omits it.
pub const DEVICE_RUNTIME_LIBS: &[&str] = &["cudart", "cuda"];

/// What to link, supplied by the caller from build configuration.
#[derive(Debug, Clone, Default)]
pub struct LinkSpec {
    pub objects: Vec<ObjectArtifact>,
    pub libraries: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    /// Unsupported for this link model; a non-empty value warns and is
    /// dropped.
    pub runtime_library_dirs: Vec<PathBuf>,
    pub output: PathBuf,
    pub exports: Vec<String>,
}

/// Terminal build value.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub objects: Vec<ObjectArtifact>,
    pub output: PathBuf,
    /// Generated import library, when the target exports symbols
    pub import_lib: Option<PathBuf>,
    /// True when the output was already current and no process was spawned
    pub skipped: bool,
    /// Non-fatal problems (unsupported requests, post-link copy failures)
    pub warnings: Vec<String>,
}

/// Assembles and executes the link step.
pub struct LinkOrchestrator {
    host: Box<dyn Toolchain>,
    cuda: CudaToolchain,
}

impl LinkOrchestrator {
    pub fn new(host: Box<dyn Toolchain>, cuda: CudaToolchain) -> Self {
        LinkOrchestrator { host, cuda }
    }

    /// Link the objects into `spec.output`, or skip if already current.
    pub fn link(&self, spec: &LinkSpec) -> Result<BuildResult, BuildError> {
        let objects = spec.objects.clone();

        if self.is_up_to_date(spec) {
            tracing::info!("{} is up to date, skipping link", spec.output.display());
            return Ok(BuildResult {
                objects,
                output: spec.output.clone(),
                import_lib: None,
                skipped: true,
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();

        if !spec.runtime_library_dirs.is_empty() {
            let msg = "runtime_library_dirs is not supported for this linker; ignoring";
            tracing::warn!("{msg}");
            warnings.push(msg.to_string());
        }

        let implib = self.import_lib_path(spec);
        let cmd = self.link_command(spec, implib.clone());

        tracing::debug!("linking {}", spec.output.display());
        execute(&cmd).map_err(|e| BuildError::link(&spec.output, e))?;

        self.post_link(spec, &mut warnings);

        Ok(BuildResult {
            objects,
            output: spec.output.clone(),
            import_lib: implib,
            skipped: false,
            warnings,
        })
    }

    /// Output exists and is at least as new as every object. Timestamps
    /// that are exactly equal count as current.
    fn is_up_to_date(&self, spec: &LinkSpec) -> bool {
        let Some(out_time) = modified_time(&spec.output) else {
            return false;
        };

        spec.objects
            .iter()
            .all(|obj| match modified_time(&obj.object) {
                Some(obj_time) => out_time >= obj_time,
                None => false,
            })
    }

    /// Import library path: output base name, import-library extension,
    /// placed beside the first object file. Intermediate linker artifacts
    /// belong in the build-temporary area, not the install area.
    fn import_lib_path(&self, spec: &LinkSpec) -> Option<PathBuf> {
        if spec.exports.is_empty() {
            return None;
        }

        let stem = spec.output.file_stem()?.to_string_lossy().into_owned();
        let dir = spec
            .objects
            .first()
            .and_then(|obj| obj.object.parent())
            .map(Path::to_path_buf)?;

        Some(dir.join(format!("{stem}.{}", self.host.import_lib_extension())))
    }

    /// Assemble the full link command. Pure; no spawn.
    pub fn link_command(&self, spec: &LinkSpec, implib: Option<PathBuf>) -> CommandSpec {
        let mut lib_dirs = spec.library_dirs.clone();
        if !lib_dirs.contains(&self.cuda.lib_dir) {
            lib_dirs.push(self.cuda.lib_dir.clone());
        }

        let mut libs = spec.libraries.clone();
        for required in DEVICE_RUNTIME_LIBS {
            if !libs.iter().any(|l| l == required) {
                libs.push((*required).to_string());
            }
        }

        let input = LinkInput {
            objects: spec.objects.iter().map(|o| o.object.clone()).collect(),
            output: spec.output.clone(),
            lib_dirs,
            libs,
            ldflags: Vec::new(),
            exports: spec.exports.clone(),
            implib,
        };

        self.host.link_shared_command(&input)
    }

    /// Toolchain-mandated post-link step: place the shared CUDA runtime
    /// next to the output so the module loads outside the toolkit
    /// environment. Best effort; failure becomes a warning, never an error.
    fn post_link(&self, spec: &LinkSpec, warnings: &mut Vec<String>) {
        let Some(out_dir) = spec.output.parent() else {
            return;
        };

        for dir in [self.cuda.root.join("bin"), self.cuda.lib_dir.clone()] {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !is_cudart_redist(&name) {
                    continue;
                }
                let dest = out_dir.join(&name);
                if let Err(e) = std::fs::copy(entry.path(), &dest) {
                    let msg = format!(
                        "failed to copy runtime {} next to output: {e}",
                        entry.path().display()
                    );
                    tracing::warn!("{msg}");
                    warnings.push(msg);
                }
            }
        }
    }
}

/// Shared cudart redistributable: `cudart64_*.dll` or `libcudart.so*`.
fn is_cudart_redist(name: &str) -> bool {
    (name.starts_with("cudart") && name.ends_with(".dll"))
        || name.starts_with("libcudart.so")
        || name.starts_with("libcudart.dylib")
}

fn execute(spec: &CommandSpec) -> Result<(), BuildError> {
    ProcessBuilder::new(&spec.program)
        .args(spec.args.iter())
        .exec_checked()?;
    Ok(())
}
