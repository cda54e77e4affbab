//! Build-extension integration seam.
//!
//! The base build mechanism owns source enumeration, flag supply, output
//! placement, and the overall flow; this crate supplies the compile and
//! link behavior. The seam is explicit dependency injection:
//! [`CompileHandler`] and [`LinkHandler`] are the extension points, and
//! [`ExtensionCustomizer`] installs this crate's implementations before
//! delegating to the base flow. No behavior is overridden in place.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::dispatch::{
    CompileDispatcher, CompileFailure, CompileOptions, ObjectArtifact, SourceUnit,
};
use crate::builder::errors::BuildError;
use crate::builder::link::{BuildResult, LinkOrchestrator, LinkSpec};
use crate::manifest::Manifest;
use crate::util::fs::{ensure_dir, glob_files};

/// Compile extension point: file list in, object list out.
pub trait CompileHandler {
    fn compile(
        &self,
        sources: &[SourceUnit],
        options: &CompileOptions,
    ) -> Result<Vec<ObjectArtifact>, CompileFailure>;
}

impl CompileHandler for CompileDispatcher {
    fn compile(
        &self,
        sources: &[SourceUnit],
        options: &CompileOptions,
    ) -> Result<Vec<ObjectArtifact>, CompileFailure> {
        CompileDispatcher::compile(self, sources, options)
    }
}

/// Link extension point: object list in, linked output out.
pub trait LinkHandler {
    fn link(&self, spec: &LinkSpec) -> Result<BuildResult, BuildError>;
}

impl LinkHandler for LinkOrchestrator {
    fn link(&self, spec: &LinkSpec) -> Result<BuildResult, BuildError> {
        LinkOrchestrator::link(self, spec)
    }
}

/// The base build mechanism, as this crate sees it. Implementations own
/// the build flow and call back into the handlers they are given.
pub trait BaseBuild {
    fn run(
        &mut self,
        compile: &dyn CompileHandler,
        link: &dyn LinkHandler,
    ) -> Result<BuildResult>;
}

/// Installs the compile/link handlers into a base build and delegates.
/// Owns nothing beyond the handler references.
pub struct ExtensionCustomizer<B> {
    base: B,
    compile: Box<dyn CompileHandler>,
    link: Box<dyn LinkHandler>,
}

impl<B: BaseBuild> ExtensionCustomizer<B> {
    pub fn new(base: B, compile: Box<dyn CompileHandler>, link: Box<dyn LinkHandler>) -> Self {
        ExtensionCustomizer {
            base,
            compile,
            link,
        }
    }

    /// Run the base mechanism's normal flow with the installed handlers.
    pub fn build(&mut self) -> Result<BuildResult> {
        self.base.run(self.compile.as_ref(), self.link.as_ref())
    }
}

/// Manifest-driven base build used by the CLI: enumerates sources from the
/// manifest's glob patterns, compiles, then links into the output
/// directory.
pub struct ManifestBuild {
    manifest: Manifest,
    project_dir: PathBuf,
    build_dir: PathBuf,
    /// Final module path, computed by the caller from the output directory
    /// and the host toolchain's shared-module extension.
    output: PathBuf,
}

impl ManifestBuild {
    pub fn new(
        manifest: Manifest,
        project_dir: PathBuf,
        build_dir: PathBuf,
        output: PathBuf,
    ) -> Self {
        ManifestBuild {
            manifest,
            project_dir,
            build_dir,
            output,
        }
    }
}

impl BaseBuild for ManifestBuild {
    fn run(
        &mut self,
        compile: &dyn CompileHandler,
        link: &dyn LinkHandler,
    ) -> Result<BuildResult> {
        let ext = &self.manifest.extension;

        let sources = glob_files(&self.project_dir, &ext.sources)
            .context("failed to enumerate extension sources")?;
        anyhow::ensure!(
            !sources.is_empty(),
            "no sources matched {:?} under {}",
            ext.sources,
            self.project_dir.display()
        );

        ensure_dir(&self.build_dir)?;
        if let Some(out_dir) = self.output.parent() {
            ensure_dir(out_dir)?;
        }

        let units: Vec<SourceUnit> = sources.into_iter().map(SourceUnit::classify).collect();
        let options: CompileOptions = self.manifest.flags.clone().into();

        tracing::info!("compiling {} source files", units.len());
        let objects = compile.compile(&units, &options)?;

        let spec = LinkSpec {
            objects,
            libraries: ext.libraries.clone(),
            library_dirs: ext
                .library_dirs
                .iter()
                .map(|d| self.project_dir.join(d))
                .collect(),
            runtime_library_dirs: ext
                .runtime_library_dirs
                .iter()
                .map(|d| self.project_dir.join(d))
                .collect(),
            output: self.output.clone(),
            exports: ext.exports.clone(),
        };

        let result = link.link(&spec)?;

        for warning in &result.warnings {
            tracing::warn!("{warning}");
        }

        Ok(result)
    }
}
