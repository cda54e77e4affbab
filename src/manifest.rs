//! The `drydock.toml` manifest.
//!
//! Describes one native extension module: its sources (glob patterns),
//! the libraries and search paths it links against, the symbols it exports,
//! and the per-toolchain compiler flags.
//!
//! ```toml
//! [extension]
//! name = "_tree_gpu"
//! sources = ["src/*.c", "src/*.cpp", "src/*.cu"]
//! libraries = ["cudart", "cuda"]
//! exports = ["PyInit__tree_gpu"]
//!
//! [flags]
//! host = []
//! device = ["-arch=sm_30", "-O3"]
//! ```
//!
//! `flags` also accepts a flat list (`flags = ["-O2"]`), which applies to
//! both toolchains identically.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::builder::dispatch::CompileFlags;

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "drydock.toml";

/// Parsed manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub extension: ExtensionSection,
    #[serde(default)]
    pub flags: CompileFlags,
}

/// The `[extension]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExtensionSection {
    /// Module name; also the output file's base name
    pub name: String,
    /// Source glob patterns, relative to the manifest directory
    pub sources: Vec<String>,
    /// Libraries to link, bare names
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Extra library search directories
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,
    /// Requested runtime search dirs; unsupported, warned when non-empty
    #[serde(default)]
    pub runtime_library_dirs: Vec<PathBuf>,
    /// Extra include directories
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines, `NAME` or `NAME=VALUE`
    #[serde(default)]
    pub defines: Vec<String>,
    /// Symbols the module exports
    #[serde(default)]
    pub exports: Vec<String>,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Manifest> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        Ok(manifest)
    }

    /// Defines split into (name, optional value) pairs.
    pub fn defines(&self) -> Vec<(String, Option<String>)> {
        self.extension
            .defines
            .iter()
            .map(|d| match d.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(value.to_string())),
                None => (d.clone(), None),
            })
            .collect()
    }
}
