//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// drydock - build native extension modules spanning host and CUDA sources
#[derive(Parser)]
#[command(name = "drydock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile and link the extension described by drydock.toml
    Build(BuildArgs),

    /// Resolve and print the CUDA toolkit installation
    Locate(LocateArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the manifest (defaults to ./drydock.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Output directory (defaults to <project>/dist)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Build directory for intermediate objects (defaults to <project>/build)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct LocateArgs {}
