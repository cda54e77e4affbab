//! Command implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};

use drydock::builder::{
    detect_host_toolchain, CompileDispatcher, CudaLocator, ExtensionCustomizer, LinkOrchestrator,
    ManifestBuild,
};
use drydock::manifest::{Manifest, MANIFEST_NAME};

use crate::cli::{BuildArgs, LocateArgs};

pub fn build(args: BuildArgs) -> Result<()> {
    let manifest_path = match args.manifest {
        Some(path) => path,
        None => std::env::current_dir()?.join(MANIFEST_NAME),
    };
    let project_dir = manifest_path
        .parent()
        .map(PathBuf::from)
        .context("manifest path has no parent directory")?;

    let manifest = Manifest::load(&manifest_path)?;

    let cuda = CudaLocator::from_env().locate()?;
    // one host toolchain per invocation; dispatcher and orchestrator each
    // hold their own instance
    let compile_host = detect_host_toolchain()?;
    let link_host = detect_host_toolchain()?;

    let build_dir = args.build_dir.unwrap_or_else(|| project_dir.join("build"));
    let out_dir = args.out_dir.unwrap_or_else(|| project_dir.join("dist"));
    let output = out_dir.join(format!(
        "{}.{}",
        manifest.extension.name,
        compile_host.shared_lib_extension()
    ));

    let include_dirs: Vec<PathBuf> = manifest
        .extension
        .include_dirs
        .iter()
        .map(|d| project_dir.join(d))
        .collect();
    let defines = manifest.defines();

    let dispatcher = CompileDispatcher::new(compile_host, cuda.clone(), build_dir.clone())
        .with_include_dirs(include_dirs)
        .with_defines(defines);
    let orchestrator = LinkOrchestrator::new(link_host, cuda);

    let base = ManifestBuild::new(manifest, project_dir, build_dir, output);
    let mut customizer =
        ExtensionCustomizer::new(base, Box::new(dispatcher), Box::new(orchestrator));

    let result = customizer.build()?;

    if result.skipped {
        println!("up to date: {}", result.output.display());
    } else {
        println!("built: {}", result.output.display());
        if let Some(implib) = result.import_lib {
            println!("import library: {}", implib.display());
        }
    }

    Ok(())
}

pub fn locate(_args: LocateArgs) -> Result<()> {
    let cuda = CudaLocator::from_env().locate()?;

    println!("root:    {}", cuda.root.display());
    println!("nvcc:    {}", cuda.nvcc.display());
    println!("include: {}", cuda.include.display());
    println!("lib:     {}", cuda.lib_dir.display());

    Ok(())
}
