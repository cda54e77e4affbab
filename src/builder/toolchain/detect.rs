//! Host toolchain detection.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::{GccToolchain, HostPlatform, Toolchain};

#[cfg(target_os = "windows")]
use super::MsvcToolchain;

/// Detect the host (primary) toolchain.
///
/// Tries to find a C/C++ compiler with the following priority:
/// 1. Environment variables (CC, CXX)
/// 2. On Windows inside a configured developer environment: cl.exe/link.exe
/// 3. On Unix-like systems: cc/gcc/clang
pub fn detect_host_toolchain() -> Result<Box<dyn Toolchain>> {
    #[cfg(target_os = "windows")]
    {
        if let Some(toolchain) = try_detect_msvc() {
            return Ok(toolchain);
        }
    }

    if let Some(toolchain) = try_detect_gcc() {
        return Ok(toolchain);
    }

    bail!(
        "no host C compiler found\n\
         \n\
         drydock requires a C compiler (gcc, clang, or cl).\n\
         Set the CC environment variable or install a compiler."
    )
}

/// Detect MSVC when the environment is already configured (Developer
/// Command Prompt or equivalent).
#[cfg(target_os = "windows")]
fn try_detect_msvc() -> Option<Box<dyn Toolchain>> {
    use which::which;

    let cl = which("cl").ok()?;
    if std::env::var("INCLUDE").is_err() || std::env::var("LIB").is_err() {
        tracing::debug!("cl.exe found but INCLUDE/LIB not set; skipping MSVC");
        return None;
    }
    let link = which("link").ok()?;

    tracing::info!("Using MSVC: cl={}", cl.display());
    Some(Box::new(MsvcToolchain::new(cl, link)))
}

/// Try to detect a GCC/Clang toolchain.
fn try_detect_gcc() -> Option<Box<dyn Toolchain>> {
    use which::which;

    let cc = if let Ok(cc_env) = std::env::var("CC") {
        PathBuf::from(cc_env)
    } else {
        which("cc")
            .or_else(|_| which("gcc"))
            .or_else(|_| which("clang"))
            .ok()?
    };

    let cxx = if let Ok(cxx_env) = std::env::var("CXX") {
        PathBuf::from(cxx_env)
    } else {
        which("c++")
            .or_else(|_| which("g++"))
            .or_else(|_| which("clang++"))
            .unwrap_or_else(|_| GccToolchain::infer_cxx(&cc))
    };

    let family = detect_compiler_family(&cc);

    tracing::info!("Using host toolchain: cc={}", cc.display());
    Some(Box::new(GccToolchain::new(cc, cxx, family)))
}

/// Detect whether the compiler is GCC or Clang from its name, falling back
/// to `--version` output.
fn detect_compiler_family(cc: &std::path::Path) -> HostPlatform {
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("clang") {
        return HostPlatform::Clang;
    }
    if name.contains("gcc") || name.contains("g++") {
        return HostPlatform::Gcc;
    }

    if let Ok(output) = std::process::Command::new(cc).arg("--version").output() {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("clang") {
            return HostPlatform::Clang;
        }
    }

    HostPlatform::Gcc
}
