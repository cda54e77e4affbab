//! CUDA toolkit location and validation.
//!
//! The device toolchain is resolved once per build invocation:
//! 1. `CUDA_PATH`, if set, names the installation root directly.
//! 2. Otherwise every directory in the executable search path is scanned for
//!    the `nvcc` binary; the first match's grandparent becomes the root.
//!
//! The resolved descriptor is validated before it is returned: the root, the
//! compiler, the include directory, and the library directory must all exist
//! on disk. A partially valid descriptor is never handed out.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;

/// Name of the environment variable overriding search-path discovery.
pub const CUDA_ROOT_ENV: &str = "CUDA_PATH";

/// Name of the device compiler binary.
pub const NVCC: &str = "nvcc";

/// Resolved CUDA toolkit descriptor. Immutable after construction.
#[derive(Debug, Clone)]
pub struct CudaToolchain {
    /// Installation root
    pub root: PathBuf,
    /// Device compiler (`<root>/bin/nvcc`)
    pub nvcc: PathBuf,
    /// Header directory (`<root>/include`)
    pub include: PathBuf,
    /// Runtime library directory (`<root>/lib/<arch>`)
    pub lib_dir: PathBuf,
}

/// Locator inputs, held explicitly so resolution is deterministic given the
/// same environment and filesystem state.
#[derive(Debug, Clone, Default)]
pub struct CudaLocator {
    /// Value of [`CUDA_ROOT_ENV`], if set
    pub env_root: Option<PathBuf>,
    /// Value of `PATH`, if set
    pub search_path: Option<OsString>,
}

impl CudaLocator {
    /// Capture the process environment.
    pub fn from_env() -> Self {
        CudaLocator {
            env_root: std::env::var_os(CUDA_ROOT_ENV).map(PathBuf::from),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Resolve and validate the toolkit layout.
    pub fn locate(&self) -> Result<CudaToolchain, BuildError> {
        let root = match self.env_root {
            Some(ref root) => {
                tracing::debug!("CUDA root from {}: {}", CUDA_ROOT_ENV, root.display());
                root.clone()
            }
            None => {
                let nvcc = self.find_nvcc_in_path().ok_or_else(|| {
                    BuildError::ToolchainNotFound {
                        executable: NVCC.to_string(),
                    }
                })?;
                tracing::debug!("found {} at {}", NVCC, nvcc.display());
                // bin/nvcc -> root
                nvcc.parent()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf)
                    .ok_or_else(|| BuildError::ToolchainPathInvalid {
                        component: "root",
                        expected: nvcc.clone(),
                    })?
            }
        };

        let toolchain = CudaToolchain {
            nvcc: root.join("bin").join(NVCC),
            include: root.join("include"),
            lib_dir: library_dir(&root),
            root,
        };

        validate(&toolchain)?;

        tracing::info!("Using CUDA toolkit at {}", toolchain.root.display());
        Ok(toolchain)
    }

    /// Search the captured path for the device compiler, accepting a `.exe`
    /// variant of the binary name.
    fn find_nvcc_in_path(&self) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        [NVCC.to_string(), format!("{NVCC}.exe")]
            .into_iter()
            .find_map(|name| which::which_in(name, Some(search_path), Path::new(".")).ok())
    }
}

/// Pick the runtime library directory for this layout. Windows toolkits ship
/// `lib/x64`; Linux toolkits ship `lib64` (or `lib` on some distributions).
fn library_dir(root: &Path) -> PathBuf {
    let candidates = if cfg!(target_os = "windows") {
        ["lib/x64", "lib64", "lib"]
    } else {
        ["lib64", "lib/x64", "lib"]
    };

    for rel in candidates {
        let dir = root.join(rel);
        if dir.is_dir() {
            return dir;
        }
    }

    // Nothing exists; report the platform's conventional location.
    root.join(candidates[0])
}

/// Check every derived path, tolerating `.exe`-suffixed executables.
fn validate(tc: &CudaToolchain) -> Result<(), BuildError> {
    let components: [(&'static str, &Path); 4] = [
        ("root", &tc.root),
        ("nvcc", &tc.nvcc),
        ("include", &tc.include),
        ("lib", &tc.lib_dir),
    ];

    for (component, path) in components {
        if !exists_maybe_exe(path) {
            return Err(BuildError::ToolchainPathInvalid {
                component,
                expected: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

fn exists_maybe_exe(path: &Path) -> bool {
    if path.exists() {
        return true;
    }
    let mut with_exe = path.as_os_str().to_os_string();
    with_exe.push(".exe");
    PathBuf::from(with_exe).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Lay out a plausible toolkit root: bin/nvcc, include/, lib64/.
    fn fake_toolkit(tmp: &TempDir) -> PathBuf {
        let root = tmp.path().join("cuda");
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::create_dir_all(root.join("lib64")).unwrap();
        let nvcc = root.join("bin").join(NVCC);
        fs::write(&nvcc, "").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&nvcc, fs::Permissions::from_mode(0o755)).unwrap();
        }
        root
    }

    #[test]
    fn test_locate_from_env_root() {
        let tmp = TempDir::new().unwrap();
        let root = fake_toolkit(&tmp);

        let locator = CudaLocator {
            env_root: Some(root.clone()),
            search_path: None,
        };

        let tc = locator.locate().unwrap();
        assert_eq!(tc.root, root);
        assert_eq!(tc.include, root.join("include"));
        assert_eq!(tc.lib_dir, root.join("lib64"));
        assert!(tc.nvcc.ends_with(Path::new("bin").join(NVCC)));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_from_search_path() {
        let tmp = TempDir::new().unwrap();
        let root = fake_toolkit(&tmp);

        let locator = CudaLocator {
            env_root: None,
            search_path: Some(root.join("bin").into_os_string()),
        };

        let tc = locator.locate().unwrap();
        assert_eq!(tc.root, root);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_skips_non_executable_files() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        // a plain file named like the compiler must not count as a match
        fs::write(bin.join(NVCC), "").unwrap();

        let locator = CudaLocator {
            env_root: None,
            search_path: Some(bin.into_os_string()),
        };

        match locator.locate().unwrap_err() {
            BuildError::ToolchainNotFound { executable } => assert_eq!(executable, NVCC),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_missing_include_names_component() {
        let tmp = TempDir::new().unwrap();
        let root = fake_toolkit(&tmp);
        fs::remove_dir(root.join("include")).unwrap();

        let locator = CudaLocator {
            env_root: Some(root.clone()),
            search_path: None,
        };

        match locator.locate().unwrap_err() {
            BuildError::ToolchainPathInvalid {
                component,
                expected,
            } => {
                assert_eq!(component, "include");
                assert_eq!(expected, root.join("include"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_nothing_found() {
        let tmp = TempDir::new().unwrap();

        let locator = CudaLocator {
            env_root: None,
            search_path: Some(tmp.path().join("empty").into_os_string()),
        };

        match locator.locate().unwrap_err() {
            BuildError::ToolchainNotFound { executable } => assert_eq!(executable, NVCC),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exe_suffixed_compiler_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cuda");
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::create_dir_all(root.join("lib64")).unwrap();
        fs::write(root.join("bin").join("nvcc.exe"), "").unwrap();

        let locator = CudaLocator {
            env_root: Some(root),
            search_path: None,
        };

        assert!(locator.locate().is_ok());
    }
}
