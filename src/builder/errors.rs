//! Build error types.
//!
//! Setup-time errors (`ToolchainNotFound`, `ToolchainPathInvalid`) abort
//! before any file is touched. Per-file errors stop the remaining unit list
//! but already-produced artifacts are preserved. Every failed external
//! command surfaces its full argument vector and exit status.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by toolchain resolution, compilation, or linking.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "the `{executable}` binary could not be located in your PATH\n\
         \n\
         Either add its directory to PATH, or set the CUDA_PATH environment\n\
         variable to the toolkit installation root."
    )]
    ToolchainNotFound { executable: String },

    #[error("the CUDA `{component}` path could not be located at {}", expected.display())]
    ToolchainPathInvalid {
        component: &'static str,
        expected: PathBuf,
    },

    #[error(
        "don't know how to compile {} to {} (unsupported extension `{extension}`)",
        path.display(),
        object.display()
    )]
    UnsupportedSourceKind {
        path: PathBuf,
        object: PathBuf,
        extension: String,
    },

    #[error(
        "{} and {} would both produce {}; rename one of the sources",
        first.display(),
        second.display(),
        object.display()
    )]
    DuplicateObject {
        first: PathBuf,
        second: PathBuf,
        object: PathBuf,
    },

    #[error("command failed{}: `{command}`\n{stderr}", exit_label(*status))]
    CommandFailed {
        command: String,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        stderr: String,
    },

    #[error("compilation of {} failed", source.display())]
    Compile {
        source: PathBuf,
        #[source]
        cause: Box<BuildError>,
    },

    #[error("linking {} failed", output.display())]
    Link {
        output: PathBuf,
        #[source]
        cause: Box<BuildError>,
    },
}

fn exit_label(status: Option<i32>) -> String {
    match status {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal or failed to spawn)".to_string(),
    }
}

impl BuildError {
    /// Wrap a command failure as a compile error for `source`.
    pub fn compile(source: impl Into<PathBuf>, cause: BuildError) -> Self {
        BuildError::Compile {
            source: source.into(),
            cause: Box::new(cause),
        }
    }

    /// Wrap a command failure as a link error for `output`.
    pub fn link(output: impl Into<PathBuf>, cause: BuildError) -> Self {
        BuildError::Link {
            output: output.into(),
            cause: Box::new(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_not_found_names_executable_and_remedies() {
        let err = BuildError::ToolchainNotFound {
            executable: "nvcc".to_string(),
        };
        let msg = err.to_string();

        assert!(msg.contains("nvcc"));
        assert!(msg.contains("CUDA_PATH"));
        assert!(msg.contains("PATH"));
    }

    #[test]
    fn test_path_invalid_names_component() {
        let err = BuildError::ToolchainPathInvalid {
            component: "include",
            expected: PathBuf::from("/opt/cuda/include"),
        };

        assert!(err.to_string().contains("include"));
        assert!(err.to_string().contains("/opt/cuda/include"));
    }

    #[test]
    fn test_command_failed_shows_argv_and_status() {
        let err = BuildError::CommandFailed {
            command: "nvcc -c k.cu -o k.o".to_string(),
            status: Some(2),
            stderr: "syntax error".to_string(),
        };
        let msg = err.to_string();

        assert!(msg.contains("nvcc -c k.cu -o k.o"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("syntax error"));
    }

    #[test]
    fn test_unsupported_kind_names_extension() {
        let err = BuildError::UnsupportedSourceKind {
            path: PathBuf::from("weird.xyz"),
            object: PathBuf::from("weird.o"),
            extension: ".xyz".to_string(),
        };

        assert!(err.to_string().contains(".xyz"));
        assert!(err.to_string().contains("weird.xyz"));
    }
}
