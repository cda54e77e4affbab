//! Subprocess execution utilities.
//!
//! Every external tool invocation in a build goes through [`ProcessBuilder`]
//! so that failures always carry the exact command line that was attempted.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

use crate::builder::errors::BuildError;

/// Builder for a single blocking subprocess invocation.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Execute the command and wait for completion, capturing output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.display_command()))?;

        Ok(output)
    }

    /// Execute and convert a non-zero exit into [`BuildError::CommandFailed`]
    /// carrying the full argument vector.
    pub fn exec_checked(&self) -> Result<Output, BuildError> {
        let output = self.exec().map_err(|e| BuildError::CommandFailed {
            command: self.display_command(),
            status: None,
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: self.display_command(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output)
    }

    /// Display the full command for diagnostics.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("nvcc").args(["-c", "kernel.cu", "-o", "kernel.o"]);

        assert_eq!(pb.display_command(), "nvcc -c kernel.cu -o kernel.o");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_checked_reports_command_and_status() {
        let err = ProcessBuilder::new("false").exec_checked().unwrap_err();

        match err {
            BuildError::CommandFailed {
                command, status, ..
            } => {
                assert_eq!(command, "false");
                assert_eq!(status, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_captures_output() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("hello"));
    }
}
