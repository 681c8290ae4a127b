//! Real Incus CLI backend using `incus` commands.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::CommandOutput;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Environment variable overriding the incus executable.
pub const INCUS_BIN_ENV: &str = "INCANT_INCUS_BIN";

/// Backend that executes real `incus` commands.
#[derive(Debug, Clone)]
pub struct IncusBackend {
    /// Path to the incus executable
    incus_path: String,
}

impl IncusBackend {
    /// Create a new IncusBackend.
    ///
    /// Returns an error if the incus executable cannot be found.
    pub fn new() -> Result<Self> {
        let incus_path = find_incus()?;
        log::debug!("Using incus at {incus_path}");
        Ok(Self { incus_path })
    }

    /// Create a backend for an explicit executable path.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            incus_path: path.into(),
        }
    }
}

impl Backend for IncusBackend {
    fn execute(
        &self,
        project: Option<&str>,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput> {
        let mut command = Command::new(&self.incus_path);
        if let Some(project) = project {
            command.arg("--project").arg(project);
        }
        command
            .args(args)
            // Keep CLI messages parseable regardless of the user's locale
            .env("LC_ALL", "C")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::trace!("Running {} {}", self.incus_path, args.join(" "));

        let mut child = command.spawn()?;
        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())?;
            }
        }
        let output = child.wait_with_output()?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        log::trace!("exit status {}", result.status);
        Ok(result)
    }
}

/// Find the incus executable.
fn find_incus() -> Result<String> {
    if let Ok(path) = std::env::var(INCUS_BIN_ENV) {
        if !path.is_empty() {
            return Ok(path);
        }
    }

    for path in ["/usr/bin/incus", "/usr/local/bin/incus", "/opt/incus/bin/incus"] {
        if Path::new(path).exists() {
            return Ok(path.to_string());
        }
    }

    let output = Command::new("which")
        .arg("incus")
        .output()
        .map_err(|_| Error::IncusNotFound)?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::IncusNotFound)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write a shell script standing in for incus.
    fn fake_incus(dir: &Path, body: &str) -> String {
        let path = dir.join("incus");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_execute_passes_project_and_args() {
        let dir = tempfile::tempdir().unwrap();
        let backend = IncusBackend::with_path(fake_incus(dir.path(), r#"echo "$@""#));

        let args = vec!["profile".to_string(), "show".to_string(), "web".to_string()];
        let output = backend.execute(Some("prod"), &args, None).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "--project prod profile show web");
    }

    #[test]
    fn test_execute_pipes_stdin_and_sets_locale() {
        let dir = tempfile::tempdir().unwrap();
        let backend = IncusBackend::with_path(fake_incus(dir.path(), r#"echo "$LC_ALL"; cat"#));

        let output = backend
            .execute(None, &["profile".to_string()], Some("description: x\n"))
            .unwrap();
        assert_eq!(output.stdout, "C\ndescription: x\n");
    }

    #[test]
    fn test_execute_reports_nonzero_status() {
        let dir = tempfile::tempdir().unwrap();
        let backend =
            IncusBackend::with_path(fake_incus(dir.path(), "echo 'Error: not found' >&2; exit 1"));

        let output = backend.execute(None, &[], None).unwrap();
        assert_eq!(output.status, 1);
        assert_eq!(output.stderr.trim(), "Error: not found");
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let backend = IncusBackend::with_path("/nonexistent/incus");
        assert!(matches!(backend.execute(None, &[], None), Err(Error::Io(_))));
    }
}
