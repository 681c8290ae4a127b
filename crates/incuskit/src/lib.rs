//! # incuskit
//!
//! Rust library for reconciling Incus profiles and custom storage volumes
//! through the `incus` command-line client.
//!
//! This crate provides:
//! - A [`Backend`](backend::Backend) seam for running `incus` commands
//! - Identity and state types for profiles and volumes
//! - Command builders for the `incus` grammar
//! - The state reader, desired-state builder and state differ
//! - Operation resolution for the requested mode
//!
//! ## Example
//!
//! ```no_run
//! use incuskit::{Client, ResourceIdentity, Scope};
//!
//! let client = Client::new().expect("incus not available");
//! let id = ResourceIdentity::profile("web", Scope::default());
//!
//! match client.fetch_profile(&id).expect("failed to run incus") {
//!     Some(profile) => println!("{} config keys", profile.config.len()),
//!     None => println!("profile absent"),
//! }
//! ```

pub mod backend;
pub mod command;
pub mod desired;
pub mod diff;
pub mod error;
pub mod operation;
pub mod reader;
pub mod types;

pub use command::{AttachSpec, TransferKind, TransferSpec};
pub use desired::{ProfileOverrides, VolumeOverrides};
pub use diff::{ChangeSet, FieldChange};
pub use error::{Error, ErrorCategory, Result};
pub use operation::{OperationRequest, ProfileMode, VolumeMode, VolumeParams};
pub use types::{
    CommandOutput, ContentType, DeviceMap, DevicePatch, DeviceSpec, ProfileState, ResourceIdentity,
    ResourceKind, Scope, VolumeState, VolumeType,
};

use backend::{Backend, incus::IncusBackend};
use std::fmt;
use std::sync::Arc;

/// High-level client for Incus operations.
///
/// The client wraps a backend and is cheap to clone; every resource in a
/// run shares the same backend.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if the incus executable cannot be found.
    pub fn new() -> Result<Self> {
        let backend = IncusBackend::new()?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Run a command in `scope` and return its raw output.
    pub fn run(
        &self,
        scope: &Scope,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput> {
        log::debug!("{}", command_line(scope, args));
        self.backend.execute(scope.project_flag(), args, stdin)
    }

    /// Run a command and fail unless it exits zero.
    ///
    /// `what` describes the attempted action ("Failed to create profile")
    /// and prefixes the error message.
    pub fn run_checked(
        &self,
        scope: &Scope,
        args: &[String],
        stdin: Option<&str>,
        what: &str,
    ) -> Result<String> {
        let output = self.run(scope, args, stdin)?;
        if !output.success() {
            return Err(Error::CommandFailed {
                message: what.to_string(),
                command: command_line(scope, args),
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

/// Full command line, as logged and reported on failure.
pub fn command_line(scope: &Scope, args: &[String]) -> String {
    let mut line = String::from("incus");
    if let Some(project) = scope.project_flag() {
        line.push_str(" --project ");
        line.push_str(project);
    }
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;

    #[test]
    fn test_run_passes_project() {
        let backend = Arc::new(ScriptedBackend::new());
        let client = Client::with_backend(backend.clone());
        let scope = Scope::new(None, Some("prod"));

        client
            .run(&scope, &["profile".to_string(), "list".to_string()], None)
            .unwrap();
        assert_eq!(backend.calls()[0].project.as_deref(), Some("prod"));
    }

    #[test]
    fn test_run_checked_reports_command_and_stderr() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.respond(
            &["profile", "delete"],
            CommandOutput::failed(1, "Error: Profile is in use\n"),
        );
        let client = Client::with_backend(backend);

        let args = command::profile_delete(&ResourceIdentity::profile("web", Scope::default()));
        let err = client
            .run_checked(&Scope::default(), &args, None, "Failed to delete profile")
            .unwrap_err();

        match &err {
            Error::CommandFailed { command, status, stderr, .. } => {
                assert_eq!(command, "incus --project default profile delete web");
                assert_eq!(*status, 1);
                assert_eq!(stderr, "Error: Profile is in use\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.category(), ErrorCategory::ExternalCommand);
    }
}
