//! Backend abstraction for invoking the Incus CLI.
//!
//! The [`Backend`] trait is the single seam between reconciliation logic and
//! the outside world, allowing for different implementations (the real
//! `incus` binary, a scripted backend for tests).

pub mod incus;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

use crate::error::Result;
use crate::types::CommandOutput;

/// Backend trait for running Incus commands.
///
/// Implementations run one command to completion and report its raw exit
/// status and output. A non-zero status is not an error at this level;
/// only failing to run the command at all is.
pub trait Backend: Send + Sync {
    /// Run `incus [--project P] <args>`, feeding `stdin` if given.
    fn execute(
        &self,
        project: Option<&str>,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput>;
}
