//! Shell abstraction: an established execution channel on a target.
//!
//! Each operation lives in its own trait. A shell exposes an operation by
//! returning `Some` from the matching accessor on [`Shell`]; the defaults
//! return `None`, so a shell that implements nothing exposes nothing.
//! [`capabilities`] derives the capability set from those same accessors,
//! which are also what payloads dispatch through.

mod local;
mod operation;
#[cfg(test)]
pub(crate) mod testing;

pub use local::{LocalShell, LocalShellConfig};
pub use operation::{Operation, OperationSet};

use crate::error::ShellError;

/// Run a command on the target and return its output.
pub trait Execute {
    fn execute(&self, command: &str) -> Result<String, ShellError>;
}

/// Read a file from the target as text.
pub trait Read {
    fn read(&self, path: &str) -> Result<String, ShellError>;
}

/// Create or replace a text file on the target.
pub trait Write {
    fn write(&self, path: &str, content: &str) -> Result<(), ShellError>;
}

/// Transfer raw bytes to a path on the target.
pub trait Upload {
    fn upload(&self, contents: &[u8], destination: &str) -> Result<(), ShellError>;
}

/// Remove a file on the target.
pub trait Unlink {
    fn unlink(&self, path: &str) -> Result<(), ShellError>;
}

/// An execution channel exposing a subset of the operation vocabulary.
///
/// Implementations are owned by whoever established the channel. Payloads
/// only borrow them and never close them.
pub trait Shell: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    fn as_execute(&self) -> Option<&dyn Execute> {
        None
    }

    fn as_read(&self) -> Option<&dyn Read> {
        None
    }

    fn as_write(&self) -> Option<&dyn Write> {
        None
    }

    fn as_upload(&self) -> Option<&dyn Upload> {
        None
    }

    fn as_unlink(&self) -> Option<&dyn Unlink> {
        None
    }
}

/// Whether `shell` currently exposes `op`.
pub fn provides<S: Shell + ?Sized>(shell: &S, op: Operation) -> bool {
    match op {
        Operation::Execute => shell.as_execute().is_some(),
        Operation::Read => shell.as_read().is_some(),
        Operation::Write => shell.as_write().is_some(),
        Operation::Upload => shell.as_upload().is_some(),
        Operation::Unlink => shell.as_unlink().is_some(),
    }
}

/// The operations `shell` exposes right now.
pub fn capabilities<S: Shell + ?Sized>(shell: &S) -> OperationSet {
    Operation::ALL
        .into_iter()
        .filter(|op| provides(shell, *op))
        .collect()
}
