//! Error types for shells, payloads and the payload catalogue.

use std::time::Duration;

use thiserror::Error;

use crate::shell::{Operation, OperationSet};

/// Failure raised by a shell operation implementation.
#[derive(Error, Debug)]
pub enum ShellError {
    /// IO error on the channel or the target filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Command ran but exited unsuccessfully
    #[error("command exited with status {status}: {output}")]
    CommandFailed { status: i32, output: String },
    /// Command did not finish in time and was killed
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    /// Transport-level failure reported by the shell implementation
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a payload invocation.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The bound shell lacks an operation the invocation needs.
    /// Raised before anything is delegated to the shell.
    #[error("payload '{payload}' requires shell operation '{operation}' (missing: {missing})")]
    MissingCapability {
        payload: String,
        operation: Operation,
        missing: OperationSet,
    },
    /// Error from the shell, forwarded as-is
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error("invalid argument for payload '{payload}': {reason}")]
    InvalidArgument { payload: String, reason: String },
    /// The shell answered but the payload could not interpret the answer
    #[error("unexpected output for payload '{payload}': {reason}")]
    Output { payload: String, reason: String },
    #[error("unknown payload: {0}")]
    UnknownPayload(String),
    /// A hook ran a nested payload its logic does not declare
    #[error("payload '{payload}' did not declare nested payload '{nested}'")]
    UndeclaredPayload { payload: String, nested: String },
}

impl PayloadError {
    /// Build a `MissingCapability` error from a non-empty gap.
    ///
    /// Returns `None` when the gap is empty.
    pub fn missing(payload: &str, missing: OperationSet) -> Option<Self> {
        let operation = missing.first()?;
        Some(Self::MissingCapability {
            payload: payload.to_string(),
            operation,
            missing,
        })
    }

    /// The missing operation, when this is a capability error.
    pub fn missing_operation(&self) -> Option<Operation> {
        match self {
            Self::MissingCapability { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("a payload named '{0}' is already registered")]
    Duplicate(String),
}
