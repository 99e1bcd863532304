//! Capability-checked payload execution.
//!
//! A [`Payload`] binds payload logic to at most one shell. Every invocation
//! goes through the same sequence:
//!
//! 1. compute the gap between what the mode requires and what the shell
//!    exposes right now,
//! 2. fail with [`PayloadError::MissingCapability`] if the gap is not empty,
//! 3. otherwise hand the logic a [`ShellAccess`] limited to the granted
//!    operations and return whatever the hook returns.
//!
//! Payload authors implement [`PayloadLogic`]. The checked entry points are
//! inherent methods of [`Payload`] and cannot be replaced.

mod access;
pub mod builtin;
mod catalog;
#[cfg(test)]
mod tests;

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::PayloadError;
use crate::shell::{self, OperationSet, Shell};

pub use access::ShellAccess;
pub use catalog::PayloadCatalog;

/// Invocation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Human-oriented text output
    Interactive,
    /// Machine-oriented JSON output
    Structured,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Interactive => f.write_str("interactive"),
            Mode::Structured => f.write_str("structured"),
        }
    }
}

/// Where an invocation is, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unchecked,
    CapabilityVerified,
    Delegated,
    Completed,
    Failed,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Unchecked => "unchecked",
            Stage::CapabilityVerified => "capability_verified",
            Stage::Delegated => "delegated",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

/// The logic of one payload type.
///
/// Implementations declare what they need per mode and provide the two
/// hooks. Hooks only see the operations granted for their mode; anything
/// else fails with `MissingCapability` without reaching the shell.
///
/// With every default in place the payload declares nothing and both hooks
/// try to `execute`, so it is never runnable through `run` or `run_api`.
pub trait PayloadLogic: Send + Sync {
    /// Unique name, used by the catalogue and in errors.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Operations the interactive hook uses.
    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::new()
    }

    /// Operations the structured hook uses; interactive ones unless overridden.
    fn structured_requirements(&self) -> OperationSet {
        self.interactive_requirements()
    }

    /// Payloads the hooks run through [`ShellAccess::exec_payload`].
    ///
    /// Their structured requirements count towards this payload's own, and
    /// running any payload not listed here is refused.
    fn nested(&self) -> Vec<&dyn PayloadLogic> {
        Vec::new()
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        shell.execute(argument)
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        shell.execute(argument).map(Value::String)
    }
}

/// `own` plus the structured requirements of every nested payload, recursively.
fn with_nested(logic: &dyn PayloadLogic, own: OperationSet) -> OperationSet {
    logic.nested().into_iter().fold(own, |acc, inner| {
        acc.union(&with_nested(inner, inner.structured_requirements()))
    })
}

/// Payload logic with no overrides.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasePayload;

impl PayloadLogic for BasePayload {
    fn name(&self) -> &str {
        "base"
    }
}

/// Payload logic bound to a shell.
///
/// Holds no state between invocations; the same value can be invoked any
/// number of times. The shell is borrowed and never closed here.
#[derive(Clone, Copy)]
pub struct Payload<'a> {
    shell: Option<&'a dyn Shell>,
    logic: &'a dyn PayloadLogic,
}

impl<'a> Payload<'a> {
    pub fn new(shell: &'a dyn Shell, logic: &'a dyn PayloadLogic) -> Self {
        Self::bind(Some(shell), logic)
    }

    /// A payload with no shell; it behaves as if bound to a shell exposing nothing.
    pub fn unbound(logic: &'a dyn PayloadLogic) -> Self {
        Self::bind(None, logic)
    }

    pub fn bind(shell: Option<&'a dyn Shell>, logic: &'a dyn PayloadLogic) -> Self {
        Self { shell, logic }
    }

    pub fn name(&self) -> &'a str {
        self.logic.name()
    }

    pub fn shell(&self) -> Option<&'a dyn Shell> {
        self.shell
    }

    /// Operations required by `mode`, including those of nested payloads.
    pub fn requirements(&self, mode: Mode) -> OperationSet {
        with_nested(self.logic, self.declared(mode))
    }

    /// Required operations the bound shell does not expose, across both modes.
    ///
    /// Empty means both `run` and `run_api` pass their capability check.
    pub fn can_run(&self) -> OperationSet {
        self.requirements(Mode::Interactive)
            .union(&self.requirements(Mode::Structured))
            .missing_from(&self.available())
    }

    /// Required operations the bound shell does not expose, for one mode.
    pub fn can_run_mode(&self, mode: Mode) -> OperationSet {
        self.requirements(mode).missing_from(&self.available())
    }

    /// Interactive invocation, returning text.
    pub fn run(&self, argument: &str) -> Result<String, PayloadError> {
        let access = self.verify(Mode::Interactive)?;
        self.trace(Mode::Interactive, Stage::Delegated);
        let result = self.logic.run_interactive(&access, argument);
        self.finish(Mode::Interactive, result)
    }

    /// Structured invocation, returning JSON.
    pub fn run_api(&self, argument: &str) -> Result<Value, PayloadError> {
        let access = self.verify(Mode::Structured)?;
        self.trace(Mode::Structured, Stage::Delegated);
        let result = self.logic.run_structured(&access, argument);
        self.finish(Mode::Structured, result)
    }

    /// Operations the logic's own hook uses in `mode`.
    fn declared(&self, mode: Mode) -> OperationSet {
        match mode {
            Mode::Interactive => self.logic.interactive_requirements(),
            Mode::Structured => self.logic.structured_requirements(),
        }
    }

    fn available(&self) -> OperationSet {
        self.shell.map(|s| shell::capabilities(s)).unwrap_or_default()
    }

    fn verify(&self, mode: Mode) -> Result<ShellAccess<'a>, PayloadError> {
        self.trace(mode, Stage::Unchecked);

        let missing = self.requirements(mode).missing_from(&self.available());
        if let Some(err) = PayloadError::missing(self.name(), missing) {
            warn!(
                payload = self.name(),
                %mode,
                shell = self.shell_name(),
                stage = Stage::Failed.as_str(),
                "{}",
                err
            );
            return Err(err);
        }

        self.trace(mode, Stage::CapabilityVerified);
        let nested = self.logic.nested().into_iter().map(|l| l.name()).collect();
        Ok(ShellAccess::new(self.name(), self.shell, self.declared(mode), nested))
    }

    fn finish<T>(&self, mode: Mode, result: Result<T, PayloadError>) -> Result<T, PayloadError> {
        match &result {
            Ok(_) => info!(
                payload = self.name(),
                %mode,
                shell = self.shell_name(),
                stage = Stage::Completed.as_str(),
                "payload completed"
            ),
            Err(e) => warn!(
                payload = self.name(),
                %mode,
                shell = self.shell_name(),
                stage = Stage::Failed.as_str(),
                "payload failed: {}",
                e
            ),
        }
        result
    }

    fn trace(&self, mode: Mode, stage: Stage) {
        debug!(
            payload = self.name(),
            %mode,
            shell = self.shell_name(),
            stage = stage.as_str()
        );
    }

    fn shell_name(&self) -> &'a str {
        self.shell.map_or("none", |s| s.name())
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("name", &self.name())
            .field("shell", &self.shell_name())
            .finish()
    }
}
