//! The shell handle given to payload hooks.

use serde_json::Value;

use super::{Payload, PayloadLogic};
use crate::error::PayloadError;
use crate::shell::{Operation, OperationSet, Shell};

/// A shell restricted to the operations granted by a capability check.
///
/// Every operation checks the grant first and then resolves the accessor on
/// the live shell, so an operation that was not verified is never invoked.
pub struct ShellAccess<'a> {
    payload: &'a str,
    shell: Option<&'a dyn Shell>,
    granted: OperationSet,
    nested: Vec<&'a str>,
}

impl<'a> ShellAccess<'a> {
    pub(super) fn new(
        payload: &'a str,
        shell: Option<&'a dyn Shell>,
        granted: OperationSet,
        nested: Vec<&'a str>,
    ) -> Self {
        Self {
            payload,
            shell,
            granted,
            nested,
        }
    }

    /// Operations this handle may use.
    pub fn granted(&self) -> &OperationSet {
        &self.granted
    }

    /// Name of the shell behind the handle, `None` when unbound.
    pub fn shell_name(&self) -> Option<&'a str> {
        self.shell.map(|s| s.name())
    }

    pub fn execute(&self, command: &str) -> Result<String, PayloadError> {
        let shell = self.resolve(Operation::Execute)?;
        match shell.as_execute() {
            Some(op) => Ok(op.execute(command)?),
            None => Err(self.denied(Operation::Execute)),
        }
    }

    pub fn read(&self, path: &str) -> Result<String, PayloadError> {
        let shell = self.resolve(Operation::Read)?;
        match shell.as_read() {
            Some(op) => Ok(op.read(path)?),
            None => Err(self.denied(Operation::Read)),
        }
    }

    pub fn write(&self, path: &str, content: &str) -> Result<(), PayloadError> {
        let shell = self.resolve(Operation::Write)?;
        match shell.as_write() {
            Some(op) => Ok(op.write(path, content)?),
            None => Err(self.denied(Operation::Write)),
        }
    }

    pub fn upload(&self, contents: &[u8], destination: &str) -> Result<(), PayloadError> {
        let shell = self.resolve(Operation::Upload)?;
        match shell.as_upload() {
            Some(op) => Ok(op.upload(contents, destination)?),
            None => Err(self.denied(Operation::Upload)),
        }
    }

    pub fn unlink(&self, path: &str) -> Result<(), PayloadError> {
        let shell = self.resolve(Operation::Unlink)?;
        match shell.as_unlink() {
            Some(op) => Ok(op.unlink(path)?),
            None => Err(self.denied(Operation::Unlink)),
        }
    }

    /// Run another payload against the same shell in structured mode.
    ///
    /// Only payloads listed by the caller's [`PayloadLogic::nested`] may run.
    /// The nested payload goes through its own capability check against the
    /// shell, independent of what this handle was granted.
    pub fn exec_payload(
        &self,
        logic: &dyn PayloadLogic,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        if !self.nested.iter().any(|name| *name == logic.name()) {
            return Err(PayloadError::UndeclaredPayload {
                payload: self.payload.to_string(),
                nested: logic.name().to_string(),
            });
        }
        Payload::bind(self.shell, logic).run_api(argument)
    }

    fn resolve(&self, op: Operation) -> Result<&'a dyn Shell, PayloadError> {
        if !self.granted.contains(op) {
            return Err(self.denied(op));
        }
        self.shell.ok_or_else(|| self.denied(op))
    }

    fn denied(&self, op: Operation) -> PayloadError {
        PayloadError::MissingCapability {
            payload: self.payload.to_string(),
            operation: op,
            missing: OperationSet::from([op]),
        }
    }
}
