//! A scripted shell that records every call, for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Execute, Operation, OperationSet, Read, Shell, Unlink, Upload, Write};
use crate::error::ShellError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Operation,
    pub arg: String,
    /// Bytes passed to `write` or `upload`
    pub content: Vec<u8>,
}

/// Exposes exactly the operations it was built with and records calls.
///
/// `execute` and `read` answer from canned responses keyed by argument,
/// falling back to echoing the argument. `fail_with` makes every operation
/// return a transport error.
pub struct RecordingShell {
    ops: OperationSet,
    responses: HashMap<String, String>,
    failure: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingShell {
    pub fn new(ops: impl Into<OperationSet>) -> Self {
        Self {
            ops: ops.into(),
            responses: HashMap::new(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, arg: &str, output: &str) -> Self {
        self.responses.insert(arg.to_string(), output.to_string());
        self
    }

    pub fn fail_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, op: Operation) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .map(|c| c.arg)
            .collect()
    }

    /// Content of the last upload to `destination`.
    pub fn uploaded(&self, destination: &str) -> Option<Vec<u8>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.op == Operation::Upload && c.arg == destination)
            .map(|c| c.content)
    }

    fn record(&self, op: Operation, arg: &str) -> Result<(), ShellError> {
        self.record_with(op, arg, &[])
    }

    fn record_with(&self, op: Operation, arg: &str, content: &[u8]) -> Result<(), ShellError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                op,
                arg: arg.to_string(),
                content: content.to_vec(),
            });
        }
        match &self.failure {
            Some(message) => Err(ShellError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn answer(&self, arg: &str) -> String {
        self.responses
            .get(arg)
            .cloned()
            .unwrap_or_else(|| arg.to_string())
    }

    fn exposes(&self, op: Operation) -> bool {
        self.ops.contains(op)
    }
}

impl Execute for RecordingShell {
    fn execute(&self, command: &str) -> Result<String, ShellError> {
        self.record(Operation::Execute, command)?;
        Ok(self.answer(command))
    }
}

impl Read for RecordingShell {
    fn read(&self, path: &str) -> Result<String, ShellError> {
        self.record(Operation::Read, path)?;
        Ok(self.answer(path))
    }
}

impl Write for RecordingShell {
    fn write(&self, path: &str, content: &str) -> Result<(), ShellError> {
        self.record_with(Operation::Write, path, content.as_bytes())
    }
}

impl Upload for RecordingShell {
    fn upload(&self, contents: &[u8], destination: &str) -> Result<(), ShellError> {
        self.record_with(Operation::Upload, destination, contents)
    }
}

impl Unlink for RecordingShell {
    fn unlink(&self, path: &str) -> Result<(), ShellError> {
        self.record(Operation::Unlink, path)
    }
}

impl Shell for RecordingShell {
    fn name(&self) -> &str {
        "recording"
    }

    fn as_execute(&self) -> Option<&dyn Execute> {
        self.exposes(Operation::Execute).then_some(self as &dyn Execute)
    }

    fn as_read(&self) -> Option<&dyn Read> {
        self.exposes(Operation::Read).then_some(self as &dyn Read)
    }

    fn as_write(&self) -> Option<&dyn Write> {
        self.exposes(Operation::Write).then_some(self as &dyn Write)
    }

    fn as_upload(&self) -> Option<&dyn Upload> {
        self.exposes(Operation::Upload).then_some(self as &dyn Upload)
    }

    fn as_unlink(&self) -> Option<&dyn Unlink> {
        self.exposes(Operation::Unlink).then_some(self as &dyn Unlink)
    }
}
