//! Place content on the target.

use serde_json::{Value, json};

use super::required_arg;
use crate::error::PayloadError;
use crate::payload::{PayloadLogic, ShellAccess};
use crate::shell::{Operation, OperationSet};

/// Argument is `<destination> <content>`; the content may be empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadFile;

impl UploadFile {
    /// Splits once at the first whitespace after the destination; the
    /// content after that separator is uploaded byte for byte.
    fn upload<'s>(
        &self,
        shell: &ShellAccess<'_>,
        argument: &'s str,
    ) -> Result<(&'s str, usize), PayloadError> {
        required_arg(self.name(), argument, "a destination path")?;
        let (destination, content) = match argument.trim_start().split_once(char::is_whitespace) {
            Some((dest, rest)) => (dest, rest),
            None => (argument.trim(), ""),
        };
        shell.upload(content.as_bytes(), destination)?;
        Ok((destination, content.len()))
    }
}

impl PayloadLogic for UploadFile {
    fn name(&self) -> &str {
        "upload_file"
    }

    fn description(&self) -> &str {
        "Upload content to a path on the target: <destination> <content>"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Upload])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        let (destination, bytes) = self.upload(shell, argument)?;
        Ok(format!("uploaded {} bytes to {}", bytes, destination))
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        let (destination, bytes) = self.upload(shell, argument)?;
        Ok(json!({ "destination": destination, "bytes": bytes }))
    }
}
