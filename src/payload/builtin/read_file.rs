//! Contents of a file on the target.

use serde_json::{Value, json};

use super::required_arg;
use crate::error::PayloadError;
use crate::payload::{PayloadLogic, ShellAccess};
use crate::shell::{Operation, OperationSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct ReadFile;

impl PayloadLogic for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the target"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Read])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        let path = required_arg(self.name(), argument, "a file path")?;
        shell.read(path)
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        let path = required_arg(self.name(), argument, "a file path")?;
        let content = shell.read(path)?;
        Ok(json!({
            "path": path,
            "lines": content.lines().count(),
            "content": content,
        }))
    }
}
