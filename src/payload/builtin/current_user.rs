//! Name of the account the shell runs as.

use serde_json::{Value, json};

use crate::error::PayloadError;
use crate::payload::{PayloadLogic, ShellAccess};
use crate::shell::{Operation, OperationSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentUser;

impl CurrentUser {
    fn whoami(&self, shell: &ShellAccess<'_>) -> Result<String, PayloadError> {
        let output = shell.execute("whoami")?;
        let user = output.lines().next().unwrap_or("").trim();
        if user.is_empty() {
            return Err(PayloadError::Output {
                payload: self.name().to_string(),
                reason: "whoami returned nothing".to_string(),
            });
        }
        Ok(user.to_string())
    }
}

impl PayloadLogic for CurrentUser {
    fn name(&self) -> &str {
        "current_user"
    }

    fn description(&self) -> &str {
        "Report the user the shell runs as"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        _argument: &str,
    ) -> Result<String, PayloadError> {
        self.whoami(shell)
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        _argument: &str,
    ) -> Result<Value, PayloadError> {
        Ok(json!({ "user": self.whoami(shell)? }))
    }
}
