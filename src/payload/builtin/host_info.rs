//! Identity summary of the target host.

use serde::Serialize;
use serde_json::Value;

use super::CurrentUser;
use crate::error::PayloadError;
use crate::payload::{PayloadLogic, ShellAccess};
use crate::shell::{Operation, OperationSet};

const HOSTNAME_FILE: &str = "/etc/hostname";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostReport {
    pub user: String,
    pub hostname: String,
    pub kernel: String,
}

/// Combines the `current_user` payload with a hostname read and `uname`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostInfo;

impl HostInfo {
    fn collect(&self, shell: &ShellAccess<'_>) -> Result<HostReport, PayloadError> {
        let user = shell.exec_payload(&CurrentUser, "")?;
        let user = user["user"].as_str().ok_or_else(|| PayloadError::Output {
            payload: self.name().to_string(),
            reason: "current_user returned no user".to_string(),
        })?;

        Ok(HostReport {
            user: user.to_string(),
            hostname: shell.read(HOSTNAME_FILE)?.trim().to_string(),
            kernel: shell.execute("uname -sr")?.trim().to_string(),
        })
    }
}

impl PayloadLogic for HostInfo {
    fn name(&self) -> &str {
        "host_info"
    }

    fn description(&self) -> &str {
        "Summarize user, hostname and kernel of the target"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute, Operation::Read])
    }

    fn nested(&self) -> Vec<&dyn PayloadLogic> {
        vec![&CurrentUser as &dyn PayloadLogic]
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        _argument: &str,
    ) -> Result<String, PayloadError> {
        let report = self.collect(shell)?;
        Ok(format!(
            "user:     {}\nhostname: {}\nkernel:   {}\n",
            report.user, report.hostname, report.kernel
        ))
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        _argument: &str,
    ) -> Result<Value, PayloadError> {
        let report = self.collect(shell)?;
        serde_json::to_value(report).map_err(|e| PayloadError::Output {
            payload: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}
