//! Local accounts listed in a passwd-format file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::PayloadError;
use crate::payload::{PayloadLogic, ShellAccess};
use crate::shell::{Operation, OperationSet};

const DEFAULT_PASSWD: &str = "/etc/passwd";

/// One account from a passwd-format file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswdEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: String,
    pub shell: String,
}

/// Parse `name:passwd:uid:gid:gecos:home:shell` lines.
///
/// Blank lines, comments and malformed lines are skipped.
pub fn parse_passwd(content: &str) -> Vec<PasswdEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let entry = parse_line(line);
            if entry.is_none() {
                debug!(line, "skipping malformed passwd line");
            }
            entry
        })
        .collect()
}

fn parse_line(line: &str) -> Option<PasswdEntry> {
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() != 7 || fields[0].is_empty() {
        return None;
    }
    Some(PasswdEntry {
        name: fields[0].to_string(),
        uid: fields[2].parse().ok()?,
        gid: fields[3].parse().ok()?,
        home: fields[5].to_string(),
        shell: fields[6].to_string(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Users;

impl Users {
    fn entries(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Vec<PasswdEntry>, PayloadError> {
        let path = match argument.trim() {
            "" => DEFAULT_PASSWD,
            p => p,
        };
        let content = shell.read(path)?;
        let entries = parse_passwd(&content);
        if entries.is_empty() && !content.trim().is_empty() {
            return Err(PayloadError::Output {
                payload: self.name().to_string(),
                reason: format!("{} is not in passwd format", path),
            });
        }
        Ok(entries)
    }
}

impl PayloadLogic for Users {
    fn name(&self) -> &str {
        "users"
    }

    fn description(&self) -> &str {
        "List local accounts from a passwd file (default /etc/passwd)"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Read])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        let entries = self.entries(shell, argument)?;
        let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0).max(4);

        let mut out = format!(
            "{:<width$}  {:>6}  {:>6}  {:<20}  {}\n",
            "user", "uid", "gid", "home", "shell"
        );
        for e in &entries {
            out.push_str(&format!(
                "{:<width$}  {:>6}  {:>6}  {:<20}  {}\n",
                e.name, e.uid, e.gid, e.home, e.shell
            ));
        }
        Ok(out)
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        let entries = self.entries(shell, argument)?;
        serde_json::to_value(entries).map_err(|e| PayloadError::Output {
            payload: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}
