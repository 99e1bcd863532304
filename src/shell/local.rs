//! A shell on the current host, backed by a subprocess interpreter and the
//! local filesystem.
//!
//! Used for lab targets and tests. Output of `execute` is bounded: stdout and
//! stderr are merged, then cut at a byte limit (on a UTF-8 boundary) or after
//! a number of lines, whichever comes first. A cut is always marked. Line
//! endings are kept as the command wrote them.

use std::fs;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{Execute, Operation, OperationSet, Read, Shell, Unlink, Upload, Write};
use crate::error::ShellError;

const TRUNCATION_MARKER: &str = "...(truncated)...\n";
const FALLBACK_PROGRAM: &str = "/bin/sh";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalShellConfig {
    /// Interpreter invoked as `<program> -c <command>`.
    pub program: String,
    /// Working directory for commands; inherits the current one when unset.
    pub working_dir: Option<PathBuf>,
    /// Max bytes kept per command output (stdout + stderr combined).
    pub max_output_bytes: usize,
    /// Max lines kept per command output.
    pub max_lines: usize,
    /// Kill a command still running after this many milliseconds.
    pub timeout_ms: Option<u64>,
    /// Restrict the exposed operations. `None` exposes all of them.
    pub operations: Option<OperationSet>,
}

impl Default for LocalShellConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            working_dir: None,
            max_output_bytes: 64 * 1024,
            max_lines: 2000,
            timeout_ms: None,
            operations: None,
        }
    }
}

/// `$SHELL` when set and non-empty.
fn default_program() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_PROGRAM.to_string())
}

/// Byte offset just past the `max_lines`-th newline, if anything follows it.
fn line_cut(s: &str, max_lines: usize) -> Option<usize> {
    let end = match max_lines {
        0 => 0,
        n => s.match_indices('\n').nth(n - 1)?.0 + 1,
    };
    (end < s.len()).then_some(end)
}

/// Largest char boundary within `max_bytes`, if `s` is longer than that.
fn byte_cut(s: &str, max_bytes: usize) -> Option<usize> {
    if s.len() <= max_bytes {
        return None;
    }
    let mut cut = max_bytes;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    Some(cut)
}

/// Apply both limits and mark the cut, if any.
fn bound(s: &str, max_bytes: usize, max_lines: usize) -> String {
    let cut = match (byte_cut(s, max_bytes), line_cut(s, max_lines)) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return s.to_string(),
    };

    let mut out = s[..cut].to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

fn merge_output(stdout: &[u8], stderr: &[u8]) -> Vec<u8> {
    let mut merged = Vec::with_capacity(stdout.len() + stderr.len() + 1);
    merged.extend_from_slice(stdout);
    if !stderr.is_empty() {
        if merged.last().is_some_and(|b| *b != b'\n') {
            merged.push(b'\n');
        }
        merged.extend_from_slice(stderr);
    }
    merged
}

/// Shell on the current host.
pub struct LocalShell {
    config: LocalShellConfig,
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new(LocalShellConfig::default())
    }
}

impl LocalShell {
    pub fn new(config: LocalShellConfig) -> Self {
        Self { config }
    }

    /// A local shell exposing only the given operations.
    pub fn restricted(ops: impl Into<OperationSet>) -> Self {
        Self::new(LocalShellConfig {
            operations: Some(ops.into()),
            ..LocalShellConfig::default()
        })
    }

    pub fn config(&self) -> &LocalShellConfig {
        &self.config
    }

    fn exposes(&self, op: Operation) -> bool {
        self.config
            .operations
            .as_ref()
            .is_none_or(|ops| ops.contains(op))
    }

    /// Run the interpreter to completion, killing it when the timeout elapses.
    ///
    /// Blocks the calling thread. Runs on the ambient tokio runtime when there
    /// is one (call from `spawn_blocking`, not from an async task), otherwise
    /// on a private current-thread runtime.
    fn spawn(&self, command: &str) -> Result<Output, ShellError> {
        let mut c = Command::new(&self.config.program);
        c.arg("-c").arg(command);
        if let Some(dir) = &self.config.working_dir {
            c.current_dir(dir);
        }
        c.stdin(Stdio::null());
        c.kill_on_drop(true);

        let limit = self.config.timeout_ms.map(Duration::from_millis);
        let run = async move {
            let output = match limit {
                Some(limit) => timeout(limit, c.output())
                    .await
                    .map_err(|_| ShellError::Timeout(limit))?,
                None => c.output().await,
            };
            output.map_err(ShellError::from)
        };

        match Handle::try_current() {
            Ok(handle) => handle.block_on(run),
            Err(_) => Builder::new_current_thread().enable_all().build()?.block_on(run),
        }
    }
}

impl Execute for LocalShell {
    fn execute(&self, command: &str) -> Result<String, ShellError> {
        debug!(program = %self.config.program, command, "local execute");
        let res = self.spawn(command).inspect_err(|e| {
            if matches!(e, ShellError::Timeout(_)) {
                warn!(command, "local command killed: {}", e);
            }
        })?;

        let merged = merge_output(&res.stdout, &res.stderr);
        let output = bound(
            &String::from_utf8_lossy(&merged),
            self.config.max_output_bytes,
            self.config.max_lines,
        );
        if res.status.success() {
            Ok(output)
        } else {
            Err(ShellError::CommandFailed {
                // Killed by a signal when there is no code.
                status: res.status.code().unwrap_or(-1),
                output: output.trim_end().to_string(),
            })
        }
    }
}

impl Read for LocalShell {
    fn read(&self, path: &str) -> Result<String, ShellError> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Write for LocalShell {
    fn write(&self, path: &str, content: &str) -> Result<(), ShellError> {
        fs::write(path, content)?;
        Ok(())
    }
}

impl Upload for LocalShell {
    fn upload(&self, contents: &[u8], destination: &str) -> Result<(), ShellError> {
        fs::write(destination, contents)?;
        Ok(())
    }
}

impl Unlink for LocalShell {
    fn unlink(&self, path: &str) -> Result<(), ShellError> {
        fs::remove_file(path)?;
        Ok(())
    }
}

impl Shell for LocalShell {
    fn name(&self) -> &str {
        "local"
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
