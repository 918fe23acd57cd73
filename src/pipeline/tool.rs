//! Running the poppler executables.
//!
//! Both adapters go through [`run`], which owns the process-level policy:
//!
//! * stdin is closed, stdout and stderr are captured;
//! * the child is killed if the returned future is dropped (`kill_on_drop`),
//!   so a client disconnect or a timeout never leaves a stray process;
//! * the whole invocation is bounded by [`ToolConfig::timeout`].
//!
//! Interpreting the exit status is left to the caller because the two tools
//! are treated differently (see [`super::images`]).

use crate::config::ToolConfig;
use crate::error::Pdf2JsonError;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    /// Lossily decoded and trimmed.
    pub stderr: String,
}

impl ToolOutput {
    /// Turn a non-zero exit into [`Pdf2JsonError::ToolFailed`].
    pub fn check(self, tool: &ToolConfig) -> Result<Self, Pdf2JsonError> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(Pdf2JsonError::ToolFailed {
                tool: tool.name(),
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

/// `-f`/`-l` flags for a page range.
///
/// A bound of `0` means "unbounded on that side" and is omitted rather than
/// passed through: poppler would otherwise read `-l 0` literally.
pub fn page_range_args(start_page: u32, end_page: u32) -> Vec<OsString> {
    let mut args = Vec::with_capacity(4);
    if start_page > 0 {
        args.push("-f".into());
        args.push(start_page.to_string().into());
    }
    if end_page > 0 {
        args.push("-l".into());
        args.push(end_page.to_string().into());
    }
    args
}

/// Run `tool` with `args` to completion, or until its timeout expires.
///
/// Fails with [`Pdf2JsonError::ToolSpawn`] if the process cannot be started
/// and [`Pdf2JsonError::ToolTimeout`] if it runs too long. A non-zero exit
/// is returned as `Ok`; use [`ToolOutput::check`] to reject it.
pub async fn run(tool: &ToolConfig, args: &[OsString]) -> Result<ToolOutput, Pdf2JsonError> {
    debug!("Running {} {:?}", tool.program.display(), args);

    let child = Command::new(&tool.program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Pdf2JsonError::ToolSpawn {
            tool: tool.name(),
            source,
        })?;

    // On timeout the `wait_with_output` future is dropped together with the
    // child, which kills it.
    let output = tokio::time::timeout(tool.timeout, child.wait_with_output())
        .await
        .map_err(|_| Pdf2JsonError::ToolTimeout {
            tool: tool.name(),
            secs: tool.timeout.as_secs(),
        })?
        .map_err(|e| Pdf2JsonError::Internal(format!("waiting for {}: {e}", tool.name())))?;

    debug!(
        "{} exited with {} ({} bytes stdout)",
        tool.name(),
        output.status,
        output.stdout.len()
    );

    Ok(ToolOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
