//! Runs one external tool against one file.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use gatehook_runtime::DispatchContext;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::catalog::{FileArgMode, ToolDescriptor, ToolType, FILE_PLACEHOLDER};
use crate::change::ChangeDetector;
use crate::issues;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters refused in file paths handed to tools
const FORBIDDEN_PATH_CHARS: &[char] = &['\0', '\'', '"', '`', '$', ';', '&', '|', '\n', '\r'];

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRunResult {
    pub tool: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Human-readable failure, when `success` is false
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    pub file_modified: bool,
    pub issues_found: usize,
    pub issues_fixed: usize,
    pub execution_time: Duration,
}

impl ToolRunResult {
    fn failed(tool: &ToolDescriptor, error: String, started: Instant) -> Self {
        Self {
            tool: tool.name.clone(),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
            exit_code: None,
            file_modified: false,
            issues_found: 0,
            issues_fixed: 0,
            execution_time: started.elapsed(),
        }
    }

    /// stdout and stderr joined, trimmed
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        if stdout.is_empty() {
            stderr.to_string()
        } else if stderr.is_empty() {
            stdout.to_string()
        } else {
            format!("{stdout}\n{stderr}")
        }
    }
}

/// Reject paths that could break out of an argument or an inline script.
/// Tools are spawned without a shell, but placeholder tools embed the path in code.
pub fn validate_file_path(path: &Path) -> Result<()> {
    let Some(s) = path.to_str() else {
        bail!("file path is not valid UTF-8: {:?}", path);
    };
    if s.trim().is_empty() {
        bail!("file path is empty");
    }
    if let Some(c) = s.chars().find(|c| FORBIDDEN_PATH_CHARS.contains(c)) {
        bail!("file path contains forbidden character {:?}: {:?}", c, s);
    }
    Ok(())
}

/// Escape a path for use inside a quoted string literal in a generated script
fn escape_for_script(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
}

/// Argument vector for a tool run (without the command itself)
pub fn build_args(tool: &ToolDescriptor, path: &str) -> Vec<String> {
    match tool.file_arg {
        FileArgMode::Append => {
            let mut args = tool.args.clone();
            args.push(path.to_string());
            args
        }
        FileArgMode::Prepend => {
            let mut args = Vec::with_capacity(tool.args.len() + 1);
            args.push(path.to_string());
            args.extend(tool.args.iter().cloned());
            args
        }
        FileArgMode::Placeholder => {
            let escaped = escape_for_script(path);
            tool.args
                .iter()
                .map(|a| a.replace(FILE_PLACEHOLDER, &escaped))
                .collect()
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf).await;
    }
    buf
}

/// Spawns tools with a timeout and reports whether they changed the file.
pub struct ToolRunner {
    detector: Arc<ChangeDetector>,
    default_timeout: Duration,
}

impl ToolRunner {
    pub fn new(detector: Arc<ChangeDetector>, default_timeout: Duration) -> Self {
        Self {
            detector,
            default_timeout,
        }
    }

    pub fn detector(&self) -> &Arc<ChangeDetector> {
        &self.detector
    }

    /// Run `tool` on `path` with working directory `cwd`.
    ///
    /// Never fails: spawn errors, non-zero exits and timeouts all come back as
    /// `success = false`. The process is killed if the tool timeout or the
    /// dispatch context expires first.
    pub async fn run_tool(
        &self,
        ctx: &DispatchContext,
        tool: &ToolDescriptor,
        path: &Path,
        cwd: &Path,
    ) -> ToolRunResult {
        let started = Instant::now();

        if let Err(e) = validate_file_path(path) {
            warn!(tool = %tool.name, error = %e, "Refusing to run tool on unsafe path");
            return ToolRunResult::failed(tool, e.to_string(), started);
        }
        let path_str = path.to_string_lossy();

        let before = self.detector.refresh(path).unwrap_or_else(|e| {
            debug!(error = %e, "Pre-run hash failed");
            String::new()
        });

        let args = build_args(tool, &path_str);
        let timeout = tool.timeout_duration().unwrap_or(self.default_timeout);
        let run_ctx = ctx.with_timeout(timeout);

        debug!(tool = %tool.name, command = %tool.command, ?args, "Spawning tool");

        let mut child = match Command::new(&tool.command)
            .args(&args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = %tool.name, error = %e, "Failed to start tool");
                return ToolRunResult::failed(
                    tool,
                    format!("failed to start {}: {}", tool.command, e),
                    started,
                );
            }
        };

        let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        // Output collection shares the deadline: a grandchild holding the
        // pipes open must not outlive the tool timeout.
        let outcome = tokio::select! {
            collected = async {
                let status = child.wait().await;
                let (stdout, stderr) = tokio::join!(&mut stdout_task, &mut stderr_task);
                (status, stdout.unwrap_or_default(), stderr.unwrap_or_default())
            } => Some(collected),
            _ = run_ctx.cancelled() => None,
        };

        let (status, stdout, stderr) = match outcome {
            Some((Ok(status), stdout, stderr)) => (status, stdout, stderr),
            Some((Err(e), _, _)) => {
                return ToolRunResult::failed(
                    tool,
                    format!("failed to wait for {}: {}", tool.command, e),
                    started,
                );
            }
            None => {
                stdout_task.abort();
                stderr_task.abort();
                if !matches!(child.try_wait(), Ok(Some(_))) {
                    if let Err(e) = child.kill().await {
                        warn!(tool = %tool.name, error = %e, "Failed to kill timed-out tool");
                    }
                }
                warn!(tool = %tool.name, timeout_ms = timeout.as_millis() as u64, "Tool timed out");
                return ToolRunResult::failed(
                    tool,
                    format!("{} timed out after {:?}", tool.name, started.elapsed()),
                    started,
                );
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        let file_modified = self.detector.has_changed(path, &before).unwrap_or_else(|e| {
            debug!(error = %e, "Post-run hash failed");
            false
        });

        let success = status.success();
        let error = if success {
            None
        } else {
            let detail = match (stderr.trim(), stdout.trim()) {
                ("", "") => format!("exited with {}", status),
                ("", out) => out.to_string(),
                (err, _) => err.to_string(),
            };
            Some(detail)
        };

        let (issues_found, issues_fixed) = match tool.tool_type {
            ToolType::Formatter => (0, 0),
            ToolType::Linter | ToolType::TypeChecker => {
                let combined = format!("{stdout}\n{stderr}");
                (
                    issues::count_issues(&combined),
                    issues::parse_fixed_count(&combined).unwrap_or(0),
                )
            }
        };

        let result = ToolRunResult {
            tool: tool.name.clone(),
            success,
            stdout,
            stderr,
            error,
            exit_code: status.code(),
            file_modified,
            issues_found,
            issues_fixed,
            execution_time: started.elapsed(),
        };

        info!(
            tool = %tool.name,
            success = result.success,
            exit_code = ?result.exit_code,
            file_modified = result.file_modified,
            elapsed_ms = result.execution_time.as_millis() as u64,
            "Tool finished"
        );
        result
    }
}
