//! # Command Execution Module / 命令执行模块
//!
//! Helpers for auxiliary commands that run to completion before the test
//! runner starts (such as `git clone`), and for turning a configured
//! command line into a program plus arguments.
//!
//! 用于在测试运行器启动前运行至完成的辅助命令（如 `git clone`）的工具，
//! 以及将配置的命令行转换为程序和参数的工具。

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::{LocalTestError, Result};

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<std::process::ExitStatus>, String) {
    let mut child = match cmd
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));
    let mut readers = Vec::with_capacity(2);

    if let Some(stdout) = child.stdout.take() {
        let output = Arc::clone(&output);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let mut output = output.lock().await;
                output.push_str(&line);
                output.push('\n');
            }
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let output = Arc::clone(&output);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let mut output = output.lock().await;
                output.push_str(&line);
                output.push('\n');
            }
        }));
    }

    let status = child.wait().await;

    // Drain both readers so no trailing output is lost.
    for reader in readers {
        if let Err(e) = reader.await {
            debug!(error = %e, "output reader task failed");
        }
    }

    let captured = output.lock().await.clone();
    (status, captured)
}

/// Clones `url` into `dest`, running from `workdir`.
pub async fn git_clone(url: &str, dest: &Path, workdir: &Path) -> Result<()> {
    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("clone").arg(url).arg(dest).current_dir(workdir);

    debug!(url, dest = %dest.display(), "cloning test definitions");
    let (status, output) = spawn_and_capture(cmd).await;
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => Err(LocalTestError::CloneFailed {
            url: url.to_string(),
            output,
        }),
        Err(source) => Err(LocalTestError::Spawn {
            program: "git".to_string(),
            source,
        }),
    }
}

/// Expands `~` and environment variables, then splits the command line
/// with shell quoting rules.
pub fn parse_command_line(command_line: &str) -> Result<Vec<String>> {
    let invalid = |reason: String| LocalTestError::InvalidCommand {
        command: command_line.to_string(),
        reason,
    };

    let expanded = shellexpand::full(command_line).map_err(|e| invalid(e.to_string()))?;
    let parts =
        shlex::split(&expanded).ok_or_else(|| invalid("unbalanced quotes".to_string()))?;
    if parts.is_empty() {
        return Err(invalid("empty command".to_string()));
    }
    Ok(parts)
}
