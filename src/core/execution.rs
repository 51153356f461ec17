//! # Execution Supervisor Module / 执行监控模块
//!
//! This module runs the external test runner as a child process and watches
//! it until its output ends or its deadline passes. Standard output and
//! standard error are merged into one line stream and handed to a caller
//! supplied sink as each line arrives.
//!
//! The supervisor never judges the run by the child's exit status. Whether
//! the tests passed is decided later from the signal lines in the log.
//!
//! 此模块将外部测试运行器作为子进程运行，并监控它直到输出结束或超过截止时间。
//! 标准输出和标准错误被合并为一个行流，每行到达时即交给调用方提供的处理函数。
//! 监控器从不根据子进程的退出状态判断运行结果。

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::core::config::RunConfig;
use crate::core::planner::RunPlan;
use crate::error::{LocalTestError, Result};
use crate::infra::command::parse_command_line;

/// Where a supervised run is in its lifecycle.
///
/// 受监控运行所处的生命周期阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// The child is alive and its output is still open.
    Running,
    /// The deadline passed and the child was killed.
    TimedOut,
    /// The output stream ended before any deadline.
    Completed,
}

/// What happened during one supervised run.
#[derive(Debug, Clone)]
pub struct SupervisionReport {
    pub state: SupervisorState,
    /// Number of output lines forwarded to the sink.
    pub lines: usize,
    pub elapsed: Duration,
    /// Exit status of the child, when it could be collected.
    pub exit_status: Option<ExitStatus>,
}

impl SupervisionReport {
    pub fn timed_out(&self) -> bool {
        self.state == SupervisorState::TimedOut
    }
}

/// Supervises one child process with an optional wall-clock timeout.
#[derive(Debug, Clone, Copy)]
pub struct Supervisor {
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Supervisor {
    /// `poll_interval` bounds how long a single read may block, and so how
    /// late a kill can happen after the deadline.
    pub fn new(timeout: Option<Duration>, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.timeout, config.poll_interval)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Spawns `cmd` and forwards every output line to `on_line` until the
    /// stream ends (`Completed`) or the deadline passes (`TimedOut`).
    ///
    /// `Completed` is final: a child that closes its output but keeps
    /// running is left alone, and its exit status stays `None`.
    ///
    /// Only failing to spawn is an error. A non-zero exit status or a
    /// timeout is reported through [`SupervisionReport`].
    pub async fn supervise<F>(&self, mut cmd: Command, mut on_line: F) -> Result<SupervisionReport>
    where
        F: FnMut(&str),
    {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LocalTestError::Spawn {
                program: program.clone(),
                source,
            })?;
        info!(program = %program, pid = ?child.id(), "spawned test runner");

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut forwarders = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(forward_lines(stderr, tx.clone()));
        }
        // The channel closes once both forwarders have hit end-of-stream.
        drop(tx);

        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        let mut state = SupervisorState::Running;
        let mut lines = 0usize;
        let mut exit_status = None;

        while state == SupervisorState::Running {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                state = SupervisorState::TimedOut;
                break;
            }

            let wait = match deadline {
                Some(d) => self
                    .poll_interval
                    .min(d.saturating_duration_since(Instant::now())),
                None => self.poll_interval,
            };

            match time::timeout(wait, rx.recv()).await {
                Ok(Some(line)) => {
                    lines += 1;
                    on_line(&line);
                }
                Ok(None) => state = SupervisorState::Completed,
                // Poll interval elapsed without output; re-check the deadline.
                Err(_) => {}
            }
        }

        if state == SupervisorState::Completed {
            // End of output ends supervision. The status is collected if the
            // child exits within one poll interval, and left unknown otherwise.
            match time::timeout(self.poll_interval, child.wait()).await {
                Ok(Ok(status)) => exit_status = Some(status),
                Ok(Err(e)) => warn!(error = %e, "failed to collect runner exit status"),
                Err(_) => debug!("runner still alive after closing its output"),
            }
        }

        if state == SupervisorState::TimedOut {
            exit_status = terminate(&mut child).await;
            for forwarder in &forwarders {
                forwarder.abort();
            }
        }

        let elapsed = started.elapsed();
        debug!(?state, lines, ?elapsed, ?exit_status, "runner supervision finished");

        Ok(SupervisionReport {
            state,
            lines,
            elapsed,
            exit_status,
        })
    }
}

/// Kills the child and reaps it.
async fn terminate(child: &mut Child) -> Option<ExitStatus> {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill failed, runner probably already exited");
    }
    child.try_wait().ok().flatten()
}

/// Reads `reader` line by line into `tx`. Invalid UTF-8 is replaced rather
/// than ending the stream.
fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "stopped reading runner output");
                    break;
                }
            }
        }
    })
}

/// Builds the runner command for a plan: the configured custom command, or
/// `<output>/bin/lava-test-runner <output>`. Runs from the output root.
pub fn runner_command(plan: &RunPlan, custom: Option<&str>) -> Result<Command> {
    let mut cmd = match custom {
        Some(command_line) => {
            let parts = parse_command_line(command_line)?;
            let (program, args) = parts.split_first().ok_or_else(|| {
                LocalTestError::InvalidCommand {
                    command: command_line.to_string(),
                    reason: "empty command".to_string(),
                }
            })?;
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        }
        None => {
            let mut cmd = Command::new(plan.runner_binary());
            cmd.arg(&plan.output_root);
            cmd
        }
    };
    cmd.current_dir(&plan.output_root);
    Ok(cmd)
}
