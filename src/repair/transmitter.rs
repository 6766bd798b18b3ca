// ─── Repair Transmitter ───
// Parent side of the worker bridge: spawns the child process, writes
// commands to its stdin, reads replies from its stdout, and forwards its
// stderr log lines with a visual prefix.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{info, warn};

use super::message::{WorkerCommand, WorkerReply};
use crate::error::{CoreError, CoreResult};

pub struct RepairTransmitter {
    child: Child,
    stdin: ChildStdin,
    replies: Lines<BufReader<ChildStdout>>,
}

impl RepairTransmitter {
    /// Spawn `program` with the handler key as its single positional
    /// argument and wire up the message channel.
    pub async fn spawn(program: &Path, handler: &str) -> CoreResult<Self> {
        let mut child = Command::new(program)
            .arg(handler)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::io(program, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoreError::Worker("worker stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CoreError::Worker("worker stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CoreError::Worker("worker stderr unavailable".into()))?;

        // Forward worker logs line-by-line, visually distinct
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("{} {}", WORKER_LOG_PREFIX, line);
            }
        });

        info!("Spawned repair worker ({})", handler);
        Ok(Self {
            child,
            stdin,
            replies: BufReader::new(stdout).lines(),
        })
    }

    /// Spawn the current executable as its own worker.
    pub async fn spawn_self(handler: &str) -> CoreResult<Self> {
        let exe = std::env::current_exe().map_err(|e| CoreError::io("current_exe", e))?;
        Self::spawn(&exe, handler).await
    }

    pub async fn send(&mut self, command: &WorkerCommand) -> CoreResult<()> {
        let mut line = serde_json::to_string(command)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| CoreError::Worker(format!("worker channel write failed: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| CoreError::Worker(format!("worker channel flush failed: {e}")))?;
        Ok(())
    }

    /// Next reply off the channel; `None` once the child closed its stdout.
    pub async fn next_reply(&mut self) -> CoreResult<Option<WorkerReply>> {
        loop {
            match self
                .replies
                .next_line()
                .await
                .map_err(|e| CoreError::Worker(format!("worker channel read failed: {e}")))?
            {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(serde_json::from_str(&line)?)),
            }
        }
    }

    /// Tear the worker down: send the disconnect signal and wait for a
    /// clean exit. The child is killed if the channel is already broken.
    pub async fn disconnect(mut self) -> CoreResult<()> {
        if self.send(&WorkerCommand::Disconnect).await.is_err() {
            warn!("Worker channel already closed, killing process");
            let _ = self.child.kill().await;
            return Ok(());
        }
        drop(self.stdin);
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| CoreError::Worker(format!("worker wait failed: {e}")))?;
        info!("Repair worker exited with {status}");
        Ok(())
    }
}

const WORKER_LOG_PREFIX: &str = "[worker]";
