//! Process execution with merged, ordered output capture.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use tsmon_core::{CommandOutput, CommandRunner, Invocation, MonitorError, Result};

const READ_CHUNK: usize = 8 * 1024;

/// Runs commands as child processes.
///
/// Stdout and stderr are drained concurrently and appended to one buffer in
/// the order chunks arrive. Nothing is echoed to the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let start = Instant::now();

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MonitorError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

        let mut merged = Vec::new();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            tokio::select! {
                n = stdout.read(&mut out_buf), if out_open => match n? {
                    0 => out_open = false,
                    n => merged.extend_from_slice(&out_buf[..n]),
                },
                n = stderr.read(&mut err_buf), if err_open => match n? {
                    0 => err_open = false,
                    n => merged.extend_from_slice(&err_buf[..n]),
                },
            }
        }

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);
        debug!(
            command = %invocation.display(),
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = merged.len(),
            "command finished"
        );

        Ok(CommandOutput {
            exit_code,
            output: String::from_utf8_lossy(&merged).into_owned(),
        })
    }
}
