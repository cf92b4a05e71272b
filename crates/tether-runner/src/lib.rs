// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External agent process runner.
//!
//! [`ProcessRunner`] launches the configured agent executable with the prompt
//! as its last argument, captures stdout and stderr in full, and classifies the
//! outcome into a [`RunError`] variant. Exit status zero is success even when
//! stderr is non-empty.

pub mod auth;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tether_config::model::RunnerConfig;
use tether_core::{AgentRunner, RunError, RunOutput};
use tracing::{debug, info, warn};

/// Runs prompts through a local agent CLI such as `claude -p <prompt>`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
    prompt_args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<PathBuf>, prompt_args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            prompt_args,
            timeout: None,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(&config.executable_path, config.prompt_args.clone()).with_timeout(timeout)
    }

    /// Limit the wall-clock duration of each run. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run one prompt to completion.
    pub async fn run_prompt(&self, prompt: &str) -> Result<RunOutput, RunError> {
        if !is_executable_file(&self.executable) {
            return Err(RunError::ExecutableNotFound(
                self.executable.display().to_string(),
            ));
        }

        let mut command = tokio::process::Command::new(&self.executable);
        command
            .args(&self.prompt_args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            executable = %self.executable.display(),
            prompt_chars = prompt.chars().count(),
            "launching agent process"
        );
        let started = Instant::now();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the output future kills the child (kill_on_drop).
                    warn!(timeout = ?limit, "agent process timed out and was killed");
                    return Err(RunError::TimedOut(limit));
                }
            },
            None => command.output().await,
        }
        .map_err(|e| RunError::ExecutionFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        info!(
            exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "agent process finished"
        );

        if output.status.success() {
            return Ok(RunOutput {
                stdout,
                stderr,
                exit_code,
            });
        }

        if let Some(snippet) = auth::detect_sign_in_required(&stdout, &stderr) {
            return Err(RunError::AuthenticationRequired(snippet));
        }

        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(RunError::NonZeroExit {
            code: exit_code,
            message,
        })
    }
}

#[async_trait]
impl AgentRunner for ProcessRunner {
    async fn run(&self, prompt: &str) -> Result<RunOutput, RunError> {
        self.run_prompt(prompt).await
    }
}

/// Regular file with at least one execute bit set.
fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
