// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted [`AgentRunner`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tether_core::{AgentRunner, RunError, RunOutput};
use tokio::sync::Mutex;

/// Results are popped in order; when the script runs out, the prompt is
/// echoed back as `echo: <prompt>`.
#[derive(Default)]
pub struct MockRunner {
    script: Mutex<VecDeque<Result<String, RunError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: impl IntoIterator<Item = Result<String, RunError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Sleep this long inside every run, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push(&self, result: Result<String, RunError>) {
        self.script.lock().await.push_back(result);
    }

    /// Prompts received, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Highest number of overlapping `run` calls observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRunner for MockRunner {
    async fn run(&self, prompt: &str) -> Result<RunOutput, RunError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        self.prompts.lock().await.push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().await.pop_front();

        self.active.fetch_sub(1, Ordering::SeqCst);
        match scripted.unwrap_or_else(|| Ok(format!("echo: {prompt}"))) {
            Ok(stdout) => Ok(RunOutput {
                stdout,
                stderr: String::new(),
                exit_code: 0,
            }),
            Err(e) => Err(e),
        }
    }
}
