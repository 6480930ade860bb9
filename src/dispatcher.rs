// Dispatch process orchestration on top of the process controller

use std::path::PathBuf;
use std::time::Duration;

use crate::process_controller::{ProcessController, SpawnError};

/// Binds a [`ProcessController`] to the dispatch executable and its argument
/// convention: the literal `start` followed by one `<ip>/<weight>` token per
/// qualified interface.
pub struct DispatchOrchestrator {
    controller: ProcessController,
    grace: Duration,
}

impl DispatchOrchestrator {
    pub fn new(executable: impl Into<PathBuf>, settle: Duration, grace: Duration) -> Self {
        Self {
            controller: ProcessController::new(executable, settle),
            grace,
        }
    }

    /// Stops any running dispatch process, then starts a new one for the
    /// given tokens. An empty token list leaves the dispatcher stopped (no
    /// process runs with zero qualified interfaces). Returns whether a
    /// process is running afterwards.
    pub async fn restart(&mut self, tokens: &[String]) -> Result<bool, SpawnError> {
        self.controller.stop(self.grace).await;
        if tokens.is_empty() {
            tracing::info!("no qualified interfaces, dispatcher left stopped");
            return Ok(false);
        }
        tracing::info!(tokens = ?tokens, "restarting dispatcher");
        let mut args = Vec::with_capacity(tokens.len() + 1);
        args.push("start".to_string());
        args.extend(tokens.iter().cloned());
        self.controller.start(&args).await?;
        Ok(true)
    }

    pub async fn stop(&mut self) -> bool {
        self.controller.stop(self.grace).await
    }

    pub fn is_running(&mut self) -> bool {
        self.controller.is_running()
    }

    pub fn output_snapshot(&self) -> Option<String> {
        self.controller.output_snapshot()
    }

    pub fn output_len(&self) -> usize {
        self.controller.output_len()
    }
}
