//! Long-running operation polling
//!
//! Control-plane mutations are accepted immediately and finish later. A
//! client turns them into blocking calls by polling the operation status
//! with exponential backoff until it reaches a terminal state.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Status of an asynchronous control-plane operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed { reason: String },
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::InProgress)
    }
}

/// Polling configuration for long-running operations
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second poll
    pub initial_delay: Duration,

    /// Upper bound for the delay between polls
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,

    /// Give up after this many polls; `None` polls until terminal
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Tight polling for in-process control planes and tests
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_multiplier).min(self.max_delay)
    }
}

/// Poll `status` until the operation finishes.
///
/// Returns the number of polls on success.
pub async fn poll_until_done<F, Fut>(operation: &str, config: &PollConfig, mut status: F) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<OperationStatus>>,
{
    let mut delay = config.initial_delay;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match status().await? {
            OperationStatus::Succeeded => {
                tracing::debug!("{} succeeded after {} polls", operation, attempts);
                return Ok(attempts);
            }
            OperationStatus::Failed { reason } => {
                return Err(CloudError::OperationFailed {
                    operation: operation.to_string(),
                    reason,
                });
            }
            OperationStatus::InProgress => {}
        }

        if let Some(max) = config.max_attempts {
            if attempts >= max {
                return Err(CloudError::Timeout(format!(
                    "{} still in progress after {} polls",
                    operation, attempts
                )));
            }
        }

        tracing::debug!("{} in progress, next poll in {:?}", operation, delay);
        tokio::time::sleep(delay).await;
        delay = config.next_delay(delay);
    }
}
