//! Run submission and status polling.
//!
//! A run is submitted once and then polled at a fixed interval while the
//! platform reports it as in progress. The loop ends on a terminal status, on
//! the first failed poll (keeping the last snapshot), when the caller cancels,
//! or when the optional wait budget is spent.

use std::time::Duration;

use actorbench_api::{ActorPlatform, ApiError};
use actorbench_types::ExecutionResult;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Interval between status polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Timing policy for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub poll_interval: Duration,
    /// Total time the loop may spend waiting; `None` polls until a terminal status.
    pub max_wait: Option<Duration>,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Why the poll loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEnd {
    /// The platform reported a status other than READY or RUNNING.
    Terminal,
    /// A status poll failed; the result is the last snapshot seen.
    PollFailed(String),
    Cancelled,
    BudgetExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub result: ExecutionResult,
    pub ended: PollEnd,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The platform refused to start the run.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for RunError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, message } => RunError::Rejected { status, message },
            other => RunError::Api(other),
        }
    }
}

/// Submits `payload` for `actor_id` and polls until the run leaves the
/// in-progress states.
///
/// Every snapshot, including the submission response, is sent to `progress`
/// when a channel is supplied.
pub async fn execute_run(
    platform: &dyn ActorPlatform,
    actor_id: &str,
    payload: &Map<String, Value>,
    policy: &RunPolicy,
    cancel: &CancellationToken,
    progress: Option<&UnboundedSender<ExecutionResult>>,
) -> Result<RunOutcome, RunError> {
    let started = Instant::now();
    let mut result = platform.start_run(actor_id, payload).await.inspect_err(|error| {
        warn!(actor_id = %actor_id, error = %error, "run submission failed");
    })?;
    info!(actor_id = %actor_id, run_id = %result.id, status = %result.status, "run submitted");
    report(progress, &result);

    let mut polls = 0u32;
    let ended = loop {
        if !result.status.is_in_progress() {
            break PollEnd::Terminal;
        }
        if let Some(max_wait) = policy.max_wait
            && started.elapsed() + policy.poll_interval > max_wait
        {
            info!(run_id = %result.id, polls, "run wait budget exhausted");
            break PollEnd::BudgetExhausted;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(run_id = %result.id, polls, "run polling cancelled");
                break PollEnd::Cancelled;
            }
            _ = tokio::time::sleep(policy.poll_interval) => {}
        }

        polls += 1;
        match platform.run_status(&result.id).await {
            Ok(snapshot) => {
                debug!(run_id = %snapshot.id, status = %snapshot.status, polls, "polled run status");
                result = snapshot;
                report(progress, &result);
            }
            Err(error) => {
                warn!(run_id = %result.id, polls, error = %error, "run status poll failed; keeping last snapshot");
                break PollEnd::PollFailed(error.to_string());
            }
        }
    };

    info!(
        run_id = %result.id,
        status = %result.status,
        polls,
        duration_ms = started.elapsed().as_millis(),
        "run polling finished"
    );
    Ok(RunOutcome { result, ended })
}

fn report(progress: Option<&UnboundedSender<ExecutionResult>>, snapshot: &ExecutionResult) {
    if let Some(sender) = progress {
        let _ = sender.send(snapshot.clone());
    }
}
