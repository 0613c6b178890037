//! Status polling for long-running jobs.
//!
//! Deep research tasks and batches are tracked by fetching their status on
//! an interval until the API reports a terminal state. The remote status is
//! the only source of truth; nothing is inferred locally.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{ValyuError, ValyuResult};
use crate::types::{ApiResponse, BatchStatusResponse, DeepResearchStatusResponse};

/// Default interval between deep research status checks.
pub const DEEP_RESEARCH_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default interval between batch status checks.
pub const BATCH_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Default ceiling on total wait time (2 hours).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(7_200_000);

/// Interval and ceiling of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between status checks.
    pub interval: Duration,
    /// Wall-clock ceiling, measured from the start of the loop.
    pub max_wait: Duration,
}

impl PollConfig {
    /// Defaults for deep research tasks: 5 s interval, 2 h ceiling.
    pub const fn deep_research() -> Self {
        Self {
            interval: DEEP_RESEARCH_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Defaults for batches: 10 s interval, 2 h ceiling.
    pub const fn batch() -> Self {
        Self {
            interval: BATCH_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Sets the interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the ceiling.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::deep_research()
    }
}

/// A status response the poller can drive to completion.
pub trait PollState: ApiResponse {
    /// Returns true once no further transitions will happen.
    fn is_terminal(&self) -> bool;
}

impl PollState for DeepResearchStatusResponse {
    fn is_terminal(&self) -> bool {
        DeepResearchStatusResponse::is_terminal(self)
    }
}

impl PollState for BatchStatusResponse {
    fn is_terminal(&self) -> bool {
        BatchStatusResponse::is_terminal(self)
    }
}

/// Polls `fetch` until it returns a terminal state.
///
/// Each cycle fetches the status, rejects an in-band failure, reports the
/// state to `on_progress`, and returns it if terminal. Otherwise the loop
/// fails with [`ValyuError::WaitTimeout`] once `max_wait` has elapsed, or
/// sleeps for `interval`. Cancellation is observed before every fetch and
/// during every sleep and ends the loop with [`ValyuError::Cancelled`].
pub async fn poll_until_terminal<S, F, Fut, P>(
    config: PollConfig,
    cancel: &CancellationToken,
    mut fetch: F,
    mut on_progress: P,
) -> ValyuResult<S>
where
    S: PollState,
    F: FnMut() -> Fut,
    Fut: Future<Output = ValyuResult<S>>,
    P: FnMut(&S),
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ValyuError::Cancelled);
        }

        let state = fetch().await?;
        polls += 1;

        if !state.is_success() {
            let message = state
                .error_message()
                .unwrap_or("status check failed")
                .to_string();
            warn!(polls, error = %message, "Status check reported failure");
            return Err(ValyuError::api(200, message));
        }

        on_progress(&state);

        if state.is_terminal() {
            debug!(polls, elapsed = ?started.elapsed(), "Poll reached terminal state");
            return Ok(state);
        }

        let waited = started.elapsed();
        if waited > config.max_wait {
            warn!(polls, ?waited, "Maximum wait time exceeded");
            return Err(ValyuError::WaitTimeout { waited });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(polls, "Poll cancelled");
                return Err(ValyuError::Cancelled);
            }
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeepResearchStatus;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn status(s: DeepResearchStatus) -> DeepResearchStatusResponse {
        DeepResearchStatusResponse {
            success: true,
            status: Some(s),
            ..Default::default()
        }
    }

    fn scripted(
        states: Vec<DeepResearchStatusResponse>,
    ) -> (
        Arc<Mutex<VecDeque<DeepResearchStatusResponse>>>,
        Arc<Mutex<u32>>,
    ) {
        (
            Arc::new(Mutex::new(states.into_iter().collect())),
            Arc::new(Mutex::new(0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_terminal_state_and_reports_every_poll() {
        use DeepResearchStatus::*;
        let (queue, fetches) = scripted(vec![
            status(Queued),
            status(Running),
            status(Running),
            status(Completed),
        ]);
        let mut seen = Vec::new();
        let token = CancellationToken::new();
        let started = Instant::now();

        let result = poll_until_terminal(
            PollConfig::deep_research(),
            &token,
            || {
                let queue = queue.clone();
                let fetches = fetches.clone();
                async move {
                    *fetches.lock().unwrap() += 1;
                    Ok(queue.lock().unwrap().pop_front().unwrap())
                }
            },
            |s: &DeepResearchStatusResponse| seen.push(s.status),
        )
        .await
        .unwrap();

        assert_eq!(result.status, Some(Completed));
        assert_eq!(
            seen,
            vec![Some(Queued), Some(Running), Some(Running), Some(Completed)]
        );
        assert_eq!(*fetches.lock().unwrap(), 4);
        // Three waits between four status checks.
        let elapsed = started.elapsed();
        assert!(elapsed >= DEEP_RESEARCH_POLL_INTERVAL * 3);
        assert!(elapsed < DEEP_RESEARCH_POLL_INTERVAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout() {
        let token = CancellationToken::new();
        let config = PollConfig::deep_research()
            .with_interval(Duration::from_secs(1))
            .with_max_wait(Duration::from_millis(2_500));

        let result = poll_until_terminal(
            config,
            &token,
            || async { Ok(status(DeepResearchStatus::Running)) },
            |_: &DeepResearchStatusResponse| {},
        )
        .await;

        match result {
            Err(ValyuError::WaitTimeout { waited }) => {
                assert!(waited > Duration::from_millis(2_500))
            }
            other => panic!("expected wait timeout, got {:?}", other.map(|s| s.status)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            canceller.cancel();
        });

        let result = poll_until_terminal(
            PollConfig::deep_research(),
            &token,
            || async { Ok(status(DeepResearchStatus::Running)) },
            |_: &DeepResearchStatusResponse| {},
        )
        .await;

        assert!(matches!(result, Err(ValyuError::Cancelled)));
    }

    #[tokio::test]
    async fn test_in_band_failure_stops_loop() {
        let token = CancellationToken::new();
        let result = poll_until_terminal(
            PollConfig::deep_research(),
            &token,
            || async { Ok(DeepResearchStatusResponse::failure("Task not found")) },
            |_: &DeepResearchStatusResponse| panic!("progress must not be reported"),
        )
        .await;

        match result {
            Err(ValyuError::Api { message, .. }) => assert_eq!(message, "Task not found"),
            other => panic!("expected api error, got {:?}", other.map(|s| s.status)),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let token = CancellationToken::new();
        let result: ValyuResult<DeepResearchStatusResponse> = poll_until_terminal(
            PollConfig::batch(),
            &token,
            || async {
                Err(ValyuError::Network {
                    message: "connection refused".into(),
                })
            },
            |_: &DeepResearchStatusResponse| {},
        )
        .await;

        assert!(matches!(result, Err(ValyuError::Network { .. })));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PollConfig::deep_research().interval, Duration::from_secs(5));
        assert_eq!(PollConfig::batch().interval, Duration::from_secs(10));
        assert_eq!(PollConfig::batch().max_wait, Duration::from_secs(7_200));
    }
}
