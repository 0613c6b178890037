//! Observability for the Valyu client.
//!
//! Service calls are traced with `tracing` spans. This module installs a
//! subscriber, masks secrets in logged text, and collects counters.

mod logging;
mod metrics;

pub use logging::{init_tracing, redact, LogConfig, LogFormat};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, MetricsSnapshot, NoopMetricsCollector};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ValyuError;

/// Measures one service call and reports it to a collector.
pub(crate) struct OperationTimer {
    operation: &'static str,
    start: Instant,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl OperationTimer {
    pub(crate) fn start(
        operation: &'static str,
        metrics: Option<Arc<dyn MetricsCollector>>,
    ) -> Self {
        Self {
            operation,
            start: Instant::now(),
            metrics,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Records the call as finished with the given outcome.
    pub(crate) fn finish(self, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(self.operation, success, self.elapsed());
        }
    }

    /// Records the call as failed with `error`.
    pub(crate) fn fail(self, error: &ValyuError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(error_kind(error));
        }
        self.finish(false);
    }
}

/// Short label for an error, used as a metrics key.
pub fn error_kind(error: &ValyuError) -> &'static str {
    match error {
        ValyuError::Configuration { .. } => "configuration",
        ValyuError::Validation { .. } => "validation",
        ValyuError::Api { .. } => "api",
        ValyuError::Network { .. } => "network",
        ValyuError::Timeout { .. } => "timeout",
        ValyuError::Cancelled => "cancelled",
        ValyuError::WaitTimeout { .. } => "wait_timeout",
        ValyuError::TaskFailed { .. } => "task_failed",
        ValyuError::Stream { .. } => "stream",
        ValyuError::Serialization { .. } => "serialization",
    }
}
