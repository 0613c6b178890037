//! Request and stream counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Sink for client metrics.
pub trait MetricsCollector: Send + Sync {
    /// Records a finished API call.
    fn record_request(&self, operation: &str, success: bool, duration: Duration);

    /// Records a failure by kind (`validation`, `api`, `network`, ...).
    fn record_error(&self, kind: &str);

    /// Records one decoded stream event by kind.
    fn record_stream_event(&self, kind: &str);

    /// Records one status check of a poll loop.
    fn record_poll(&self, operation: &str);

    /// Takes a snapshot.
    fn snapshot(&self) -> MetricsSnapshot;

    /// Clears all counters.
    fn reset(&self);
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls made.
    pub total_requests: u64,
    /// Calls that returned `success: true`.
    pub successful_requests: u64,
    /// Calls that failed in any way.
    pub failed_requests: u64,
    /// Sum of call latencies.
    pub total_latency_ms: u64,
    /// Status checks made by poll loops.
    pub polls: u64,
    /// Calls per operation.
    pub operations: HashMap<String, u64>,
    /// Failures per kind.
    pub errors: HashMap<String, u64>,
    /// Stream events per kind.
    pub stream_events: HashMap<String, u64>,
}

impl MetricsSnapshot {
    /// Mean latency per call.
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total_requests as f64
        }
    }

    /// Share of successful calls, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }
}

/// In-memory collector backed by atomics.
#[derive(Default)]
pub struct DefaultMetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_ms: AtomicU64,
    polls: AtomicU64,
    operations: RwLock<HashMap<String, u64>>,
    errors: RwLock<HashMap<String, u64>>,
    stream_events: RwLock<HashMap<String, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(map: &RwLock<HashMap<String, u64>>, key: &str) {
    if let Ok(mut map) = map.write() {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn copy(map: &RwLock<HashMap<String, u64>>) -> HashMap<String, u64> {
    map.read().map(|m| m.clone()).unwrap_or_default()
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_request(&self, operation: &str, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        bump(&self.operations, operation);
    }

    fn record_error(&self, kind: &str) {
        bump(&self.errors, kind);
    }

    fn record_stream_event(&self, kind: &str) {
        bump(&self.stream_events, kind);
    }

    fn record_poll(&self, _operation: &str) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            operations: copy(&self.operations),
            errors: copy(&self.errors),
            stream_events: copy(&self.stream_events),
        }
    }

    fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);
        self.polls.store(0, Ordering::Relaxed);
        for map in [&self.operations, &self.errors, &self.stream_events] {
            if let Ok(mut map) = map.write() {
                map.clear();
            }
        }
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("total_requests", &self.total_requests.load(Ordering::Relaxed))
            .field("failed_requests", &self.failed_requests.load(Ordering::Relaxed))
            .field("polls", &self.polls.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Collector that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn record_request(&self, _: &str, _: bool, _: Duration) {}
    fn record_error(&self, _: &str) {}
    fn record_stream_event(&self, _: &str) {}
    fn record_poll(&self, _: &str) {}
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
    fn reset(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_counters() {
        let metrics = DefaultMetricsCollector::new();
        metrics.record_request("search", true, Duration::from_millis(100));
        metrics.record_request("search", false, Duration::from_millis(300));
        metrics.record_request("answer", true, Duration::from_millis(200));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.operations.get("search"), Some(&2));
        assert!((snapshot.average_latency_ms() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stream_and_poll_counters() {
        let metrics = DefaultMetricsCollector::new();
        metrics.record_stream_event("content");
        metrics.record_stream_event("content");
        metrics.record_stream_event("metadata");
        metrics.record_poll("deep_research.wait");
        metrics.record_error("validation");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stream_events.get("content"), Some(&2));
        assert_eq!(snapshot.polls, 1);
        assert_eq!(snapshot.errors.get("validation"), Some(&1));

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_empty_rates() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.average_latency_ms(), 0.0);
        assert_eq!(snapshot.success_rate(), 100.0);
    }
}
