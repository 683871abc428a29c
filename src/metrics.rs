//! Simple metrics collection for observability
//!
//! This module provides lightweight metrics collection using atomic counters.
//! Designed for minimal overhead and zero allocations in the hot path.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Core metrics collected by the server
pub struct Metrics {
    /// Server start time
    start_time: Instant,

    /// Total requests received
    pub total_requests: AtomicU64,

    /// Requests by endpoint
    pub quotes_requests: AtomicU64,
    pub random_requests: AtomicU64,

    /// Request outcomes
    pub requests_served: AtomicU64,
    pub requests_exhausted: AtomicU64,
    pub requests_unauthorized: AtomicU64,

    /// Quotes handed out through `/random`
    pub quotes_issued: AtomicU64,

    /// Request latency buckets (in microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_under_10ms: AtomicU64,
    pub latency_under_100ms: AtomicU64,
    pub latency_under_1s: AtomicU64,
    pub latency_over_1s: AtomicU64,

    /// Histogram support
    pub latency_sum_micros: AtomicU64,
    pub latency_count: AtomicU64,

    /// Allocation table metrics
    pub active_clients: AtomicUsize,
    pub resets_total: AtomicU64,
}

/// Endpoint type for metrics tracking
#[derive(Debug, Clone, Copy)]
pub enum Endpoint {
    Quotes,
    Random,
}

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Served,
    Exhausted,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            quotes_requests: AtomicU64::new(0),
            random_requests: AtomicU64::new(0),
            requests_served: AtomicU64::new(0),
            requests_exhausted: AtomicU64::new(0),
            requests_unauthorized: AtomicU64::new(0),
            quotes_issued: AtomicU64::new(0),
            latency_under_1ms: AtomicU64::new(0),
            latency_under_10ms: AtomicU64::new(0),
            latency_under_100ms: AtomicU64::new(0),
            latency_under_1s: AtomicU64::new(0),
            latency_over_1s: AtomicU64::new(0),
            latency_sum_micros: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            active_clients: AtomicUsize::new(0),
            resets_total: AtomicU64::new(0),
        }
    }

    /// Record a handled request and its latency
    pub fn record_request(&self, endpoint: Endpoint, latency_us: u64, outcome: Outcome) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match endpoint {
            Endpoint::Quotes => self.quotes_requests.fetch_add(1, Ordering::Relaxed),
            Endpoint::Random => self.random_requests.fetch_add(1, Ordering::Relaxed),
        };

        match outcome {
            Outcome::Served => self.requests_served.fetch_add(1, Ordering::Relaxed),
            Outcome::Exhausted => self.requests_exhausted.fetch_add(1, Ordering::Relaxed),
        };

        if matches!((endpoint, outcome), (Endpoint::Random, Outcome::Served)) {
            self.quotes_issued.fetch_add(1, Ordering::Relaxed);
        }

        self.record_latency(latency_us);
    }

    /// Record a request rejected by the access gate
    pub fn record_unauthorized(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.requests_unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed daily reset
    pub fn record_reset(&self) {
        self.resets_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of daily resets performed so far
    pub fn resets(&self) -> u64 {
        self.resets_total.load(Ordering::Relaxed)
    }

    /// Update the number of known client records
    pub fn update_active_clients(&self, count: usize) {
        self.active_clients.store(count, Ordering::Relaxed);
    }

    fn record_latency(&self, latency_us: u64) {
        match latency_us {
            0..=999 => self.latency_under_1ms.fetch_add(1, Ordering::Relaxed),
            1000..=9999 => self.latency_under_10ms.fetch_add(1, Ordering::Relaxed),
            10000..=99999 => self.latency_under_100ms.fetch_add(1, Ordering::Relaxed),
            100000..=999999 => self.latency_under_1s.fetch_add(1, Ordering::Relaxed),
            _ => self.latency_over_1s.fetch_add(1, Ordering::Relaxed),
        };

        self.latency_sum_micros
            .fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::with_capacity(1500);

        output.push_str("# HELP quotecrab_uptime_seconds Time since server start in seconds\n");
        output.push_str("# TYPE quotecrab_uptime_seconds gauge\n");
        output.push_str(&format!(
            "quotecrab_uptime_seconds {}\n\n",
            self.uptime_seconds()
        ));

        output.push_str("# HELP quotecrab_requests_total Total number of requests processed\n");
        output.push_str("# TYPE quotecrab_requests_total counter\n");
        output.push_str(&format!(
            "quotecrab_requests_total {}\n\n",
            self.total_requests.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP quotecrab_requests_by_endpoint Handled requests by endpoint\n");
        output.push_str("# TYPE quotecrab_requests_by_endpoint counter\n");
        output.push_str(&format!(
            "quotecrab_requests_by_endpoint{{endpoint=\"quotes\"}} {}\n",
            self.quotes_requests.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "quotecrab_requests_by_endpoint{{endpoint=\"random\"}} {}\n\n",
            self.random_requests.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP quotecrab_requests_by_outcome Requests by outcome\n");
        output.push_str("# TYPE quotecrab_requests_by_outcome counter\n");
        output.push_str(&format!(
            "quotecrab_requests_by_outcome{{outcome=\"served\"}} {}\n",
            self.requests_served.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "quotecrab_requests_by_outcome{{outcome=\"exhausted\"}} {}\n",
            self.requests_exhausted.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "quotecrab_requests_by_outcome{{outcome=\"unauthorized\"}} {}\n\n",
            self.requests_unauthorized.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP quotecrab_quotes_issued Quotes issued through /random\n");
        output.push_str("# TYPE quotecrab_quotes_issued counter\n");
        output.push_str(&format!(
            "quotecrab_quotes_issued {}\n\n",
            self.quotes_issued.load(Ordering::Relaxed)
        ));

        // Latency distribution
        let under_1ms = self.latency_under_1ms.load(Ordering::Relaxed);
        let under_10ms = under_1ms + self.latency_under_10ms.load(Ordering::Relaxed);
        let under_100ms = under_10ms + self.latency_under_100ms.load(Ordering::Relaxed);
        let under_1s = under_100ms + self.latency_under_1s.load(Ordering::Relaxed);
        let count = self.latency_count.load(Ordering::Relaxed);

        output.push_str("# HELP quotecrab_request_duration_seconds Request latency distribution\n");
        output.push_str("# TYPE quotecrab_request_duration_seconds histogram\n");
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_bucket{{le=\"0.001\"}} {under_1ms}\n"
        ));
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_bucket{{le=\"0.01\"}} {under_10ms}\n"
        ));
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_bucket{{le=\"0.1\"}} {under_100ms}\n"
        ));
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_bucket{{le=\"1\"}} {under_1s}\n"
        ));
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_bucket{{le=\"+Inf\"}} {count}\n"
        ));

        let latency_sum_seconds =
            self.latency_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_sum {latency_sum_seconds:.6}\n"
        ));
        output.push_str(&format!(
            "quotecrab_request_duration_seconds_count {count}\n\n"
        ));

        // Allocation table
        output.push_str("# HELP quotecrab_active_clients Number of known client records\n");
        output.push_str("# TYPE quotecrab_active_clients gauge\n");
        output.push_str(&format!(
            "quotecrab_active_clients {}\n\n",
            self.active_clients.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP quotecrab_resets_total Daily allocation resets performed\n");
        output.push_str("# TYPE quotecrab_resets_total counter\n");
        output.push_str(&format!("quotecrab_resets_total {}\n", self.resets()));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.total_requests.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.requests_served.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.requests_exhausted.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.requests_unauthorized.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.resets(), 0);
    }

    #[test]
    fn test_record_request() {
        let metrics = Metrics::new();

        metrics.record_request(Endpoint::Random, 500, Outcome::Served);

        assert_eq!(metrics.total_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.random_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_served.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.quotes_issued.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_1ms.load(Ordering::Relaxed), 1);

        metrics.record_request(Endpoint::Random, 50000, Outcome::Exhausted);

        assert_eq!(metrics.total_requests.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_exhausted.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.quotes_issued.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_100ms.load(Ordering::Relaxed), 1);

        // Listing the corpus is served but issues nothing
        metrics.record_request(Endpoint::Quotes, 100, Outcome::Served);
        assert_eq!(metrics.quotes_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.quotes_issued.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unauthorized_skips_latency() {
        let metrics = Metrics::new();
        metrics.record_unauthorized();

        assert_eq!(metrics.total_requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_unauthorized.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_latency_buckets() {
        let metrics = Metrics::new();

        metrics.record_request(Endpoint::Quotes, 500, Outcome::Served); // < 1ms
        metrics.record_request(Endpoint::Quotes, 5000, Outcome::Served); // < 10ms
        metrics.record_request(Endpoint::Quotes, 50000, Outcome::Served); // < 100ms
        metrics.record_request(Endpoint::Quotes, 500000, Outcome::Served); // < 1s
        metrics.record_request(Endpoint::Quotes, 5000000, Outcome::Served); // > 1s

        assert_eq!(metrics.latency_under_1ms.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_10ms.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_100ms.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_under_1s.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.latency_over_1s.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();

        metrics.record_request(Endpoint::Random, 500, Outcome::Served);
        metrics.record_request(Endpoint::Random, 1500, Outcome::Exhausted);
        metrics.record_unauthorized();
        metrics.update_active_clients(7);
        metrics.record_reset();

        let output = metrics.export_prometheus();

        assert!(output.contains("quotecrab_uptime_seconds"));
        assert!(output.contains("quotecrab_requests_total 3"));
        assert!(output.contains("quotecrab_requests_by_endpoint{endpoint=\"random\"} 2"));
        assert!(output.contains("quotecrab_requests_by_outcome{outcome=\"served\"} 1"));
        assert!(output.contains("quotecrab_requests_by_outcome{outcome=\"exhausted\"} 1"));
        assert!(output.contains("quotecrab_requests_by_outcome{outcome=\"unauthorized\"} 1"));
        assert!(output.contains("quotecrab_request_duration_seconds_bucket{le=\"0.01\"} 2"));
        assert!(output.contains("quotecrab_request_duration_seconds_count 2"));
        assert!(output.contains("quotecrab_active_clients 7"));
        assert!(output.contains("quotecrab_resets_total 1"));
    }
}
