use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for engine operations.
///
/// Counts order outcomes and tracks operation latency, mirroring everything
/// into the `metrics` facade so an exporter can be installed by the host
/// process if desired. The engine itself is metrics-free; the driver wraps
/// calls through the `time_*` helpers.
#[derive(Debug)]
pub struct EngineMetrics {
    place_order_latency: LatencyTracker,
    cancel_order_latency: LatencyTracker,

    orders_placed: AtomicU64,
    orders_rejected: AtomicU64,
    orders_cancelled: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        // Register metric descriptions
        describe_counter!("matchbook_orders_total", "Order admissions by outcome");
        describe_histogram!(
            "matchbook_operation_duration_seconds",
            "Duration of engine operations"
        );

        Self {
            place_order_latency: LatencyTracker::new("place_order"),
            cancel_order_latency: LatencyTracker::new("cancel_order"),
            orders_placed: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
        }
    }

    // Latency measurement methods
    pub fn time_place_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.place_order_latency.time(f)
    }

    pub fn time_cancel_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.cancel_order_latency.time(f)
    }

    // Counter methods
    pub fn increment_orders_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
        counter!("matchbook_orders_total", "outcome" => "placed").increment(1);
    }

    pub fn increment_orders_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
        counter!("matchbook_orders_total", "outcome" => "rejected").increment(1);
    }

    pub fn increment_orders_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        counter!("matchbook_orders_total", "outcome" => "cancelled").increment(1);
    }

    // Getters for current values
    pub fn get_orders_placed(&self) -> u64 {
        self.orders_placed.load(Ordering::Relaxed)
    }

    pub fn get_orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    pub fn get_orders_cancelled(&self) -> u64 {
        self.orders_cancelled.load(Ordering::Relaxed)
    }

    pub fn get_latency_stats(&self) -> LatencyStats {
        LatencyStats {
            place_order: self.place_order_latency.get_stats(),
            cancel_order: self.cancel_order_latency.get_stats(),
        }
    }

    /// Log a one-line session summary (used by the driver at exit).
    pub fn log_summary(&self) {
        let stats = self.get_latency_stats();
        info!(
            "Engine metrics - Orders: +{} !{} -{} | Latency (us): place={:.2} cancel={:.2}",
            self.get_orders_placed(),
            self.get_orders_rejected(),
            self.get_orders_cancelled(),
            stats.place_order.avg_micros(),
            stats.cancel_order.avg_micros()
        );
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency tracker for individual operations
#[derive(Debug)]
struct LatencyTracker {
    operation: &'static str,
    samples: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl LatencyTracker {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            samples: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
        }
    }

    fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record_latency(start.elapsed());
        result
    }

    fn record_latency(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;

        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);

        // Update min (with CAS loop)
        let mut current_min = self.min_nanos.load(Ordering::Relaxed);
        while nanos < current_min {
            match self.min_nanos.compare_exchange_weak(
                current_min,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(new_min) => current_min = new_min,
            }
        }

        // Update max (with CAS loop)
        let mut current_max = self.max_nanos.load(Ordering::Relaxed);
        while nanos > current_max {
            match self.max_nanos.compare_exchange_weak(
                current_max,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(new_max) => current_max = new_max,
            }
        }

        histogram!(
            "matchbook_operation_duration_seconds",
            "operation" => self.operation
        )
        .record(duration.as_secs_f64());
    }

    fn get_stats(&self) -> OperationLatencyStats {
        let samples = self.samples.load(Ordering::Relaxed);
        let total = self.total_nanos.load(Ordering::Relaxed);
        let min = self.min_nanos.load(Ordering::Relaxed);
        let max = self.max_nanos.load(Ordering::Relaxed);

        OperationLatencyStats {
            operation: self.operation,
            samples,
            avg_nanos: if samples > 0 { total / samples } else { 0 },
            min_nanos: if min == u64::MAX { 0 } else { min },
            max_nanos: max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub place_order: OperationLatencyStats,
    pub cancel_order: OperationLatencyStats,
}

#[derive(Debug, Clone)]
pub struct OperationLatencyStats {
    pub operation: &'static str,
    pub samples: u64,
    pub avg_nanos: u64,
    pub min_nanos: u64,
    pub max_nanos: u64,
}

impl OperationLatencyStats {
    pub fn avg_micros(&self) -> f64 {
        self.avg_nanos as f64 / 1_000.0
    }

    pub fn min_micros(&self) -> f64 {
        self.min_nanos as f64 / 1_000.0
    }

    pub fn max_micros(&self) -> f64 {
        self.max_nanos as f64 / 1_000.0
    }
}
