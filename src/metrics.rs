//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Send pipeline metrics
pub struct Metrics {
    registry: Registry,

    // Counters
    pub sends_total: IntCounter,
    pub sends_succeeded: IntCounter,
    /// Labelled by `SendError::category()`
    pub send_failures: IntCounterVec,
    pub lookup_tables_dropped: IntCounter,

    // Histograms
    pub simulated_compute_units: Histogram,
    pub send_latency_ms: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let sends_total =
            IntCounter::with_opts(Opts::new("sends_total", "Transactions handed to the pipeline"))?;

        let sends_succeeded = IntCounter::with_opts(Opts::new(
            "sends_succeeded",
            "Transactions submitted and, when requested, confirmed",
        ))?;

        let send_failures = IntCounterVec::new(
            Opts::new("send_failures", "Failed sends by error kind"),
            &["kind"],
        )?;

        let lookup_tables_dropped = IntCounter::with_opts(Opts::new(
            "lookup_tables_dropped",
            "Lookup tables omitted because they could not be resolved",
        ))?;

        let simulated_compute_units = Histogram::with_opts(
            HistogramOpts::new(
                "simulated_compute_units",
                "Compute units consumed by draft simulations",
            )
            .buckets(vec![
                10_000.0, 50_000.0, 100_000.0, 200_000.0, 400_000.0, 800_000.0, 1_400_000.0,
            ]),
        )?;

        let send_latency_ms = Histogram::with_opts(
            HistogramOpts::new("send_latency_ms", "End-to-end send latency in milliseconds")
                .buckets(vec![100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 15_000.0, 60_000.0]),
        )?;

        registry.register(Box::new(sends_total.clone()))?;
        registry.register(Box::new(sends_succeeded.clone()))?;
        registry.register(Box::new(send_failures.clone()))?;
        registry.register(Box::new(lookup_tables_dropped.clone()))?;
        registry.register(Box::new(simulated_compute_units.clone()))?;
        registry.register(Box::new(send_latency_ms.clone()))?;

        Ok(Self {
            registry,
            sends_total,
            sends_succeeded,
            send_failures,
            lookup_tables_dropped,
            simulated_compute_units,
            send_latency_ms,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_failure(&self, kind: &str) {
        self.send_failures.with_label_values(&[kind]).inc();
    }

    /// Prometheus text exposition of everything registered
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1_000.0
    }

    /// Record elapsed milliseconds into `histogram`
    pub fn observe_ms(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_ms());
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
