use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Calls made to the text-generation service
    leaf_calls: AtomicUsize,

    /// Calls that returned an error
    leaf_failures: AtomicUsize,

    /// Requested handles whose origin value was missing or of the wrong shape
    skipped_values: AtomicUsize,

    /// Null or non-string scalars returned without a service call
    passthrough_values: AtomicUsize,

    /// Set elements whose `type` matched no declared set
    unresolved_variants: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_leaf_call(&self) {
        self.leaf_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaf_failure(&self) {
        self.leaf_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_value(&self) {
        self.skipped_values.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_passthrough(&self) {
        self.passthrough_values.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unresolved_variant(&self) {
        self.unresolved_variants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn leaf_calls(&self) -> usize {
        self.leaf_calls.load(Ordering::Relaxed)
    }

    pub fn leaf_failures(&self) -> usize {
        self.leaf_failures.load(Ordering::Relaxed)
    }

    pub fn skipped_values(&self) -> usize {
        self.skipped_values.load(Ordering::Relaxed)
    }

    pub fn passthrough_values(&self) -> usize {
        self.passthrough_values.load(Ordering::Relaxed)
    }

    pub fn unresolved_variants(&self) -> usize {
        self.unresolved_variants.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.leaf_calls();
        let failures = self.leaf_failures();
        let success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            leaf_calls: calls,
            leaf_failures: failures,
            success_rate,
            skipped_values: self.skipped_values(),
            passthrough_values: self.passthrough_values(),
            unresolved_variants: self.unresolved_variants(),
        }
    }
}

/// Snapshot of a run's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub leaf_calls: usize,
    pub leaf_failures: usize,

    /// Successful calls as a percentage (0-100)
    pub success_rate: f64,

    pub skipped_values: usize,
    pub passthrough_values: usize,
    pub unresolved_variants: usize,
}
