//! Translation metrics and observability.
//!
//! Counters are owned by whoever builds the pipeline and shared through an
//! `Arc`, so tests can inspect a fresh set without touching process state.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Calls made to the translation provider (after retries, one per text)
    provider_calls: AtomicUsize,

    /// Provider calls that ended in an error
    provider_failures: AtomicUsize,

    /// Texts returned in their source language because no provider was usable
    source_fallbacks: AtomicUsize,

    /// Locale records written by backfill
    backfill_written: AtomicUsize,

    /// Locales skipped because a field could not be machine-translated
    backfill_untranslated: AtomicUsize,

    /// Locale records whose upsert failed
    backfill_persist_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source_fallback(&self) {
        self.source_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backfill_written(&self) {
        self.backfill_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backfill_untranslated(&self) {
        self.backfill_untranslated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backfill_persist_failure(&self) {
        self.backfill_persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn source_fallbacks(&self) -> usize {
        self.source_fallbacks.load(Ordering::Relaxed)
    }

    pub fn backfill_written(&self) -> usize {
        self.backfill_written.load(Ordering::Relaxed)
    }

    pub fn backfill_untranslated(&self) -> usize {
        self.backfill_untranslated.load(Ordering::Relaxed)
    }

    pub fn backfill_persist_failures(&self) -> usize {
        self.backfill_persist_failures.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            source_fallbacks: self.source_fallbacks(),
            backfill_written: self.backfill_written(),
            backfill_untranslated: self.backfill_untranslated(),
            backfill_persist_failures: self.backfill_persist_failures(),
        }
    }
}

/// Point-in-time translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub provider_calls: usize,
    pub provider_failures: usize,

    /// Percentage (0-100) of provider calls that succeeded
    pub provider_success_rate: f64,

    pub source_fallbacks: usize,
    pub backfill_written: usize,
    pub backfill_untranslated: usize,
    pub backfill_persist_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = TranslationMetrics::new();
        let report = metrics.report();
        assert_eq!(report.provider_calls, 0);
        assert_eq!(report.provider_failures, 0);
        assert_eq!(report.provider_success_rate, 0.0);
        assert_eq!(report.backfill_written, 0);
    }

    #[test]
    fn test_success_rate() {
        let metrics = TranslationMetrics::new();
        for _ in 0..4 {
            metrics.record_provider_call();
        }
        metrics.record_provider_failure();

        let report = metrics.report();
        assert_eq!(report.provider_calls, 4);
        assert_eq!(report.provider_failures, 1);
        assert_eq!(report.provider_success_rate, 75.0);
    }

    #[test]
    fn test_backfill_counters() {
        let metrics = TranslationMetrics::new();
        metrics.record_backfill_written();
        metrics.record_backfill_written();
        metrics.record_backfill_untranslated();
        metrics.record_backfill_persist_failure();
        metrics.record_source_fallback();

        assert_eq!(metrics.backfill_written(), 2);
        assert_eq!(metrics.backfill_untranslated(), 1);
        assert_eq!(metrics.backfill_persist_failures(), 1);
        assert_eq!(metrics.source_fallbacks(), 1);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = TranslationMetrics::new();
        let b = TranslationMetrics::new();
        a.record_provider_call();
        assert_eq!(a.provider_calls(), 1);
        assert_eq!(b.provider_calls(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_provider_call();
        let json = serde_json::to_string(&metrics.report()).unwrap();
        assert!(json.contains("\"provider_calls\":1"));
        assert!(json.contains("provider_success_rate"));
    }
}
