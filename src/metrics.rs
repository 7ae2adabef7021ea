//! Router observability counters.
//!
//! Process-wide counters for locale resolution and URL building, usable to
//! verify cache behavior (reverse templates parsed at most once per routing
//! key) and to expose a health/stats endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global router metrics singleton.
pub struct RouterMetrics {
    /// Resolutions performed
    resolutions: AtomicUsize,

    /// Resolutions decided by `Accept-Language` negotiation
    header_detections: AtomicUsize,

    /// Resolutions that fell back to the configured default
    fallbacks: AtomicUsize,

    /// Reverse templates parsed (cache misses)
    reverse_parses: AtomicUsize,

    /// Reverse data served from the per-route cache
    reverse_cache_hits: AtomicUsize,

    /// URLs successfully built
    urls_built: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<RouterMetrics> = OnceLock::new();

impl RouterMetrics {
    /// Get the global router metrics instance.
    pub fn global() -> &'static RouterMetrics {
        METRICS.get_or_init(|| RouterMetrics {
            resolutions: AtomicUsize::new(0),
            header_detections: AtomicUsize::new(0),
            fallbacks: AtomicUsize::new(0),
            reverse_parses: AtomicUsize::new(0),
            reverse_cache_hits: AtomicUsize::new(0),
            urls_built: AtomicUsize::new(0),
        })
    }

    pub fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_header_detection(&self) {
        self.header_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reverse_parse(&self) {
        self.reverse_parses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reverse_cache_hit(&self) {
        self.reverse_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_url_built(&self) {
        self.urls_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn header_detections(&self) -> usize {
        self.header_detections.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn reverse_parses(&self) -> usize {
        self.reverse_parses.load(Ordering::Relaxed)
    }

    pub fn reverse_cache_hits(&self) -> usize {
        self.reverse_cache_hits.load(Ordering::Relaxed)
    }

    pub fn urls_built(&self) -> usize {
        self.urls_built.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let parses = self.reverse_parses();
        let hits = self.reverse_cache_hits();
        let total_lookups = parses + hits;
        let reverse_cache_hit_rate = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions: self.resolutions(),
            header_detections: self.header_detections(),
            fallbacks: self.fallbacks(),
            reverse_parses: parses,
            reverse_cache_hits: hits,
            reverse_cache_hit_rate,
            urls_built: self.urls_built(),
        }
    }
}

/// Snapshot of the router counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub resolutions: usize,
    pub header_detections: usize,
    pub fallbacks: usize,
    pub reverse_parses: usize,
    pub reverse_cache_hits: usize,

    /// Share of reverse-data lookups served from cache, as a percentage
    pub reverse_cache_hit_rate: f64,

    pub urls_built: usize,
}
