//! Prometheus-compatible metrics exporter for supplier-scope
//!
//! Endpoint: GET /metrics (on the web API port, default 8088)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::sourcing::engine::SourcingEngine;
use crate::sourcing::types::Recommendation;

/// Counters updated from comparison and scoring paths
pub struct MetricsCounters {
    /// Comparisons that produced a result
    pub comparisons_total: AtomicU64,
    /// Comparisons rejected as invalid input
    pub comparisons_rejected: AtomicU64,
    /// Quote requests sent to connectors
    pub quotes_requested: AtomicU64,
    /// Quote requests that ended in a skipped supplier
    pub quotes_failed: AtomicU64,
    /// Reliability results computed
    pub scores_total: AtomicU64,
    /// Reliability results per tier, indexed like Recommendation::ALL
    pub scores_by_tier: [AtomicU64; 5],
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            comparisons_total: AtomicU64::new(0),
            comparisons_rejected: AtomicU64::new(0),
            quotes_requested: AtomicU64::new(0),
            quotes_failed: AtomicU64::new(0),
            scores_total: AtomicU64::new(0),
            scores_by_tier: Default::default(),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_score(&self, recommendation: Recommendation) {
        self.scores_total.fetch_add(1, Ordering::Relaxed);
        let idx = Recommendation::ALL
            .iter()
            .position(|r| *r == recommendation)
            .unwrap_or(Recommendation::ALL.len() - 1);
        self.scores_by_tier[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let tiers: serde_json::Map<String, serde_json::Value> = Recommendation::ALL
            .iter()
            .zip(self.scores_by_tier.iter())
            .map(|(r, c)| (r.label().to_string(), c.load(Ordering::Relaxed).into()))
            .collect();

        serde_json::json!({
            "comparisons_total": self.comparisons_total.load(Ordering::Relaxed),
            "comparisons_rejected": self.comparisons_rejected.load(Ordering::Relaxed),
            "quotes_requested": self.quotes_requested.load(Ordering::Relaxed),
            "quotes_failed": self.quotes_failed.load(Ordering::Relaxed),
            "scores_total": self.scores_total.load(Ordering::Relaxed),
            "scores_by_tier": tiers,
            "uptime_secs": self.start_time.elapsed().as_secs(),
        })
    }
}

/// Render all metrics in Prometheus text exposition format
pub fn render_prometheus(engine: &SourcingEngine) -> String {
    let c = &engine.counters;
    let mut out = String::with_capacity(2048);

    write_help_type(&mut out, "supplier_scope_uptime_seconds", "Uptime of the service in seconds.", "gauge");
    writeln!(out, "supplier_scope_uptime_seconds {}", c.start_time.elapsed().as_secs()).ok();

    write_help_type(&mut out, "supplier_scope_comparisons_total", "Total comparisons completed.", "counter");
    writeln!(out, "supplier_scope_comparisons_total {}", c.comparisons_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "supplier_scope_comparisons_rejected_total", "Total comparisons rejected as invalid input.", "counter");
    writeln!(out, "supplier_scope_comparisons_rejected_total {}", c.comparisons_rejected.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "supplier_scope_quotes_requested_total", "Total quote requests sent to suppliers.", "counter");
    writeln!(out, "supplier_scope_quotes_requested_total {}", c.quotes_requested.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "supplier_scope_quotes_failed_total", "Total quote requests that skipped a supplier.", "counter");
    writeln!(out, "supplier_scope_quotes_failed_total {}", c.quotes_failed.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "supplier_scope_reliability_scores_total", "Reliability results computed, by recommendation tier.", "counter");
    for (tier, count) in Recommendation::ALL.iter().zip(c.scores_by_tier.iter()) {
        writeln!(
            out,
            "supplier_scope_reliability_scores_total{{tier=\"{}\"}} {}",
            tier.label(),
            count.load(Ordering::Relaxed)
        )
        .ok();
    }

    write_help_type(&mut out, "supplier_scope_suppliers_connected", "Number of connected suppliers.", "gauge");
    writeln!(out, "supplier_scope_suppliers_connected {}", engine.comparator.connectors().len()).ok();

    write_help_type(&mut out, "supplier_scope_metric_bundles", "Number of suppliers with a metric bundle on record.", "gauge");
    writeln!(out, "supplier_scope_metric_bundles {}", engine.store.len()).ok();

    write_help_type(&mut out, "supplier_scope_build_info", "supplier-scope build information.", "gauge");
    writeln!(out, "supplier_scope_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}
