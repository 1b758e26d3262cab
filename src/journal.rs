use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::JournalConfig;
use crate::sourcing::types::ComparisonResult;

/// Comparison Journal - one line per completed comparison
///
/// Answers "what did the suppliers look like when we last priced this
/// product?" without re-querying anyone.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub product_title: String,
    pub selling_price: f64,
    pub rows: usize,
    pub skipped: usize,
    pub highest_margin: Option<String>,
    pub best_value: Option<String>,
    pub latency_us: u64,
}

pub struct Journal {
    config: JournalConfig,
    entries: RwLock<Vec<JournalEntry>>,
    total_recorded: AtomicU64,
}

impl Journal {
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            config: config.clone(),
            entries: RwLock::new(Vec::new()),
            total_recorded: AtomicU64::new(0),
        }
    }

    /// Record a finished comparison
    pub fn record_comparison(&self, result: &ComparisonResult, latency: Duration) {
        if !self.config.enabled {
            return;
        }

        let entry = JournalEntry {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            product_title: result.product_title.clone(),
            selling_price: result.selling_price,
            rows: result.rows.len(),
            skipped: result.skipped.len(),
            highest_margin: result.highest_margin.clone(),
            best_value: result.best_value.clone(),
            latency_us: latency.as_micros() as u64,
        };

        let mut entries = self.entries.write();
        entries.push(entry);
        self.total_recorded.fetch_add(1, Ordering::Relaxed);

        // Rotation: keep within max_entries
        if entries.len() > self.config.max_entries {
            let drain_count = entries.len() - self.config.max_entries;
            entries.drain(..drain_count);
            debug!("Journal rotated {} entries", drain_count);
        }
    }

    /// Most recent first, optionally filtered by a case-insensitive title substring
    pub fn search(&self, title: Option<&str>, limit: usize) -> Vec<JournalEntry> {
        let needle = title.map(|t| t.to_lowercase());
        let entries = self.entries.read();
        entries
            .iter()
            .rev()
            .filter(|e| match &needle {
                Some(n) => e.product_title.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let entries = self.entries.read();
        serde_json::json!({
            "enabled": self.config.enabled,
            "current_entries": entries.len(),
            "max_entries": self.config.max_entries,
            "total_recorded": self.total_recorded.load(Ordering::Relaxed),
        })
    }
}
