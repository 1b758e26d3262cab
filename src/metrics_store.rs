use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::config::Config;
use crate::sourcing::types::SupplierMetricBundle;

/// Source of the latest known metric bundle per supplier.
///
/// The bundle may be stale; callers always rescore it.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn latest(&self, supplier_id: &str) -> Option<SupplierMetricBundle>;
}

#[derive(Debug, Clone)]
struct StoredBundle {
    bundle: SupplierMetricBundle,
    updated_at: DateTime<Utc>,
}

/// In-memory metric bundles, seeded from config and refreshed by sync jobs
pub struct MetricsStore {
    entries: DashMap<String, StoredBundle>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let store = Self::new();
        for supplier in &config.suppliers {
            if let Some(bundle) = &supplier.metrics {
                store.upsert(&supplier.id, bundle.clone());
            }
        }
        store
    }

    /// Replace a supplier's bundle
    pub fn upsert(&self, supplier_id: &str, bundle: SupplierMetricBundle) {
        debug!("Metrics updated for {}", supplier_id);
        self.entries.insert(
            supplier_id.to_string(),
            StoredBundle {
                bundle,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn remove(&self, supplier_id: &str) -> bool {
        self.entries.remove(supplier_id).is_some()
    }

    pub fn contains(&self, supplier_id: &str) -> bool {
        self.entries.contains_key(supplier_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let mut suppliers: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "supplier_id": e.key(),
                    "updated_at": e.value().updated_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                })
            })
            .collect();
        suppliers.sort_by(|a, b| a["supplier_id"].as_str().cmp(&b["supplier_id"].as_str()));

        serde_json::json!({
            "bundles": self.len(),
            "suppliers": suppliers,
        })
    }
}

#[async_trait]
impl MetricsProvider for MetricsStore {
    async fn latest(&self, supplier_id: &str) -> Option<SupplierMetricBundle> {
        self.entries.get(supplier_id).map(|e| e.bundle.clone())
    }
}
