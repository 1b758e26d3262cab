use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::connector::{build_connectors, QuoteProvider};
use crate::error::{EngineError, EngineResult};
use crate::journal::Journal;
use crate::metrics::MetricsCounters;
use crate::metrics_store::{MetricsProvider, MetricsStore};
use crate::sourcing::comparator::{ComparatorSettings, SupplierComparator};
use crate::sourcing::scorer::ReliabilityScorer;
use crate::sourcing::types::{
    BackupCriteria, BackupSuggestion, ComparisonResult, ReliabilityResult, SortKey,
    SupplierMetricBundle,
};

/// Core sourcing engine - wires connectors, metrics and bookkeeping together
pub struct SourcingEngine {
    pub config: Arc<Config>,
    pub store: Arc<MetricsStore>,
    pub comparator: SupplierComparator,
    pub journal: Journal,
    pub counters: MetricsCounters,
}

impl SourcingEngine {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let connectors = build_connectors(&config)?;
        Ok(Self::with_connectors(config, connectors))
    }

    pub fn with_connectors(config: Arc<Config>, connectors: Vec<Arc<dyn QuoteProvider>>) -> Self {
        let store = Arc::new(MetricsStore::from_config(&config));
        let settings = ComparatorSettings {
            unknown_shipping_days: config.comparison.unknown_shipping_days,
        };
        let comparator = SupplierComparator::new(connectors, store.clone(), settings);
        let journal = Journal::new(&config.journal);

        info!(
            "Sourcing engine ready: {} suppliers, {} metric bundles",
            comparator.connectors().len(),
            store.len()
        );

        Self {
            config,
            store,
            comparator,
            journal,
            counters: MetricsCounters::new(),
        }
    }

    fn supplier_name(&self, supplier_id: &str) -> Option<&str> {
        self.comparator
            .connectors()
            .iter()
            .find(|c| c.supplier_id() == supplier_id)
            .map(|c| c.supplier_name())
    }

    /// Score a connected supplier from its latest bundle.
    /// Returns None for an unknown supplier id.
    pub async fn score_supplier(&self, supplier_id: &str) -> Option<ReliabilityResult> {
        let name = self.supplier_name(supplier_id)?.to_string();
        let result = match self.store.latest(supplier_id).await {
            Some(bundle) => ReliabilityScorer::score(supplier_id, &name, &bundle),
            None => ReliabilityScorer::score_missing(supplier_id, &name),
        };
        self.counters.record_score(result.recommendation);
        Some(result)
    }

    /// Score an ad-hoc bundle, e.g. one not yet stored
    pub fn score_bundle(
        &self,
        supplier_id: &str,
        supplier_name: &str,
        bundle: &SupplierMetricBundle,
    ) -> ReliabilityResult {
        let result = ReliabilityScorer::score(supplier_id, supplier_name, bundle);
        self.counters.record_score(result.recommendation);
        result
    }

    /// Store a fresh bundle for a connected supplier and return its new score
    pub async fn update_metrics(
        &self,
        supplier_id: &str,
        bundle: SupplierMetricBundle,
    ) -> Option<ReliabilityResult> {
        self.supplier_name(supplier_id)?;
        self.store.upsert(supplier_id, bundle);
        self.score_supplier(supplier_id).await
    }

    /// Forget a supplier's bundle; it scores as unavailable afterwards
    pub fn remove_metrics(&self, supplier_id: &str) -> bool {
        self.store.remove(supplier_id)
    }

    /// Run a comparison and sort rows for display
    pub async fn compare(
        &self,
        product_title: &str,
        selling_price: f64,
        sort: Option<SortKey>,
    ) -> EngineResult<ComparisonResult> {
        let start = Instant::now();
        let mut result = match self.comparator.compare(product_title, selling_price).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Comparison rejected: {}", e);
                self.counters.comparisons_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let queried = result.summary.suppliers_queried as u64;
        self.counters.comparisons_total.fetch_add(1, Ordering::Relaxed);
        self.counters.quotes_requested.fetch_add(queried, Ordering::Relaxed);
        self.counters.quotes_failed.fetch_add(result.skipped.len() as u64, Ordering::Relaxed);
        for row in &result.rows {
            self.counters.record_score(row.reliability.recommendation);
        }

        result.sort_by(sort.unwrap_or(self.config.comparison.default_sort));
        self.journal.record_comparison(&result, start.elapsed());
        Ok(result)
    }

    /// Compare, then pick alternatives to the supplier currently in use
    pub async fn find_backup(
        &self,
        product_title: &str,
        selling_price: f64,
        current_supplier_id: Option<&str>,
        criteria: &BackupCriteria,
    ) -> EngineResult<BackupSuggestion> {
        if let Some(min) = criteria.min_reliability {
            if !(0.0..=1.0).contains(&min) {
                return Err(EngineError::InvalidInput(format!(
                    "minReliability must be within 0.0 - 1.0, got {}",
                    min
                )));
            }
        }

        let result = self.compare(product_title, selling_price, None).await?;
        Ok(result.backup_candidates(
            current_supplier_id,
            criteria,
            self.config.comparison.backup_limit,
        ))
    }

    pub fn list_suppliers(&self) -> serde_json::Value {
        let suppliers: Vec<serde_json::Value> = self
            .config
            .suppliers
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "kind": match s.kind {
                        crate::config::SupplierKind::Catalog => "catalog",
                        crate::config::SupplierKind::Http => "http",
                    },
                    "has_metrics": self.store.contains(&s.id),
                })
            })
            .collect();
        serde_json::json!(suppliers)
    }

    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "suppliers": self.comparator.connectors().len(),
            "metrics": self.store.get_stats(),
            "journal": self.journal.get_stats(),
            "counters": self.counters.get_stats(),
            "chaos": self.config.chaos.enabled,
        })
    }
}
