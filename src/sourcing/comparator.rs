use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::connector::{validate_offer, QuoteProvider};
use crate::error::{EngineError, EngineResult, QuoteError};
use crate::metrics_store::MetricsProvider;
use crate::sourcing::scorer::ReliabilityScorer;
use crate::sourcing::shipping::parse_shipping_days;
use crate::sourcing::types::{
    BackupCriteria, BackupSuggestion, ComparisonResult, ComparisonRow, ComparisonSummary,
    QuoteOffer, SkippedSupplier, SortKey, SupplierQuote,
};

#[derive(Debug, Clone)]
pub struct ComparatorSettings {
    pub unknown_shipping_days: u32,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        Self { unknown_shipping_days: 30 }
    }
}

/// Supplier Comparator
///
/// Fans a product query out to every connected supplier at once, waits for
/// all of them to settle, then scores and ranks the survivors. One supplier
/// failing only removes its row.
pub struct SupplierComparator {
    connectors: Vec<Arc<dyn QuoteProvider>>,
    metrics: Arc<dyn MetricsProvider>,
    settings: ComparatorSettings,
}

impl SupplierComparator {
    pub fn new(
        connectors: Vec<Arc<dyn QuoteProvider>>,
        metrics: Arc<dyn MetricsProvider>,
        settings: ComparatorSettings,
    ) -> Self {
        Self {
            connectors,
            metrics,
            settings,
        }
    }

    pub fn connectors(&self) -> &[Arc<dyn QuoteProvider>] {
        &self.connectors
    }

    /// Compare every supplier's offer for `product_title` at `selling_price`.
    ///
    /// Only malformed arguments fail the call, and they fail before any
    /// supplier is contacted. Dropping the returned future aborts the
    /// in-flight quote requests.
    pub async fn compare(
        &self,
        product_title: &str,
        selling_price: f64,
    ) -> EngineResult<ComparisonResult> {
        let product_title = product_title.trim();
        if product_title.is_empty() {
            return Err(EngineError::InvalidInput("product title is empty".to_string()));
        }
        if !selling_price.is_finite() || selling_price <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "selling price must be positive, got {}",
                selling_price
            )));
        }

        let outcomes = self.collect_quotes(product_title).await;

        let mut quotes = Vec::new();
        let mut skipped = Vec::new();
        for (connector, outcome) in self.connectors.iter().zip(outcomes) {
            let id = connector.supplier_id();
            let name = connector.supplier_name();
            // Rows only ever carry finite, non-negative costs
            match outcome.and_then(validate_offer) {
                Ok(offer) => quotes.push(SupplierQuote::from_offer(id, name, offer)),
                Err(e) => {
                    warn!("Supplier {} skipped for '{}': {}", id, product_title, e);
                    skipped.push(SkippedSupplier {
                        supplier_id: id.to_string(),
                        supplier_name: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut rows = Vec::with_capacity(quotes.len());
        for (position, quote) in quotes.into_iter().enumerate() {
            rows.push(self.build_row(position, quote, selling_price).await);
        }

        // Badges are taken over connector order, before any display sort
        let highest_margin = first_best(&rows, |r| r.margin, |a, b| a > b);
        let fastest_shipping = first_best(&rows, |r| r.shipping_days as f64, |a, b| a < b);
        let best_value = first_best(
            &rows,
            |r| r.margin_percent * r.reliability_score,
            |a, b| a > b,
        );
        let summary = summarize(self.connectors.len(), &rows);

        let mut result = ComparisonResult {
            product_title: product_title.to_string(),
            selling_price,
            rows,
            highest_margin,
            fastest_shipping,
            best_value,
            skipped,
            summary,
        };
        result.sort_by(SortKey::Margin);

        info!(
            "Compared '{}' at {:.2}: {} rows, {} skipped (best margin: {})",
            result.product_title,
            selling_price,
            result.rows.len(),
            result.skipped.len(),
            result.highest_margin.as_deref().unwrap_or("-"),
        );

        Ok(result)
    }

    /// Query all connectors concurrently and wait for every one to settle.
    /// Outcomes come back in connector order.
    async fn collect_quotes(&self, product_title: &str) -> Vec<Result<QuoteOffer, QuoteError>> {
        let mut tasks = JoinSet::new();
        for (index, connector) in self.connectors.iter().enumerate() {
            let connector = connector.clone();
            let title = product_title.to_string();
            tasks.spawn(async move { (index, connector.quote(&title).await) });
        }

        let mut slots: Vec<Option<Result<QuoteOffer, QuoteError>>> =
            (0..self.connectors.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    debug!("Quote settled for {}", self.connectors[index].supplier_id());
                    slots[index] = Some(outcome);
                }
                Err(e) => warn!("Quote task did not complete: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(QuoteError::Connector("quote task did not complete".to_string()))
                })
            })
            .collect()
    }

    async fn build_row(
        &self,
        position: usize,
        quote: SupplierQuote,
        selling_price: f64,
    ) -> ComparisonRow {
        let reliability = match self.metrics.latest(&quote.supplier_id).await {
            Some(bundle) => ReliabilityScorer::score(&quote.supplier_id, &quote.supplier_name, &bundle),
            None => {
                debug!("No metrics on record for {}", quote.supplier_id);
                ReliabilityScorer::score_missing(&quote.supplier_id, &quote.supplier_name)
            }
        };

        let total_cost = quote.price + quote.shipping_cost;
        let margin = selling_price - total_cost;
        let shipping_days = parse_shipping_days(&quote.shipping_time)
            .unwrap_or(self.settings.unknown_shipping_days);

        ComparisonRow {
            position,
            supplier_id: quote.supplier_id,
            supplier_name: quote.supplier_name,
            price: quote.price,
            shipping_cost: quote.shipping_cost,
            shipping_time: quote.shipping_time,
            shipping_days,
            stock: quote.stock,
            total_cost,
            margin,
            margin_percent: margin / selling_price * 100.0,
            reliability_score: reliability.overall_score,
            reliability,
        }
    }
}

/// Supplier id of the first row whose key beats every earlier one
fn first_best<K, B>(rows: &[ComparisonRow], key: K, better: B) -> Option<String>
where
    K: Fn(&ComparisonRow) -> f64,
    B: Fn(f64, f64) -> bool,
{
    let mut best: Option<(&ComparisonRow, f64)> = None;
    for row in rows {
        let value = key(row);
        if best.map_or(true, |(_, current)| better(value, current)) {
            best = Some((row, value));
        }
    }
    best.map(|(row, _)| row.supplier_id.clone())
}

fn summarize(queried: usize, rows: &[ComparisonRow]) -> ComparisonSummary {
    let best_margin_percent = rows
        .iter()
        .map(|r| r.margin_percent)
        .reduce(f64::max);
    let fastest_shipping_days = rows.iter().map(|r| r.shipping_days).min();
    let average_total_cost = if rows.is_empty() {
        None
    } else {
        Some(rows.iter().map(|r| r.total_cost).sum::<f64>() / rows.len() as f64)
    };

    ComparisonSummary {
        suppliers_queried: queried,
        suppliers_quoted: rows.len(),
        best_margin_percent,
        fastest_shipping_days,
        average_total_cost,
    }
}

/// Stable sort; equal keys keep their current relative order
pub fn sort_rows(rows: &mut [ComparisonRow], key: SortKey) {
    match key {
        SortKey::Margin => rows.sort_by(|a, b| b.margin.total_cmp(&a.margin)),
        SortKey::TotalCost => rows.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost)),
        SortKey::MarginPercent => {
            rows.sort_by(|a, b| b.margin_percent.total_cmp(&a.margin_percent))
        }
        SortKey::ShippingTime => rows.sort_by_key(|r| r.shipping_days),
        SortKey::Reliability => {
            rows.sort_by(|a, b| b.reliability_score.total_cmp(&a.reliability_score))
        }
    }
}

impl ComparisonResult {
    /// Reorder rows for display. Badges are left untouched.
    pub fn sort_by(&mut self, key: SortKey) {
        sort_rows(&mut self.rows, key);
    }

    /// Alternatives to `current_supplier_id`, most reliable first.
    ///
    /// Ties keep connector order. The first candidate is the recommended backup.
    pub fn backup_candidates(
        &self,
        current_supplier_id: Option<&str>,
        criteria: &BackupCriteria,
        limit: usize,
    ) -> BackupSuggestion {
        let mut candidates: Vec<ComparisonRow> = self
            .rows
            .iter()
            .filter(|r| Some(r.supplier_id.as_str()) != current_supplier_id)
            .filter(|r| criteria.min_reliability.map_or(true, |min| r.reliability_score >= min))
            .filter(|r| criteria.max_shipping_days.map_or(true, |max| r.shipping_days <= max))
            .cloned()
            .collect();

        candidates.sort_by_key(|r| r.position);
        sort_rows(&mut candidates, SortKey::Reliability);
        candidates.truncate(limit);

        BackupSuggestion {
            recommended: candidates.first().map(|r| r.supplier_id.clone()),
            candidates,
        }
    }
}
