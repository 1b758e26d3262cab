use serde::{Deserialize, Serialize};

/// A sub-metric score as a sync job reports it: a number, or something
/// unusable (`null`, "n/a", ...) that the scorer treats as unavailable.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Unusable(serde::de::IgnoredAny),
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match RawScore::deserialize(deserializer)? {
        RawScore::Number(n) => Some(n),
        RawScore::Unusable(_) => None,
    })
}

/// Delivery speed signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySpeed {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub avg_days: u32,
}

/// Product quality signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuality {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub return_rate: f64,
}

/// Communication signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub response_time_hours: f64,
}

/// Pricing signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub competitiveness: f64,
}

/// Stock accuracy signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAccuracy {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub accuracy_rate: f64,
}

/// Raw operational signals for one supplier.
///
/// Each sub-metric is optional: a sync job may not have produced every
/// signal yet. The scorer treats an absent sub-metric, or one whose score
/// is not a number, as a zero score and reports it as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierMetricBundle {
    #[serde(default)]
    pub delivery_speed: Option<DeliverySpeed>,
    #[serde(default)]
    pub product_quality: Option<ProductQuality>,
    #[serde(default)]
    pub communication: Option<Communication>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub stock_accuracy: Option<StockAccuracy>,
}

/// Recommendation tier derived from the overall reliability score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Excellent,
    Good,
    Fair,
    Caution,
    Avoid,
}

impl Recommendation {
    pub const ALL: [Recommendation; 5] = [
        Recommendation::Excellent,
        Recommendation::Good,
        Recommendation::Fair,
        Recommendation::Caution,
        Recommendation::Avoid,
    ];

    /// Bucket a score, highest tier first. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.80 => Recommendation::Excellent,
            s if s >= 0.60 => Recommendation::Good,
            s if s >= 0.40 => Recommendation::Fair,
            s if s >= 0.20 => Recommendation::Caution,
            _ => Recommendation::Avoid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "excellent",
            Recommendation::Good => "good",
            Recommendation::Fair => "fair",
            Recommendation::Caution => "caution",
            Recommendation::Avoid => "avoid",
        }
    }
}

/// Scored view of one supplier. Recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityResult {
    pub supplier_id: String,
    pub supplier_name: String,
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<String>,
    pub strengths: Vec<String>,
}

/// What a connector returns for a product query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOffer {
    pub price: f64,
    pub shipping_cost: f64,
    pub shipping_time: String,
    pub stock: u32,
}

/// A supplier's offer for a specific product query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierQuote {
    pub supplier_id: String,
    pub supplier_name: String,
    pub price: f64,
    pub shipping_cost: f64,
    pub shipping_time: String,
    pub stock: u32,
}

impl SupplierQuote {
    pub fn from_offer(supplier_id: &str, supplier_name: &str, offer: QuoteOffer) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            supplier_name: supplier_name.to_string(),
            price: offer.price,
            shipping_cost: offer.shipping_cost,
            shipping_time: offer.shipping_time,
            stock: offer.stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    /// Index among quoted suppliers, in connector order
    pub position: usize,
    pub supplier_id: String,
    pub supplier_name: String,
    pub price: f64,
    pub shipping_cost: f64,
    pub shipping_time: String,
    /// Leading integer of `shipping_time`, or the configured fallback
    pub shipping_days: u32,
    pub stock: u32,
    pub total_cost: f64,
    pub margin: f64,
    pub margin_percent: f64,
    pub reliability_score: f64,
    pub reliability: ReliabilityResult,
}

/// A supplier left out of a comparison, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSupplier {
    pub supplier_id: String,
    pub supplier_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub suppliers_queried: usize,
    pub suppliers_quoted: usize,
    pub best_margin_percent: Option<f64>,
    pub fastest_shipping_days: Option<u32>,
    pub average_total_cost: Option<f64>,
}

/// Ranked comparison for one product query.
///
/// Badges hold supplier ids and are computed over the canonical row order,
/// so re-sorting `rows` for display never changes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub product_title: String,
    pub selling_price: f64,
    pub rows: Vec<ComparisonRow>,
    pub highest_margin: Option<String>,
    pub fastest_shipping: Option<String>,
    pub best_value: Option<String>,
    pub skipped: Vec<SkippedSupplier>,
    pub summary: ComparisonSummary,
}

/// Display orderings a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Margin,
    TotalCost,
    MarginPercent,
    ShippingTime,
    Reliability,
}

/// Filters for picking a fallback supplier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCriteria {
    #[serde(default)]
    pub min_reliability: Option<f64>,
    #[serde(default)]
    pub max_shipping_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSuggestion {
    pub candidates: Vec<ComparisonRow>,
    pub recommended: Option<String>,
}
