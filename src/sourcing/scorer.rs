use crate::sourcing::types::{Recommendation, ReliabilityResult, SupplierMetricBundle};

/// Reliability Scorer
///
/// Collapses the five raw supplier signals into one comparable score.
/// Every signal carries the same weight; a missing signal counts as zero
/// instead of shrinking the denominator.
pub struct ReliabilityScorer;

const SIGNAL_COUNT: f64 = 5.0;
const WEAK_BELOW: f64 = 0.50;
const STRONG_FROM: f64 = 0.85;

/// One sub-metric as the scorer sees it, after presence checks
struct Signal {
    label: &'static str,
    score: Option<f64>,
    weak: String,
    strong: String,
}

impl ReliabilityScorer {
    pub fn score(
        supplier_id: &str,
        supplier_name: &str,
        bundle: &SupplierMetricBundle,
    ) -> ReliabilityResult {
        let mut warnings = Vec::new();
        let mut strengths = Vec::new();
        let mut total = 0.0;

        for signal in signals(bundle) {
            let Some(score) = signal.score.filter(|s| s.is_finite()) else {
                warnings.push(format!("{} data unavailable", signal.label));
                continue;
            };

            let score = score.clamp(0.0, 1.0);
            total += score;

            if score < WEAK_BELOW {
                warnings.push(signal.weak);
            } else if score >= STRONG_FROM {
                strengths.push(signal.strong);
            }
        }

        let overall_score = total / SIGNAL_COUNT;

        ReliabilityResult {
            supplier_id: supplier_id.to_string(),
            supplier_name: supplier_name.to_string(),
            overall_score,
            recommendation: Recommendation::from_score(overall_score),
            warnings,
            strengths,
        }
    }

    /// Score a supplier with no bundle on record
    pub fn score_missing(supplier_id: &str, supplier_name: &str) -> ReliabilityResult {
        Self::score(supplier_id, supplier_name, &SupplierMetricBundle::default())
    }
}

/// Signals in fixed declaration order: delivery, quality, communication,
/// pricing, stock. Output ordering of warnings and strengths follows this.
fn signals(bundle: &SupplierMetricBundle) -> [Signal; 5] {
    let delivery = bundle.delivery_speed;
    let quality = bundle.product_quality;
    let comms = bundle.communication;
    let pricing = bundle.pricing;
    let stock = bundle.stock_accuracy;

    [
        Signal {
            label: "Delivery speed",
            score: delivery.and_then(|m| m.score),
            weak: format!(
                "Slow delivery (avg {} days)",
                delivery.map_or(0, |m| m.avg_days)
            ),
            strong: format!(
                "Fast delivery (avg {} days)",
                delivery.map_or(0, |m| m.avg_days)
            ),
        },
        Signal {
            label: "Product quality",
            score: quality.and_then(|m| m.score),
            weak: format!(
                "Product quality concerns ({:.1}% return rate)",
                quality.map_or(0.0, |m| m.return_rate * 100.0)
            ),
            strong: format!(
                "High product quality ({:.1}% return rate)",
                quality.map_or(0.0, |m| m.return_rate * 100.0)
            ),
        },
        Signal {
            label: "Communication",
            score: comms.and_then(|m| m.score),
            weak: format!(
                "Slow communication (avg {:.1}h response)",
                comms.map_or(0.0, |m| m.response_time_hours)
            ),
            strong: format!(
                "Responsive communication (avg {:.1}h response)",
                comms.map_or(0.0, |m| m.response_time_hours)
            ),
        },
        Signal {
            label: "Pricing",
            score: pricing.and_then(|m| m.score),
            weak: format!(
                "Uncompetitive pricing ({:.0}% competitiveness)",
                pricing.map_or(0.0, |m| m.competitiveness * 100.0)
            ),
            strong: format!(
                "Competitive pricing ({:.0}% competitiveness)",
                pricing.map_or(0.0, |m| m.competitiveness * 100.0)
            ),
        },
        Signal {
            label: "Stock accuracy",
            score: stock.and_then(|m| m.score),
            weak: format!(
                "Unreliable stock levels ({:.0}% accurate)",
                stock.map_or(0.0, |m| m.accuracy_rate * 100.0)
            ),
            strong: format!(
                "Accurate stock levels ({:.0}% accurate)",
                stock.map_or(0.0, |m| m.accuracy_rate * 100.0)
            ),
        },
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sourcing::types::*;

    pub(crate) fn uniform_bundle(score: f64) -> SupplierMetricBundle {
        bundle_with(score, score, score, score, score)
    }

    pub(crate) fn bundle_with(
        delivery: f64,
        quality: f64,
        comms: f64,
        pricing: f64,
        stock: f64,
    ) -> SupplierMetricBundle {
        SupplierMetricBundle {
            delivery_speed: Some(DeliverySpeed { score: Some(delivery), avg_days: 6 }),
            product_quality: Some(ProductQuality { score: Some(quality), return_rate: 0.03 }),
            communication: Some(Communication { score: Some(comms), response_time_hours: 4.0 }),
            pricing: Some(Pricing { score: Some(pricing), competitiveness: 0.7 }),
            stock_accuracy: Some(StockAccuracy { score: Some(stock), accuracy_rate: 0.95 }),
        }
    }

    #[test]
    fn test_overall_is_arithmetic_mean() {
        let bundle = bundle_with(0.9, 0.7, 0.55, 0.3, 0.62);
        let result = ReliabilityScorer::score("s1", "Supplier One", &bundle);
        let expected = (0.9 + 0.7 + 0.55 + 0.3 + 0.62) / 5.0;
        assert!((result.overall_score - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&result.overall_score));
        assert_eq!(result.supplier_id, "s1");
        assert_eq!(result.supplier_name, "Supplier One");
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(Recommendation::from_score(0.80), Recommendation::Excellent);
        assert_eq!(Recommendation::from_score(0.7999), Recommendation::Good);
        assert_eq!(Recommendation::from_score(0.60), Recommendation::Good);
        assert_eq!(Recommendation::from_score(0.40), Recommendation::Fair);
        assert_eq!(Recommendation::from_score(0.20), Recommendation::Caution);
        assert_eq!(Recommendation::from_score(0.1999), Recommendation::Avoid);
        assert_eq!(Recommendation::from_score(1.0), Recommendation::Excellent);
        assert_eq!(Recommendation::from_score(0.0), Recommendation::Avoid);
    }

    #[test]
    fn test_all_zero_bundle() {
        let result = ReliabilityScorer::score("s", "S", &uniform_bundle(0.0));
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Avoid);
        assert_eq!(result.warnings.len(), 5);
        assert!(result.strengths.is_empty());
    }

    #[test]
    fn test_half_scores_are_neither_weak_nor_strong() {
        let result = ReliabilityScorer::score("s", "S", &uniform_bundle(0.5));
        assert!(result.warnings.is_empty());
        assert!(result.strengths.is_empty());
        assert_eq!(result.recommendation, Recommendation::Fair);
    }

    #[test]
    fn test_one_weak_four_strong() {
        let bundle = bundle_with(0.3, 0.9, 0.9, 0.9, 0.9);
        let result = ReliabilityScorer::score("s", "S", &bundle);
        assert_eq!(result.warnings, vec!["Slow delivery (avg 6 days)".to_string()]);
        assert_eq!(result.strengths.len(), 4);
        assert!(result.strengths[0].starts_with("High product quality"));
        assert!(result.strengths[3].starts_with("Accurate stock levels"));
    }

    #[test]
    fn test_strength_boundary_is_inclusive() {
        let result = ReliabilityScorer::score("s", "S", &uniform_bundle(0.85));
        assert_eq!(result.strengths.len(), 5);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_warnings_follow_declaration_order() {
        // stock is the weakest, delivery the least weak; order must not follow magnitude
        let bundle = bundle_with(0.45, 0.9, 0.2, 0.9, 0.01);
        let result = ReliabilityScorer::score("s", "S", &bundle);
        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings[0].starts_with("Slow delivery"));
        assert!(result.warnings[1].starts_with("Slow communication"));
        assert!(result.warnings[2].starts_with("Unreliable stock"));
    }

    #[test]
    fn test_missing_sub_metric_counts_as_zero() {
        let mut bundle = uniform_bundle(1.0);
        bundle.pricing = None;
        let result = ReliabilityScorer::score("s", "S", &bundle);
        assert!((result.overall_score - 0.8).abs() < 1e-12);
        assert_eq!(result.warnings, vec!["Pricing data unavailable".to_string()]);
        assert_eq!(result.strengths.len(), 4);
    }

    #[test]
    fn test_non_finite_score_is_unavailable() {
        let mut bundle = uniform_bundle(0.6);
        bundle.communication = Some(Communication { score: Some(f64::NAN), response_time_hours: 1.0 });
        let result = ReliabilityScorer::score("s", "S", &bundle);
        assert_eq!(result.warnings, vec!["Communication data unavailable".to_string()]);
        assert!((result.overall_score - 0.48).abs() < 1e-12);
    }

    fn bundle_from_json(value: serde_json::Value) -> SupplierMetricBundle {
        serde_json::from_value(value).unwrap()
    }

    fn strong_json() -> serde_json::Value {
        serde_json::json!({
            "deliverySpeed": { "score": 0.9, "avgDays": 3 },
            "productQuality": { "score": 0.9, "returnRate": 0.01 },
            "communication": { "score": 0.9, "responseTimeHours": 2.0 },
            "pricing": { "score": 0.9, "competitiveness": 0.8 },
            "stockAccuracy": { "score": 0.9, "accuracyRate": 0.99 }
        })
    }

    #[test]
    fn test_string_score_is_unavailable() {
        let mut json = strong_json();
        json["communication"]["score"] = serde_json::json!("n/a");
        let result = ReliabilityScorer::score("s", "S", &bundle_from_json(json));
        assert_eq!(result.warnings, vec!["Communication data unavailable".to_string()]);
        assert_eq!(result.strengths.len(), 4);
        assert!((result.overall_score - 0.72).abs() < 1e-12);
    }

    #[test]
    fn test_null_or_absent_score_is_unavailable() {
        let mut json = strong_json();
        json["deliverySpeed"]["score"] = serde_json::Value::Null;
        json["stockAccuracy"] = serde_json::json!({ "accuracyRate": 0.99 });
        let result = ReliabilityScorer::score("s", "S", &bundle_from_json(json));
        assert_eq!(
            result.warnings,
            vec![
                "Delivery speed data unavailable".to_string(),
                "Stock accuracy data unavailable".to_string(),
            ]
        );
        assert!((result.overall_score - 0.54).abs() < 1e-12);
    }

    #[test]
    fn test_missing_detail_field_still_scores() {
        let mut json = strong_json();
        json["pricing"] = serde_json::json!({ "score": 0.9 });
        let result = ReliabilityScorer::score("s", "S", &bundle_from_json(json));
        assert!(result.warnings.is_empty());
        assert_eq!(result.strengths.len(), 5);
        assert_eq!(result.strengths[3], "Competitive pricing (0% competitiveness)");
        assert_eq!(result.recommendation, Recommendation::Excellent);
    }

    #[test]
    fn test_integer_score_is_accepted() {
        let mut json = strong_json();
        json["pricing"]["score"] = serde_json::json!(1);
        let bundle = bundle_from_json(json);
        assert_eq!(bundle.pricing.unwrap().score, Some(1.0));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let bundle = bundle_with(1.7, -0.4, 1.0, 1.0, 1.0);
        let result = ReliabilityScorer::score("s", "S", &bundle);
        assert!((result.overall_score - 0.8).abs() < 1e-12);
        assert!(result.warnings[0].starts_with("Product quality concerns"));
    }

    #[test]
    fn test_missing_bundle_scores_zero_with_five_warnings() {
        let result = ReliabilityScorer::score_missing("ghost", "Ghost Supplier");
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Avoid);
        assert_eq!(result.warnings.len(), 5);
        assert!(result.warnings.iter().all(|w| w.ends_with("data unavailable")));
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let bundle = bundle_with(0.81, 0.33, 0.67, 0.92, 0.5);
        let a = ReliabilityScorer::score("s", "S", &bundle);
        let b = ReliabilityScorer::score("s", "S", &bundle);
        assert_eq!(a, b);
        assert_eq!(a.overall_score.to_bits(), b.overall_score.to_bits());
    }
}
