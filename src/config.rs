use serde::Deserialize;
use std::collections::HashSet;

use crate::sourcing::types::{SortKey, SupplierMetricBundle};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub chaos: ChaosConfig,
    pub suppliers: Vec<SupplierConfig>,
}

/// The API is the only way in, so there is no switch to turn it off
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            address: default_web_address(),
            port: default_web_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComparisonConfig {
    /// Days assumed when a shipping estimate carries no number
    #[serde(default = "default_unknown_shipping_days")]
    pub unknown_shipping_days: u32,
    #[serde(default)]
    pub default_sort: SortKey,
    /// Max backup suppliers returned
    #[serde(default = "default_backup_limit")]
    pub backup_limit: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            unknown_shipping_days: default_unknown_shipping_days(),
            default_sort: SortKey::default(),
            backup_limit: default_backup_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Max journal entries before rotation
    #[serde(default = "default_journal_max")]
    pub max_entries: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_journal_max(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChaosConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Probability of failing a quote (0.0 - 1.0)
    #[serde(default = "default_chaos_probability")]
    pub failure_probability: f64,
    /// Supplier ids never failed by chaos mode
    #[serde(default)]
    pub exclude_suppliers: Vec<String>,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_probability: default_chaos_probability(),
            exclude_suppliers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SupplierKind {
    Catalog,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    pub id: String,
    pub name: String,
    pub kind: SupplierKind,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Base URL for http suppliers
    pub base_url: Option<String>,
    /// Static offers for catalog suppliers
    #[serde(default)]
    pub catalog: Vec<CatalogOffer>,
    /// Initial metrics, replaced later by sync updates
    pub metrics: Option<SupplierMetricBundle>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogOffer {
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub shipping_cost: f64,
    pub shipping_time: String,
    #[serde(default)]
    pub stock: u32,
}

// Default value functions
fn default_true() -> bool { true }
fn default_web_address() -> String { "0.0.0.0".to_string() }
fn default_web_port() -> u16 { 8088 }
fn default_unknown_shipping_days() -> u32 { 30 }
fn default_backup_limit() -> usize { 5 }
fn default_journal_max() -> usize { 10_000 }
fn default_chaos_probability() -> f64 { 0.05 }
fn default_timeout_ms() -> u64 { 3000 }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path, e))?;
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.suppliers.is_empty() {
            return Err(anyhow::anyhow!("At least one supplier is required"));
        }

        let mut seen = HashSet::new();
        for s in &self.suppliers {
            if s.id.trim().is_empty() {
                return Err(anyhow::anyhow!("Supplier '{}' has an empty id", s.name));
            }
            if !seen.insert(s.id.as_str()) {
                return Err(anyhow::anyhow!("Duplicate supplier id '{}'", s.id));
            }
            if s.kind == SupplierKind::Http && s.base_url.is_none() {
                return Err(anyhow::anyhow!("Http supplier '{}' needs a base_url", s.id));
            }
        }

        if !(0.0..=1.0).contains(&self.chaos.failure_probability) {
            return Err(anyhow::anyhow!(
                "chaos.failure_probability must be within 0.0 - 1.0, got {}",
                self.chaos.failure_probability
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[suppliers]]
        id = "bigbuy"
        name = "BigBuy"
        kind = "catalog"
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.web.address, "0.0.0.0");
        assert_eq!(config.web.port, 8088);
        assert_eq!(config.comparison.unknown_shipping_days, 30);
        assert_eq!(config.comparison.default_sort, SortKey::Margin);
        assert_eq!(config.comparison.backup_limit, 5);
        assert!(!config.chaos.enabled);
        assert_eq!(config.suppliers[0].timeout_ms, 3000);
        assert!(config.suppliers[0].metrics.is_none());
    }

    #[test]
    fn test_full_supplier_entry() {
        let config = Config::parse(
            r#"
            [comparison]
            default_sort = "reliability"

            [[suppliers]]
            id = "ali"
            name = "AliExpress"
            kind = "catalog"

            [[suppliers.catalog]]
            title = "Desk Lamp"
            price = 9.5
            shipping_cost = 1.5
            shipping_time = "10-15 days"
            stock = 40

            [suppliers.metrics.deliverySpeed]
            score = 0.4
            avgDays = 12

            [suppliers.metrics.pricing]
            score = 0.95
            competitiveness = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.comparison.default_sort, SortKey::Reliability);
        let supplier = &config.suppliers[0];
        assert_eq!(supplier.catalog.len(), 1);
        assert_eq!(supplier.catalog[0].stock, 40);
        let metrics = supplier.metrics.as_ref().unwrap();
        assert_eq!(metrics.delivery_speed.unwrap().avg_days, 12);
        assert!(metrics.communication.is_none());
    }

    #[test]
    fn test_web_section_has_no_off_switch() {
        let err = Config::parse(&format!("[web]\nenabled = false\n{}", MINIMAL)).unwrap_err();
        assert!(format!("{:#}", err).contains("enabled"));

        let config = Config::parse(&format!("[web]\nport = 9000\n{}", MINIMAL)).unwrap();
        assert_eq!(config.web.port, 9000);
    }

    #[test]
    fn test_unusable_metric_values_do_not_reject_config() {
        let config = Config::parse(
            r#"
            [[suppliers]]
            id = "ali"
            name = "AliExpress"
            kind = "catalog"

            [suppliers.metrics.communication]
            score = "pending"
            responseTimeHours = 30.0

            [suppliers.metrics.pricing]
            score = 0.7
            "#,
        )
        .unwrap();

        let metrics = config.suppliers[0].metrics.as_ref().unwrap();
        assert_eq!(metrics.communication.unwrap().score, None);
        assert_eq!(metrics.pricing.unwrap().score, Some(0.7));
        assert_eq!(metrics.pricing.unwrap().competitiveness, 0.0);
    }

    #[test]
    fn test_rejects_empty_supplier_list() {
        assert!(Config::parse("suppliers = []").is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let content = format!("{}{}", MINIMAL, MINIMAL);
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("Duplicate supplier id"));
    }

    #[test]
    fn test_http_supplier_requires_base_url() {
        let err = Config::parse(
            r#"
            [[suppliers]]
            id = "cj"
            name = "CJ"
            kind = "http"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_rejects_bad_chaos_probability() {
        let content = format!("[chaos]\nfailure_probability = 1.5\n{}", MINIMAL);
        assert!(Config::parse(&content).is_err());
    }
}
