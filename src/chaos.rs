use std::sync::Arc;
use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::config::ChaosConfig;
use crate::connector::QuoteProvider;
use crate::error::QuoteError;
use crate::sourcing::types::QuoteOffer;

/// Chaos Connector - fault injection for quote requests
///
/// Wraps a real connector and fails a share of its quotes, so the
/// partial-failure path of a comparison can be exercised in staging.
/// Suppliers on the exclusion list are always passed through.
pub struct ChaosConnector {
    inner: Arc<dyn QuoteProvider>,
    config: ChaosConfig,
}

impl ChaosConnector {
    pub fn new(inner: Arc<dyn QuoteProvider>, config: &ChaosConfig) -> Self {
        Self {
            inner,
            config: config.clone(),
        }
    }

    /// Check if this quote should fail
    fn should_fail(&self) -> bool {
        if !self.config.enabled {
            return false;
        }

        let id = self.inner.supplier_id();
        if self.config.exclude_suppliers.iter().any(|s| s == id) {
            return false;
        }

        let roll: f64 = rand::thread_rng().gen();
        roll < self.config.failure_probability
    }
}

#[async_trait]
impl QuoteProvider for ChaosConnector {
    fn supplier_id(&self) -> &str {
        self.inner.supplier_id()
    }

    fn supplier_name(&self) -> &str {
        self.inner.supplier_name()
    }

    async fn quote(&self, product_title: &str) -> Result<QuoteOffer, QuoteError> {
        if self.should_fail() {
            info!("🎲 Chaos mode: failing quote from {} for '{}'", self.supplier_id(), product_title);
            return Err(QuoteError::Injected);
        }
        self.inner.quote(product_title).await
    }
}
