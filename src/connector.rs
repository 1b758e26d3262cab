use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::chaos::ChaosConnector;
use crate::config::{CatalogOffer, Config, SupplierConfig, SupplierKind};
use crate::error::QuoteError;
use crate::sourcing::types::QuoteOffer;

/// A connected supplier that can quote a product.
///
/// Implementations bound their own latency; the comparator never applies a
/// timeout on top.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn supplier_id(&self) -> &str;
    fn supplier_name(&self) -> &str;
    async fn quote(&self, product_title: &str) -> Result<QuoteOffer, QuoteError>;
}

/// Reject offers that would produce nonsense rows
pub fn validate_offer(offer: QuoteOffer) -> Result<QuoteOffer, QuoteError> {
    if !offer.price.is_finite() || offer.price < 0.0 {
        return Err(QuoteError::InvalidQuote(format!("price {}", offer.price)));
    }
    if !offer.shipping_cost.is_finite() || offer.shipping_cost < 0.0 {
        return Err(QuoteError::InvalidQuote(format!(
            "shipping cost {}",
            offer.shipping_cost
        )));
    }
    Ok(offer)
}

/// Supplier backed by a static catalog from the config file
pub struct CatalogConnector {
    id: String,
    name: String,
    offers: Vec<CatalogOffer>,
}

impl CatalogConnector {
    pub fn new(id: &str, name: &str, offers: Vec<CatalogOffer>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            offers,
        }
    }
}

#[async_trait]
impl QuoteProvider for CatalogConnector {
    fn supplier_id(&self) -> &str {
        &self.id
    }

    fn supplier_name(&self) -> &str {
        &self.name
    }

    async fn quote(&self, product_title: &str) -> Result<QuoteOffer, QuoteError> {
        let wanted = product_title.trim().to_lowercase();
        let offer = self
            .offers
            .iter()
            .find(|o| o.title.trim().to_lowercase() == wanted)
            .ok_or(QuoteError::NotCarried)?;

        validate_offer(QuoteOffer {
            price: offer.price,
            shipping_cost: offer.shipping_cost,
            shipping_time: offer.shipping_time.clone(),
            stock: offer.stock,
        })
    }
}

/// Supplier reached over HTTP: `GET {base_url}/quote?title=...` returning a JSON offer
pub struct HttpConnector {
    id: String,
    name: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(id: &str, name: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, product_title: &str) -> Result<QuoteOffer, QuoteError> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("title", product_title)])
            .send()
            .await
            .map_err(|e| QuoteError::Connector(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::NotCarried);
        }
        if !response.status().is_success() {
            return Err(QuoteError::Connector(format!("HTTP {}", response.status())));
        }

        response
            .json::<QuoteOffer>()
            .await
            .map_err(|e| QuoteError::InvalidQuote(e.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for HttpConnector {
    fn supplier_id(&self) -> &str {
        &self.id
    }

    fn supplier_name(&self) -> &str {
        &self.name
    }

    async fn quote(&self, product_title: &str) -> Result<QuoteOffer, QuoteError> {
        let offer = tokio::time::timeout(self.timeout, self.fetch(product_title))
            .await
            .map_err(|_| QuoteError::Timeout(self.timeout.as_millis() as u64))??;
        debug!("{} quoted '{}' at {:.2}", self.id, product_title, offer.price);
        validate_offer(offer)
    }
}

fn build_connector(supplier: &SupplierConfig) -> anyhow::Result<Arc<dyn QuoteProvider>> {
    let connector: Arc<dyn QuoteProvider> = match supplier.kind {
        SupplierKind::Catalog => Arc::new(CatalogConnector::new(
            &supplier.id,
            &supplier.name,
            supplier.catalog.clone(),
        )),
        SupplierKind::Http => {
            let base_url = supplier
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Http supplier '{}' needs a base_url", supplier.id))?;
            Arc::new(HttpConnector::new(
                &supplier.id,
                &supplier.name,
                base_url,
                Duration::from_millis(supplier.timeout_ms),
            ))
        }
    };
    Ok(connector)
}

/// Build connectors in config order, wrapped by chaos mode when enabled
pub fn build_connectors(config: &Config) -> anyhow::Result<Vec<Arc<dyn QuoteProvider>>> {
    let mut connectors = Vec::with_capacity(config.suppliers.len());
    for supplier in &config.suppliers {
        let connector = build_connector(supplier)?;
        if config.chaos.enabled {
            connectors.push(Arc::new(ChaosConnector::new(connector, &config.chaos)) as Arc<dyn QuoteProvider>);
        } else {
            connectors.push(connector);
        }
    }

    info!("Connector set initialized with {} suppliers", connectors.len());
    Ok(connectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use std::collections::HashMap;

    fn lamp_offer() -> CatalogOffer {
        CatalogOffer {
            title: "Desk Lamp".to_string(),
            price: 9.5,
            shipping_cost: 1.5,
            shipping_time: "10-15 days".to_string(),
            stock: 40,
        }
    }

    #[tokio::test]
    async fn test_catalog_match_ignores_case_and_padding() {
        let connector = CatalogConnector::new("ali", "AliExpress", vec![lamp_offer()]);
        let offer = connector.quote("  desk LAMP ").await.unwrap();
        assert_eq!(offer.price, 9.5);
        assert_eq!(offer.stock, 40);
    }

    #[tokio::test]
    async fn test_catalog_not_carried() {
        let connector = CatalogConnector::new("ali", "AliExpress", vec![lamp_offer()]);
        assert_eq!(connector.quote("Phone Case").await, Err(QuoteError::NotCarried));
    }

    #[tokio::test]
    async fn test_catalog_rejects_negative_price() {
        let mut offer = lamp_offer();
        offer.price = -1.0;
        let connector = CatalogConnector::new("ali", "AliExpress", vec![offer]);
        assert!(matches!(
            connector.quote("Desk Lamp").await,
            Err(QuoteError::InvalidQuote(_))
        ));
    }

    #[test]
    fn test_validate_offer_rejects_nan_shipping() {
        let offer = QuoteOffer {
            price: 1.0,
            shipping_cost: f64::NAN,
            shipping_time: "3 days".to_string(),
            stock: 1,
        };
        assert!(validate_offer(offer).is_err());
    }

    async fn quote_handler(
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<QuoteOffer>, StatusCode> {
        match params.get("title").map(String::as_str) {
            Some("Desk Lamp") => Ok(Json(QuoteOffer {
                price: 8.0,
                shipping_cost: 2.0,
                shipping_time: "5-8 days".to_string(),
                stock: 12,
            })),
            Some("slow") => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(StatusCode::NOT_FOUND)
            }
            Some("broken") => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn spawn_supplier_api() -> String {
        let app = Router::new().route("/quote", get(quote_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_http_connector_outcomes() {
        let base = spawn_supplier_api().await;
        let connector = HttpConnector::new("cj", "CJ", &base, Duration::from_millis(200));

        let offer = connector.quote("Desk Lamp").await.unwrap();
        assert_eq!(offer.price, 8.0);
        assert_eq!(offer.shipping_time, "5-8 days");

        assert_eq!(connector.quote("Unknown").await, Err(QuoteError::NotCarried));
        assert!(matches!(
            connector.quote("broken").await,
            Err(QuoteError::Connector(_))
        ));
        assert_eq!(connector.quote("slow").await, Err(QuoteError::Timeout(200)));
    }

    #[test]
    fn test_build_connectors_keeps_config_order() {
        let config = Config::parse(
            r#"
            [[suppliers]]
            id = "b"
            name = "B"
            kind = "catalog"

            [[suppliers]]
            id = "a"
            name = "A"
            kind = "http"
            base_url = "http://127.0.0.1:9"
            "#,
        )
        .unwrap();
        let connectors = build_connectors(&config).unwrap();
        let ids: Vec<&str> = connectors.iter().map(|c| c.supplier_id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
