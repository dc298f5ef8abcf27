//! # Product Source Module
//!
//! Barcode lookup against an external product database. The service only
//! depends on the [`ProductSource`] trait; [`OpenFoodFactsClient`] is the
//! production implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ProductApiConfig, RecoveryConfig};
use crate::errors::LookupError;

/// Raw product data as the provider knows it, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    pub name: Option<String>,
    pub image: Option<String>,
    /// Unprocessed ingredient label text
    pub ingredients_text: Option<String>,
    /// Provider allergen tags, e.g. `en:milk`
    pub allergens: Vec<String>,
}

/// Source of product data keyed by barcode
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the product for an already-validated barcode.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the provider has no such product
    /// - `Upstream` / `Decode` / `CircuitOpen` when the provider misbehaves
    async fn fetch_product(&self, barcode: &str) -> Result<Product, LookupError>;
}

#[derive(Debug, Deserialize)]
struct OffResponse {
    #[serde(default)]
    status: i64,
    product: Option<OffProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct OffProduct {
    product_name: Option<String>,
    image_front_url: Option<String>,
    image_url: Option<String>,
    ingredients_text_en: Option<String>,
    ingredients_text: Option<String>,
    #[serde(default)]
    allergens_tags: Vec<String>,
}

/// Open Food Facts v2 API client
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
    breaker: CircuitBreaker,
}

impl OpenFoodFactsClient {
    pub fn new(config: &ProductApiConfig, recovery: RecoveryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("safe_bite/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(base_url = %config.base_url, "Open Food Facts client ready");
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            breaker: CircuitBreaker::new("open-food-facts", recovery),
        })
    }

    fn product_url(&self, barcode: &str) -> String {
        format!("{}/api/v2/product/{}.json", self.base_url, barcode)
    }

    async fn fetch_once(&self, barcode: &str) -> Result<Product, LookupError> {
        let response = self
            .client
            .get(self.product_url(barcode))
            .query(&[("lc", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(barcode.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Upstream(format!(
                "Open Food Facts answered {status}"
            )));
        }

        let body = response.text().await?;
        parse_product_response(barcode, &body)
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsClient {
    async fn fetch_product(&self, barcode: &str) -> Result<Product, LookupError> {
        debug!(barcode = %barcode, "Fetching product from Open Food Facts");
        self.breaker.call(|| self.fetch_once(barcode)).await
    }
}

/// Decode an Open Food Facts product body
///
/// `status != 1` means the product is unknown. English ingredient text is
/// preferred over the generic field; blank strings count as missing.
pub fn parse_product_response(barcode: &str, body: &str) -> Result<Product, LookupError> {
    let response: OffResponse = serde_json::from_str(body)?;
    let product = match response.product {
        Some(product) if response.status == 1 => product,
        _ => return Err(LookupError::NotFound(barcode.to_string())),
    };

    Ok(Product {
        name: non_blank(product.product_name),
        image: non_blank(product.image_front_url).or_else(|| non_blank(product.image_url)),
        ingredients_text: non_blank(product.ingredients_text_en)
            .or_else(|| non_blank(product.ingredients_text)),
        allergens: product.allergens_tags,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
