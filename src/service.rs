//! # Product Lookup Service
//!
//! Orchestrates a barcode scan: validate the barcode, consult the result
//! cache, fetch from the product source on a miss, normalize the label and
//! evaluate it against the caller's profile. Also fronts the ingredient
//! explainer behind the same cache.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{barcode_key, explanation_key, CacheStats, ResultCache};
use crate::config::CacheConfig;
use crate::errors::LookupError;
use crate::explainer::{Explanations, IngredientExplainer};
use crate::normalizer::{normalize, IngredientTokens};
use crate::product_source::{Product, ProductSource};
use crate::rules::RuleSet;
use crate::verdict::{evaluate_tokens, ProductVerdict, ScanProfile};

pub const MAX_BARCODE_LEN: usize = 32;
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

/// A fetched product together with its normalized label
#[derive(Debug, Clone)]
pub struct CachedProduct {
    pub product: Product,
    pub tokens: IngredientTokens,
    pub fetched_at: DateTime<Utc>,
}

/// Values held in the shared result cache
#[derive(Debug, Clone)]
pub enum CachedEntry {
    Product(CachedProduct),
    Explanations(Explanations),
}

/// Everything the client needs to render a scan result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReport {
    pub barcode: String,
    pub name: String,
    pub image: Option<String>,
    /// Provider allergen tags, passed through untouched
    pub allergens: Vec<String>,
    #[serde(flatten)]
    pub verdict: ProductVerdict,
    pub fetched_at: DateTime<Utc>,
}

pub struct ProductLookupService {
    rules: Arc<RuleSet>,
    cache: ResultCache<CachedEntry>,
    source: Arc<dyn ProductSource>,
    explainer: Option<Arc<dyn IngredientExplainer>>,
}

impl ProductLookupService {
    pub fn new(
        rules: Arc<RuleSet>,
        cache_config: CacheConfig,
        source: Arc<dyn ProductSource>,
        explainer: Option<Arc<dyn IngredientExplainer>>,
    ) -> Self {
        info!(
            cache_capacity = cache_config.capacity,
            cache_ttl_secs = cache_config.ttl_secs,
            explanations = explainer.is_some(),
            "Product lookup service initialized"
        );
        Self {
            rules,
            cache: ResultCache::new(cache_config),
            source,
            explainer,
        }
    }

    pub fn explanations_enabled(&self) -> bool {
        self.explainer.is_some()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Look up a barcode and evaluate its label for `profile`
    pub async fn lookup(&self, barcode: &str, profile: &ScanProfile) -> Result<ProductReport, LookupError> {
        let barcode = validate_barcode(barcode)?;
        let cached = self.product(barcode).await?;
        let verdict = evaluate_tokens(cached.tokens, profile, &self.rules);

        Ok(ProductReport {
            barcode: barcode.to_string(),
            name: cached
                .product
                .name
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            image: cached.product.image,
            allergens: cached.product.allergens,
            verdict,
            fetched_at: cached.fetched_at,
        })
    }

    async fn product(&self, barcode: &str) -> Result<CachedProduct, LookupError> {
        let key = barcode_key(barcode);
        if let Some(CachedEntry::Product(cached)) = self.cache.get(&key) {
            debug!(barcode = %barcode, "Product served from cache");
            return Ok(cached);
        }

        let product = self.source.fetch_product(barcode).await.map_err(|e| {
            warn!(barcode = %barcode, error = %e, "Product fetch failed");
            e
        })?;

        let tokens = normalize(product.ingredients_text.as_deref().unwrap_or_default());
        info!(barcode = %barcode, tokens = tokens.len(), "Product fetched");

        let cached = CachedProduct {
            product,
            tokens,
            fetched_at: Utc::now(),
        };
        self.cache.set(key, CachedEntry::Product(cached.clone()));
        Ok(cached)
    }

    /// Explain ingredient names, answering from the cache when possible
    pub async fn explain(&self, ingredients: &[String]) -> Result<Explanations, LookupError> {
        let ingredients: Vec<String> = ingredients
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if ingredients.is_empty() {
            return Err(LookupError::InvalidRequest(
                "Please provide a non-empty ingredients array".to_string(),
            ));
        }

        let explainer = self.explainer.as_ref().ok_or_else(|| {
            LookupError::Configuration("EXPLAIN_API_KEY is not configured".to_string())
        })?;

        let key = explanation_key(&ingredients);
        if let Some(CachedEntry::Explanations(explanations)) = self.cache.get(&key) {
            debug!(count = ingredients.len(), "Explanations served from cache");
            return Ok(explanations);
        }

        let explanations = explainer.explain(&ingredients).await?;
        info!(
            requested = ingredients.len(),
            explained = explanations.len(),
            "Ingredient explanations received"
        );
        self.cache.set(key, CachedEntry::Explanations(explanations.clone()));
        Ok(explanations)
    }
}

/// Trim and check a barcode: 1 to 32 ASCII digits
pub fn validate_barcode(raw: &str) -> Result<&str, LookupError> {
    let barcode = raw.trim();
    if barcode.is_empty() || barcode.len() > MAX_BARCODE_LEN || !barcode.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::InvalidBarcode(format!(
            "'{barcode}' must be 1 to {MAX_BARCODE_LEN} digits"
        )));
    }
    Ok(barcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(" 3017620422003 "), Ok("3017620422003"));
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("12a4").is_err());
        assert!(validate_barcode("../etc").is_err());
        assert!(validate_barcode(&"1".repeat(33)).is_err());
        assert!(validate_barcode(&"1".repeat(32)).is_ok());
    }
}
