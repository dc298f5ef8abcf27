//! In-memory providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use safe_bite::config::CacheConfig;
use safe_bite::errors::LookupError;
use safe_bite::explainer::{Explanations, IngredientExplainer};
use safe_bite::product_source::{Product, ProductSource};
use safe_bite::rules::RuleSet;
use safe_bite::service::ProductLookupService;

pub const CHOCOLATE_BARCODE: &str = "3017620422003";
pub const SODA_BARCODE: &str = "5449000000996";
pub const BLANK_LABEL_BARCODE: &str = "4006381333931";
pub const BROKEN_BARCODE: &str = "1111111111111";

#[derive(Default)]
pub struct StubProductSource {
    products: HashMap<String, Product>,
    calls: AtomicUsize,
}

impl StubProductSource {
    pub fn with_catalog() -> Self {
        let mut products = HashMap::new();
        products.insert(
            CHOCOLATE_BARCODE.to_string(),
            Product {
                name: Some("Hazelnut Spread".to_string()),
                image: Some("https://images.example/spread.jpg".to_string()),
                ingredients_text: Some(
                    "Ingredients: Sugar, Palm Oil, Hazelnuts 13%, Skimmed Milk Powder 8.7%, \
                     Fat-Reduced Cocoa 7.4%, Emulsifier: Lecithins (Soya), Vanillin."
                        .to_string(),
                ),
                allergens: vec!["en:milk".to_string(), "en:nuts".to_string(), "en:soybeans".to_string()],
            },
        );
        products.insert(
            SODA_BARCODE.to_string(),
            Product {
                name: Some("Orange Soda".to_string()),
                image: None,
                ingredients_text: Some(
                    "Carbonated water, high fructose corn syrup, citric acid, sodium benzoate, \
                     natural flavors, Yellow 6"
                        .to_string(),
                ),
                allergens: vec![],
            },
        );
        products.insert(BLANK_LABEL_BARCODE.to_string(), Product::default());

        Self {
            products,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductSource for StubProductSource {
    async fn fetch_product(&self, barcode: &str) -> Result<Product, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if barcode == BROKEN_BARCODE {
            return Err(LookupError::Upstream("connection reset".to_string()));
        }
        self.products
            .get(barcode)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(barcode.to_string()))
    }
}

#[derive(Default)]
pub struct StubExplainer {
    calls: AtomicUsize,
}

impl StubExplainer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngredientExplainer for StubExplainer {
    async fn explain(&self, ingredients: &[String]) -> Result<Explanations, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Like the real model: self-explanatory ingredients are left out
        Ok(ingredients
            .iter()
            .filter(|name| !matches!(name.to_lowercase().as_str(), "water" | "sugar" | "salt"))
            .map(|name| (name.clone(), format!("{name} is a common food additive.")))
            .collect())
    }
}

pub struct Harness {
    pub service: ProductLookupService,
    pub source: Arc<StubProductSource>,
    pub explainer: Arc<StubExplainer>,
}

pub fn harness(with_explainer: bool) -> Harness {
    let source = Arc::new(StubProductSource::with_catalog());
    let explainer = Arc::new(StubExplainer::default());
    let service = ProductLookupService::new(
        RuleSet::builtin(),
        CacheConfig {
            capacity: 16,
            ttl_secs: 3600,
        },
        source.clone(),
        with_explainer.then(|| explainer.clone() as Arc<dyn IngredientExplainer>),
    );
    Harness {
        service,
        source,
        explainer,
    }
}
