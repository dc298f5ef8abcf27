//! # Configuration Module
//!
//! This module defines configuration structures for the lookup service,
//! including provider endpoints, cache bounds and recovery settings.
//! Values come from the environment (optionally via a `.env` file) and fall
//! back to the defaults below.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

// Constants for service configuration
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_PRODUCT_API_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const DEFAULT_PRODUCT_LANGUAGE: &str = "en";
pub const DEFAULT_EXPLAIN_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_EXPLAIN_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60; // products change rarely
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Recovery configuration for calls to external providers
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 500,  // 0.5 seconds
            max_retry_delay_ms: 5000,  // 5 seconds
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Bounds for the result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Barcode lookup provider settings
#[derive(Debug, Clone)]
pub struct ProductApiConfig {
    pub base_url: String,
    /// Preferred label language (`lc` query parameter)
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for ProductApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PRODUCT_API_BASE_URL.to_string(),
            language: DEFAULT_PRODUCT_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Ingredient explanation provider settings
#[derive(Debug, Clone)]
pub struct ExplainApiConfig {
    pub url: String,
    /// Without a key, explanations are unavailable
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ExplainApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EXPLAIN_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_EXPLAIN_MODEL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub product_api: ProductApiConfig,
    pub explain_api: ExplainApiConfig,
    pub cache: CacheConfig,
    pub recovery: RecoveryConfig,
    /// JSON rule tables replacing the built-in ones
    pub rules_path: Option<PathBuf>,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            product_api: ProductApiConfig::default(),
            explain_api: ExplainApiConfig::default(),
            cache: CacheConfig::default(),
            recovery: RecoveryConfig::default(),
            rules_path: None,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and `.env`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();
        let timeout_secs = parse_var(&var, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        let api_key = var("EXPLAIN_API_KEY").or_else(|| var("GEMINI_API_KEY"));

        Ok(Self {
            port: parse_var(&var, "PORT", defaults.port)?,
            product_api: ProductApiConfig {
                base_url: var("PRODUCT_API_BASE_URL")
                    .unwrap_or(defaults.product_api.base_url)
                    .trim_end_matches('/')
                    .to_string(),
                language: var("PRODUCT_LANGUAGE").unwrap_or(defaults.product_api.language),
                timeout_secs,
            },
            explain_api: ExplainApiConfig {
                url: var("EXPLAIN_API_URL").unwrap_or(defaults.explain_api.url),
                api_key,
                model: var("EXPLAIN_MODEL").unwrap_or(defaults.explain_api.model),
                timeout_secs,
            },
            cache: CacheConfig {
                capacity: parse_var(&var, "CACHE_CAPACITY", defaults.cache.capacity)?,
                ttl_secs: parse_var(&var, "CACHE_TTL_SECS", defaults.cache.ttl_secs)?,
            },
            recovery: defaults.recovery,
            rules_path: var("RULES_PATH").map(PathBuf::from),
            json_logs: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
