use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use safe_bite::config::AppConfig;
use safe_bite::explainer::{IngredientExplainer, OpenRouterExplainer};
use safe_bite::http::{router, AppState};
use safe_bite::product_source::OpenFoodFactsClient;
use safe_bite::rules::RuleSet;
use safe_bite::service::ProductLookupService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (.env first, then the process environment)
    let config = AppConfig::from_env()?;

    // Initialize logging
    init_tracing(config.json_logs);

    info!("Starting Safe Bite ingredient service");
    if config.explain_api.api_key.is_none() {
        warn!("EXPLAIN_API_KEY not set - ingredient explanations will be unavailable");
    }

    // Rule tables: a JSON file when configured, the built-in tables otherwise
    let rules = match &config.rules_path {
        Some(path) => {
            info!(path = %path.display(), "Loading rule tables");
            Arc::new(RuleSet::load(path)?)
        }
        None => RuleSet::builtin(),
    };

    // External providers
    let source = Arc::new(OpenFoodFactsClient::new(&config.product_api, config.recovery.clone())?);
    let explainer = OpenRouterExplainer::from_config(&config.explain_api, config.recovery.clone())?
        .map(|explainer| Arc::new(explainer) as Arc<dyn IngredientExplainer>);

    let service = ProductLookupService::new(rules, config.cache, source, explainer);
    let app = router(AppState::new(service));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(address = %address, "API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
