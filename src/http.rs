//! # HTTP Module
//!
//! axum routes in front of [`ProductLookupService`]:
//!
//! - `GET  /api/product/{barcode}?diet=vegan&allergies=milk,peanut`
//! - `GET  /api/product/{barcode}/summary` (spoken summary text)
//! - `POST /api/product/explain-ingredients` with `{"ingredients": [..]}`
//! - `GET  /health`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info_span, warn};

use crate::errors::LookupError;
use crate::explainer::Explanations;
use crate::service::{ProductLookupService, ProductReport};
use crate::speech::product_summary;
use crate::verdict::ScanProfile;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProductLookupService>,
}

impl AppState {
    pub fn new(service: ProductLookupService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
        let uri = request.uri().to_string();
        info_span!("http_request", method = ?request.method(), uri)
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/product/explain-ingredients", post(explain_ingredients))
        .route("/api/product/{barcode}", get(get_product))
        .route("/api/product/{barcode}/summary", get(get_product_summary))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error body: `{"message": "..."}`
#[derive(Debug)]
pub struct ApiError(LookupError);

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LookupError::InvalidBarcode(_) | LookupError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
            LookupError::Upstream(_) | LookupError::Decode(_) => StatusCode::BAD_GATEWAY,
            LookupError::Configuration(_) | LookupError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}

/// Query string of the product lookup
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub diet: Option<String>,
    /// Comma-separated allergy names
    pub allergies: Option<String>,
}

impl ProductQuery {
    pub fn into_profile(self) -> ScanProfile {
        let allergies = self
            .allergies
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        let diet = self.diet.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        ScanProfile::new(allergies, diet)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanations: Explanations,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub barcode: String,
    pub summary: String,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductReport>, ApiError> {
    let report = state.service.lookup(&barcode, &query.into_profile()).await?;
    Ok(Json(report))
}

async fn get_product_summary(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let report = state.service.lookup(&barcode, &query.into_profile()).await?;

    // Explanations enrich the summary but never block it
    let explanations = if state.service.explanations_enabled() && !report.verdict.ingredients.is_empty() {
        match state.service.explain(report.verdict.ingredients.as_slice()).await {
            Ok(explanations) => Some(explanations),
            Err(e) => {
                warn!(barcode = %report.barcode, error = %e, "Summary without explanations");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(SummaryResponse {
        summary: product_summary(&report.name, &report.verdict, explanations.as_ref()),
        barcode: report.barcode,
    }))
}

async fn explain_ingredients(
    State(state): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| LookupError::InvalidRequest(rejection.body_text()))?;
    let explanations = state.service.explain(&request.ingredients).await?;
    Ok(Json(ExplainResponse { explanations }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_profile() {
        let query = ProductQuery {
            diet: Some(" vegan ".to_string()),
            allergies: Some("milk, peanut,,".to_string()),
        };
        let profile = query.into_profile();
        assert_eq!(profile.diet.as_deref(), Some("vegan"));
        assert_eq!(profile.allergies, ["milk", "peanut"]);

        let empty = ProductQuery {
            diet: Some("".to_string()),
            allergies: None,
        };
        assert_eq!(empty.into_profile(), ScanProfile::default());
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |err: LookupError| ApiError::from(err).status();
        assert_eq!(status(LookupError::InvalidBarcode("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(LookupError::NotFound("1".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(LookupError::Decode("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(LookupError::CircuitOpen("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(LookupError::Configuration("x".into())), StatusCode::SERVICE_UNAVAILABLE);
    }
}
