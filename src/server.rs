//! HTTP surface: `/analyze`, the food knowledge endpoints and a liveness probe.

use crate::config::AnalysisConfig;
use crate::food::{FoodInfo, FoodKnowledgeBase};
use crate::schema::{AnalysisRequest, PeriodType};
use crate::{AnalysisResponse, RevenueAnalyzer};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Immutable state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<RevenueAnalyzer>,
    pub foods: Arc<FoodKnowledgeBase>,
}

impl AppState {
    pub fn new(analyzer: RevenueAnalyzer, foods: FoodKnowledgeBase) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            foods: Arc::new(foods),
        }
    }

    /// Validates `config` and loads the embedded food table.
    pub fn from_config(config: AnalysisConfig) -> crate::Result<Self> {
        Ok(Self::new(
            RevenueAnalyzer::new(config)?,
            FoodKnowledgeBase::load_embedded()?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    pub period_type: Option<PeriodType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub label: String,
    #[serde(flatten)]
    pub info: FoodInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResponse {
    pub label: String,
    pub display_name: String,
    pub caption: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(liveness))
        .route("/analyze", post(analyze))
        .route("/foods/:label", get(food))
        .route("/foods/:label/caption", get(caption))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn liveness(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "foods": state.foods.len(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    query: Result<Query<AnalyzeQuery>, QueryRejection>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Query(query) = query?;
    let Json(request) = body?;

    let analyzer = Arc::clone(&state.analyzer);
    let response =
        tokio::task::spawn_blocking(move || analyzer.analyze(&request, query.period_type))
            .await
            .map_err(|e| ApiError::Internal(format!("analysis task failed: {}", e)))?;

    Ok(Json(response))
}

async fn food(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<FoodRecord>, ApiError> {
    let canonical = state
        .foods
        .resolve(&label)
        .ok_or_else(|| ApiError::NotFound(format!("no food named '{}'", label)))?;
    let info = state
        .foods
        .lookup(canonical)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("no food named '{}'", label)))?;

    Ok(Json(FoodRecord {
        label: canonical.to_string(),
        info,
    }))
}

async fn caption(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let not_found = || ApiError::NotFound(format!("no food named '{}'", label));

    let canonical = state.foods.resolve(&label).ok_or_else(not_found)?;
    let info = state.foods.lookup(canonical).ok_or_else(not_found)?;
    let caption = state
        .foods
        .caption(canonical, &mut rand::thread_rng())
        .ok_or_else(not_found)?;

    Ok(Json(CaptionResponse {
        label: canonical.to_string(),
        display_name: info.display_name.clone(),
        caption,
    }))
}
