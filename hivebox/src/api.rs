//! HTTP surface of the service

use crate::error::{ErrorBody, TemperatureResult};
use crate::temperature::TemperatureAggregator;
use crate::version::VersionResponse;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<TemperatureAggregator>,
}

impl AppState {
    pub fn new(aggregator: TemperatureAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureResponse {
    pub temperature: f64,
}

/// Build the service router. Constructed once at startup and handed to the server.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(get_version))
        .route("/temperature", get(get_temperature))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse::current())
}

async fn get_temperature(
    State(state): State<AppState>,
) -> TemperatureResult<Json<TemperatureResponse>> {
    let temperature = state.aggregator.average_temperature().await?;
    tracing::info!("Average temperature: {}", temperature);
    Ok(Json(TemperatureResponse { temperature }))
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not Found")))
}
