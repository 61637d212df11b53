use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use steelopt_core::{Catalog, PlanError, Planner, ProcessRequest, ProcessResult};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Steel Optimiser API");

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/process", post(process))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    info!("API server listening on http://0.0.0.0:3000");
    info!("Try: curl http://localhost:3000/api/health");

    axum::serve(listener, app).await.expect("Server error");
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "steelopt-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Main BOM processing endpoint
async fn process(Json(request): Json<ProcessRequest>) -> Result<Json<ProcessResult>, AppError> {
    info!(
        "Received processing request with {} rows, multiplier {}",
        request.rows.len(),
        request.multiplier
    );

    let planner = Planner::new(request, Catalog::builtin())?;
    let result = planner.plan();

    info!(
        "Processing complete: {} buy lines, {} check lines, {} warnings, {} bars to buy",
        result.buy.len(),
        result.check.len(),
        result.warnings.len(),
        result.summary.bars_to_buy
    );

    Ok(Json(result))
}

/// Application error type
struct AppError(anyhow::Error);

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        let status = if self.0.downcast_ref::<PlanError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
