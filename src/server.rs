use axum::{
    extract::Query,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app::report_use_case::ReportUseCase;
use crate::config::parse_reference_date;
use crate::domain::Timestamp;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportUseCase>,
    /// Reference instant used when a request does not name one
    pub default_reference: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    /// `YYYY-MM-DD`
    pub reference_date: Option<String>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "saas-cleanup",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Generate a cleanup report
async fn analyze(
    Extension(state): Extension<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    let reference_time = match params.reference_date.as_deref() {
        Some(raw) => match parse_reference_date(raw) {
            Ok(ts) => ts,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => state.default_reference,
    };

    match state.reports.generate_report(reference_time).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Prometheus scrape endpoint
async fn metrics_endpoint() -> Response {
    match crate::observability::metrics::render() {
        Some(body) => body.into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Create the HTTP router with all routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", get(analyze))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{port}");
    info!("Report endpoint: http://localhost:{port}/api/analyze");

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
