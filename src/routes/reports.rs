use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CacheStats, ReportOptions, ReportResult, ReportType};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profit-loss", get(get_profit_loss))
        .route("/balance-sheet", get(get_balance_sheet))
        .route("/cash-flow", get(get_cash_flow))
        .route("/trial-balance", get(get_trial_balance))
        .route("/generate/:report_type", get(generate_report))
        .route("/cache", delete(clear_cache))
        .route("/cache/stats", get(get_cache_stats))
        .route("/cache/:report_type", delete(clear_cache_for_type))
}

#[derive(Debug, Serialize)]
pub struct ClearedEntries {
    report_type: ReportType,
    removed: usize,
}

fn log_failure(report_type: &str, e: crate::errors::ReportError) -> AppError {
    error!("Failed to generate {} report: {}", report_type, e);
    AppError::from(e)
}

/// GET /api/reports/generate/:report_type
///
/// Example: GET /api/reports/generate/sales-summary?start_date=2025-01-01&end_date=2025-03-31
pub async fn generate_report(
    Path(report_type): Path<String>,
    Query(options): Query<ReportOptions>,
    State(state): State<AppState>,
) -> Result<Json<ReportResult>, AppError> {
    let report_type = report_type.trim();
    if report_type.is_empty() {
        return Err(AppError::Validation("report_type must not be empty".to_string()));
    }
    info!("GET /api/reports/generate/{} - {:?}", report_type, options);

    state
        .reports
        .generate_report(&ReportType::from(report_type), options)
        .await
        .map(Json)
        .map_err(|e| log_failure(report_type, e))
}

pub async fn get_profit_loss(
    Query(options): Query<ReportOptions>,
    State(state): State<AppState>,
) -> Result<Json<ReportResult>, AppError> {
    info!("GET /api/reports/profit-loss - {:?}", options);
    state
        .reports
        .generate_profit_loss(options)
        .await
        .map(Json)
        .map_err(|e| log_failure("profit-loss", e))
}

pub async fn get_balance_sheet(
    Query(options): Query<ReportOptions>,
    State(state): State<AppState>,
) -> Result<Json<ReportResult>, AppError> {
    info!("GET /api/reports/balance-sheet - {:?}", options);
    state
        .reports
        .generate_balance_sheet(options)
        .await
        .map(Json)
        .map_err(|e| log_failure("balance-sheet", e))
}

pub async fn get_cash_flow(
    Query(options): Query<ReportOptions>,
    State(state): State<AppState>,
) -> Result<Json<ReportResult>, AppError> {
    info!("GET /api/reports/cash-flow - {:?}", options);
    state
        .reports
        .generate_cash_flow(options)
        .await
        .map(Json)
        .map_err(|e| log_failure("cash-flow", e))
}

pub async fn get_trial_balance(
    Query(options): Query<ReportOptions>,
    State(state): State<AppState>,
) -> Result<Json<ReportResult>, AppError> {
    info!("GET /api/reports/trial-balance - {:?}", options);
    state
        .reports
        .generate_trial_balance(options)
        .await
        .map(Json)
        .map_err(|e| log_failure("trial-balance", e))
}

pub async fn get_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.reports.cache_stats())
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    info!("DELETE /api/reports/cache");
    state.reports.clear_cache();
    StatusCode::NO_CONTENT
}

pub async fn clear_cache_for_type(
    Path(report_type): Path<String>,
    State(state): State<AppState>,
) -> Json<ClearedEntries> {
    info!("DELETE /api/reports/cache/{}", report_type);
    let report_type = ReportType::from(report_type);
    let removed = state.reports.clear_cache_for(&report_type);
    Json(ClearedEntries { report_type, removed })
}
