mod app;
mod config;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::external::accounting_api::AccountingApiClient;
use crate::logging::{init_logging, LoggingConfig};
use crate::services::report_cache::{ReportCache, SystemClock};
use crate::services::unified_report_service::UnifiedReportService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let logging = LoggingConfig::from_env().context("invalid logging configuration")?;
    init_logging(&logging).context("failed to init logging")?;

    let config = AppConfig::from_env().map_err(|e| anyhow!(e))?;

    let client = Arc::new(AccountingApiClient::new(&config.accounting_api)?);
    tracing::info!("📒 Accounting backend: {}", config.accounting_api.base_url);

    let reports = UnifiedReportService::new(
        client.clone(),
        client.clone(),
        client,
        ReportCache::new(Arc::new(SystemClock)),
        &config.reports,
    );

    let state = AppState {
        reports: Arc::new(reports),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Unified reports service running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
