use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::AccountingApiConfig;
use crate::errors::ProviderError;
use crate::external::report_provider::{
    BackendReportProvider, EnhancedProfitLossProvider, JournalIntegrationProvider,
};
use crate::models::{ReportOptions, ReportType};

/// HTTP client for the accounting backend's report endpoints.
///
/// One client serves both the aggregated report engine and the journal-based
/// (SSOT) endpoints, since both live on the same server.
pub struct AccountingApiClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl AccountingApiClient {
    pub fn new(config: &AccountingApiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    async fn get_report(&self, path: &str, options: &ReportOptions) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} ({:?})", url, options.query_params());

        let mut request = self.client.get(&url).query(&options.query_params());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::BadResponse(format!("{} from {}: {}", status, path, body)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        unwrap_envelope(body)
    }
}

/// Strips the backend's `{ status, message, data }` wrapper.
///
/// Bodies without a `data` field are returned whole.
fn unwrap_envelope(body: Value) -> Result<Value, ProviderError> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    if map.get("status").and_then(Value::as_str) == Some("error") {
        let message = map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("unknown backend error");
        return Err(ProviderError::BadResponse(message.to_string()));
    }

    match map.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(map)),
    }
}

#[async_trait]
impl BackendReportProvider for AccountingApiClient {
    async fn generate_report(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError> {
        self.get_report(&format!("/api/v1/reports/{}", report_type), options)
            .await
    }
}

#[async_trait]
impl EnhancedProfitLossProvider for AccountingApiClient {
    async fn generate_enhanced_pl_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError> {
        self.get_report("/api/v1/reports/ssot-profit-loss", options).await
    }
}

#[async_trait]
impl JournalIntegrationProvider for AccountingApiClient {
    async fn generate_balance_sheet_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError> {
        self.get_report("/api/v1/ssot-reports/balance-sheet", options).await
    }

    async fn generate_cash_flow_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError> {
        self.get_report("/api/v1/ssot-reports/cash-flow", options).await
    }

    async fn generate_trial_balance_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError> {
        self.get_report("/api/v1/ssot-reports/trial-balance", options).await
    }
}
