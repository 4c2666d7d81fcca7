use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{ReportSource, ReportType};

/// Failure reported by one of the accounting backend collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unsupported report type for journal source: {0}")]
    UnsupportedReportType(ReportType),

    #[error("{source_name} source failed: {error}")]
    Provider {
        source_name: ReportSource,
        error: ProviderError,
    },

    #[error("All report sources failed for {report_type}: {reasons}")]
    AllSourcesFailed {
        report_type: ReportType,
        reasons: String,
    },
}

impl ReportError {
    pub fn provider(source_name: ReportSource, error: ProviderError) -> Self {
        ReportError::Provider { source_name, error }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Rate limited by accounting backend")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            }
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        match value {
            ReportError::UnsupportedReportType(report_type) => {
                AppError::Validation(format!("Unsupported report type: {}", report_type))
            }
            ReportError::Provider {
                error: ProviderError::RateLimited,
                ..
            } => AppError::RateLimited,
            other => AppError::External(other.to_string()),
        }
    }
}
