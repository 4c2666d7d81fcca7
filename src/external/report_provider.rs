use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::{ReportOptions, ReportType};

/// Generic report engine of the accounting backend.
#[async_trait]
pub trait BackendReportProvider: Send + Sync {
    async fn generate_report(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError>;
}

/// Profit and loss computed directly from posted journal entries.
#[async_trait]
pub trait EnhancedProfitLossProvider: Send + Sync {
    async fn generate_enhanced_pl_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError>;
}

/// Journal-derived statements other than profit and loss.
#[async_trait]
pub trait JournalIntegrationProvider: Send + Sync {
    async fn generate_balance_sheet_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError>;

    async fn generate_cash_flow_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError>;

    async fn generate_trial_balance_from_journals(
        &self,
        options: &ReportOptions,
    ) -> Result<Value, ProviderError>;
}
