use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Report identifier as understood by the accounting backend.
///
/// The four journal-capable statements plus the general ledger are named
/// variants; any other tag is passed through to the backend untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportType {
    ProfitLoss,
    BalanceSheet,
    CashFlow,
    TrialBalance,
    GeneralLedger,
    Other(String),
}

impl ReportType {
    pub fn as_str(&self) -> &str {
        match self {
            ReportType::ProfitLoss => "profit-loss",
            ReportType::BalanceSheet => "balance-sheet",
            ReportType::CashFlow => "cash-flow",
            ReportType::TrialBalance => "trial-balance",
            ReportType::GeneralLedger => "general-ledger",
            ReportType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for ReportType {
    fn from(value: &str) -> Self {
        match value {
            "profit-loss" => ReportType::ProfitLoss,
            "balance-sheet" => ReportType::BalanceSheet,
            "cash-flow" => ReportType::CashFlow,
            "trial-balance" => ReportType::TrialBalance,
            "general-ledger" => ReportType::GeneralLedger,
            other => ReportType::Other(other.to_string()),
        }
    }
}

impl From<String> for ReportType {
    fn from(value: String) -> Self {
        ReportType::from(value.as_str())
    }
}

impl From<ReportType> for String {
    fn from(value: ReportType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Summary,
    Pdf,
    Csv,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Summary => "summary",
            ReportFormat::Pdf => "pdf",
            ReportFormat::Csv => "csv",
        }
    }
}

/// How much checking is applied to a generated report.
///
/// Each level includes the checks of the level before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    #[default]
    Basic,
    Strict,
    Comprehensive,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Basic => "basic",
            ValidationLevel::Strict => "strict",
            ValidationLevel::Comprehensive => "comprehensive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Journal,
    Backend,
    Hybrid,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::Journal => "journal",
            ReportSource::Backend => "backend",
            ReportSource::Hybrid => "hybrid",
        }
    }

    /// The single source tried when this one produced a low-quality report.
    pub fn fallback(&self) -> ReportSource {
        match self {
            ReportSource::Journal => ReportSource::Backend,
            ReportSource::Backend | ReportSource::Hybrid => ReportSource::Journal,
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parameters and routing preferences for a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportOptions {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub as_of_date: Option<NaiveDate>,
    pub format: Option<ReportFormat>,
    #[serde(default)]
    pub prefer_journal_based: bool,
    pub validation_level: Option<ValidationLevel>,
    /// Cache lifetime in minutes
    pub cache_duration: Option<u32>,
    pub fallback_enabled: Option<bool>,
}

impl ReportOptions {
    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled.unwrap_or(true)
    }

    /// Query parameters forwarded to the accounting backend.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(as_of) = self.as_of_date {
            params.push(("as_of_date", as_of.format("%Y-%m-%d").to_string()));
        }
        params.push(("format", self.format.unwrap_or_default().as_str().to_string()));
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Pass,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// Result of one business-rule check against a generated report.
///
/// Findings only lower the quality score; they never fail a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub rule: String,
    pub status: FindingStatus,
    pub message: String,
    pub impact: Impact,
}

impl ValidationFinding {
    pub fn error(rule: &str, message: impl Into<String>, impact: Impact) -> Self {
        Self {
            rule: rule.to_string(),
            status: FindingStatus::Error,
            message: message.into(),
            impact,
        }
    }

    #[allow(dead_code)]
    pub fn warning(rule: &str, message: impl Into<String>, impact: Impact) -> Self {
        Self {
            rule: rule.to_string(),
            status: FindingStatus::Warning,
            message: message.into(),
            impact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFreshness {
    /// Computed from posted journal entries at request time
    RealTime,
    /// Aggregated by the backend's report engine
    Aggregated,
    Cached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub generation_time_ms: u64,
    pub data_freshness: DataFreshness,
    pub cache_hit: bool,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub report_id: Uuid,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub data_sources: Vec<ReportSource>,
    pub validation_results: Vec<ValidationFinding>,
    pub optimizations_applied: Vec<String>,
}

/// A generated report plus everything known about how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResult {
    pub data: serde_json::Value,
    pub source: ReportSource,
    pub quality_score: f64,
    pub recommendations: Vec<String>,
    pub performance: PerformanceMetrics,
    pub metadata: ReportMetadata,
}

/// Inputs that drove a strategy decision, kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFactors {
    pub data_volume: u64,
    pub date_range_days: i64,
    pub real_time_requirement: f64,
    pub complexity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub recommended_source: ReportSource,
    pub confidence: f64,
    pub reasoning: String,
    pub factors: StrategyFactors,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub average_quality: f64,
    pub by_source: HashMap<ReportSource, usize>,
    /// Lookups served from a live entry since startup
    pub hit_count: u64,
    /// Lookups that found nothing or an expired entry
    pub miss_count: u64,
    /// `hit_count / (hit_count + miss_count)`, 0 before the first lookup
    pub hit_rate: f64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}
