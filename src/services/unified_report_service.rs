//! Unified financial report generation.
//!
//! Routes each request to journal-derived reports, backend-aggregated reports,
//! or both at once, then scores the outcome and caches it. Low-quality results
//! can be swapped for the other source; outright failures get one last
//! attempt through the emergency fallback (backend first, then journal).

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ReportServiceConfig;
use crate::errors::ReportError;
use crate::external::report_provider::{
    BackendReportProvider, EnhancedProfitLossProvider, JournalIntegrationProvider,
};
use crate::models::{
    CacheStats, DataFreshness, PerformanceMetrics, ReportMetadata, ReportOptions, ReportResult,
    ReportSource, ReportType, ValidationFinding, ValidationLevel,
};
use crate::services::report_cache::{CacheEntry, CachedReport, ReportCache};
use crate::services::report_validation::{
    quality_score, recommendations, ReportValidator, FALLBACK_QUALITY_THRESHOLD,
};
use crate::services::strategy::{decide_strategy, DataVolumeEstimator, FixedVolumeEstimator};

/// Score assigned to a report adopted through the low-quality fallback.
///
/// The fallback payload is not re-validated; this constant stands in for its
/// score.
pub const FALLBACK_QUALITY_SCORE: f64 = 0.7;

/// Score assigned to a report produced by the emergency fallback.
pub const EMERGENCY_QUALITY_SCORE: f64 = 0.5;

const EMERGENCY_ORDER: [ReportSource; 2] = [ReportSource::Backend, ReportSource::Journal];

pub struct UnifiedReportService {
    backend: Arc<dyn BackendReportProvider>,
    enhanced_pl: Arc<dyn EnhancedProfitLossProvider>,
    journal: Arc<dyn JournalIntegrationProvider>,
    cache: ReportCache,
    validator: ReportValidator,
    volume_estimator: Box<dyn DataVolumeEstimator>,
    default_cache_minutes: u32,
}

/// Outcome of the primary generation before it is wrapped into a result.
struct Generated {
    data: Value,
    source: ReportSource,
    quality_score: f64,
    findings: Vec<ValidationFinding>,
    data_sources: Vec<ReportSource>,
    optimizations: Vec<String>,
    fallback_used: bool,
}

impl UnifiedReportService {
    pub fn new(
        backend: Arc<dyn BackendReportProvider>,
        enhanced_pl: Arc<dyn EnhancedProfitLossProvider>,
        journal: Arc<dyn JournalIntegrationProvider>,
        cache: ReportCache,
        config: &ReportServiceConfig,
    ) -> Self {
        Self {
            backend,
            enhanced_pl,
            journal,
            cache,
            validator: ReportValidator::new(),
            volume_estimator: Box::new(FixedVolumeEstimator(config.data_volume_estimate)),
            default_cache_minutes: config.default_cache_minutes,
        }
    }

    #[allow(dead_code)]
    pub fn with_validator(mut self, validator: ReportValidator) -> Self {
        self.validator = validator;
        self
    }

    #[allow(dead_code)]
    pub fn with_volume_estimator(mut self, estimator: Box<dyn DataVolumeEstimator>) -> Self {
        self.volume_estimator = estimator;
        self
    }

    pub async fn generate_report(
        &self,
        report_type: &ReportType,
        options: ReportOptions,
    ) -> Result<ReportResult, ReportError> {
        let started = Instant::now();
        let cache_key = ReportCache::cache_key(report_type, &options);

        // Forced-journal requests always recompute but still refresh the cache.
        if !options.prefer_journal_based {
            if let Some(entry) = self.cache.get(&cache_key) {
                debug!("Cache hit for {}", cache_key);
                return Ok(self.cached_result(report_type, entry, started));
            }
        }

        match self.generate_fresh(report_type, &options).await {
            Ok(generated) => {
                let report = CachedReport {
                    report_type: report_type.clone(),
                    data: generated.data.clone(),
                    quality_score: generated.quality_score,
                    source: generated.source,
                    fallback_used: generated.fallback_used,
                };
                self.cache.insert(
                    cache_key,
                    report,
                    options.cache_duration.unwrap_or(self.default_cache_minutes),
                );
                Ok(self.build_result(report_type, generated, started))
            }
            Err(e) if options.fallback_enabled() => {
                warn!("⚠️ {} generation failed: {}. Trying emergency fallback", report_type, e);
                match self.emergency_fallback(report_type, &options, started).await {
                    Some(result) => Ok(result),
                    None => {
                        error!("❌ All sources failed for {}: {}", report_type, e);
                        Err(e)
                    }
                }
            }
            Err(e) => {
                error!("❌ {} generation failed with fallback disabled: {}", report_type, e);
                Err(e)
            }
        }
    }

    /// Profit and loss, always from journals with comprehensive validation.
    pub async fn generate_profit_loss(
        &self,
        mut options: ReportOptions,
    ) -> Result<ReportResult, ReportError> {
        options.prefer_journal_based = true;
        options.validation_level = Some(ValidationLevel::Comprehensive);
        self.generate_report(&ReportType::ProfitLoss, options).await
    }

    pub async fn generate_balance_sheet(
        &self,
        mut options: ReportOptions,
    ) -> Result<ReportResult, ReportError> {
        options.validation_level.get_or_insert(ValidationLevel::Strict);
        self.generate_report(&ReportType::BalanceSheet, options).await
    }

    pub async fn generate_cash_flow(
        &self,
        mut options: ReportOptions,
    ) -> Result<ReportResult, ReportError> {
        options.validation_level.get_or_insert(ValidationLevel::Basic);
        self.generate_report(&ReportType::CashFlow, options).await
    }

    /// Trial balance, always with strict validation.
    pub async fn generate_trial_balance(
        &self,
        mut options: ReportOptions,
    ) -> Result<ReportResult, ReportError> {
        options.validation_level = Some(ValidationLevel::Strict);
        self.generate_report(&ReportType::TrialBalance, options).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Report cache cleared");
    }

    pub fn clear_cache_for(&self, report_type: &ReportType) -> usize {
        let removed = self.cache.clear_report_type(report_type);
        info!("Removed {} cached {} report(s)", removed, report_type);
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn generate_fresh(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Generated, ReportError> {
        let decision = decide_strategy(report_type, options, self.volume_estimator.as_ref());
        debug!(
            "Strategy for {}: {} (confidence {:.2}) - {}",
            report_type, decision.recommended_source, decision.confidence, decision.reasoning
        );

        let mut source = decision.recommended_source;
        let mut data = self.generate_from_source(source, report_type, options).await?;

        let findings = match options.validation_level {
            Some(level) => self.validator.validate(report_type, &data, level),
            None => Vec::new(),
        };
        let mut score = quality_score(&findings, decision.confidence, &data);

        let mut data_sources = consulted(source);
        let mut optimizations = Vec::new();
        if source == ReportSource::Hybrid {
            optimizations.push("parallel_source_fetch".to_string());
        }

        let mut fallback_used = false;
        if score < FALLBACK_QUALITY_THRESHOLD && options.fallback_enabled() {
            let target = source.fallback();
            info!(
                "{} quality {:.2} below threshold, trying {} source",
                report_type, score, target
            );
            if !data_sources.contains(&target) {
                data_sources.push(target);
            }

            match self.generate_from_source(target, report_type, options).await {
                Ok(fallback_data) if FALLBACK_QUALITY_SCORE > score => {
                    optimizations.push("fallback_applied".to_string());
                    optimizations.push(format!("original_{}_to_{}", source, target));
                    data = fallback_data;
                    source = target;
                    score = FALLBACK_QUALITY_SCORE;
                    fallback_used = true;
                }
                Ok(_) => {
                    debug!("Fallback for {} would not improve quality, keeping original", report_type);
                }
                Err(e) => {
                    warn!("Fallback to {} failed for {}: {}", target, report_type, e);
                }
            }
        }

        Ok(Generated {
            data,
            source,
            quality_score: score,
            findings,
            data_sources,
            optimizations,
            fallback_used,
        })
    }

    async fn generate_from_source(
        &self,
        source: ReportSource,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ReportError> {
        match source {
            ReportSource::Journal => self.generate_from_journal(report_type, options).await,
            ReportSource::Backend => self.generate_from_backend(report_type, options).await,
            ReportSource::Hybrid => self.generate_hybrid(report_type, options).await,
        }
    }

    async fn generate_from_journal(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ReportError> {
        let result = match report_type {
            ReportType::ProfitLoss => self.enhanced_pl.generate_enhanced_pl_from_journals(options).await,
            ReportType::BalanceSheet => self.journal.generate_balance_sheet_from_journals(options).await,
            ReportType::CashFlow => self.journal.generate_cash_flow_from_journals(options).await,
            ReportType::TrialBalance => self.journal.generate_trial_balance_from_journals(options).await,
            other => return Err(ReportError::UnsupportedReportType(other.clone())),
        };
        result.map_err(|e| ReportError::provider(ReportSource::Journal, e))
    }

    async fn generate_from_backend(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ReportError> {
        self.backend
            .generate_report(report_type, options)
            .await
            .map_err(|e| ReportError::provider(ReportSource::Backend, e))
    }

    /// Runs both sources concurrently and lets each fail on its own.
    async fn generate_hybrid(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
    ) -> Result<Value, ReportError> {
        let (journal, backend) = tokio::join!(
            self.generate_from_journal(report_type, options),
            self.generate_from_backend(report_type, options),
        );

        match (journal, backend) {
            (Ok(primary), Ok(secondary)) => Ok(attach_secondary(primary, secondary)),
            (Ok(primary), Err(e)) => {
                warn!("Hybrid {}: backend failed, using journal only: {}", report_type, e);
                Ok(primary)
            }
            (Err(e), Ok(secondary)) => {
                warn!("Hybrid {}: journal failed, using backend only: {}", report_type, e);
                Ok(secondary)
            }
            (Err(journal_err), Err(backend_err)) => Err(ReportError::AllSourcesFailed {
                report_type: report_type.clone(),
                reasons: format!("journal: {}; backend: {}", journal_err, backend_err),
            }),
        }
    }

    async fn emergency_fallback(
        &self,
        report_type: &ReportType,
        options: &ReportOptions,
        started: Instant,
    ) -> Option<ReportResult> {
        for source in EMERGENCY_ORDER {
            match self.generate_from_source(source, report_type, options).await {
                Ok(data) => {
                    info!("🚑 Emergency fallback served {} from {} source", report_type, source);
                    let generated = Generated {
                        data,
                        source,
                        quality_score: EMERGENCY_QUALITY_SCORE,
                        findings: Vec::new(),
                        data_sources: vec![source],
                        optimizations: vec!["emergency_fallback".to_string()],
                        fallback_used: true,
                    };
                    let mut result = self.build_result(report_type, generated, started);
                    result.recommendations = vec![format!(
                        "Emergency fallback used: primary generation failed, report served from {} source",
                        source
                    )];
                    return Some(result);
                }
                Err(e) => warn!("Emergency fallback via {} failed for {}: {}", source, report_type, e),
            }
        }
        None
    }

    fn build_result(
        &self,
        report_type: &ReportType,
        generated: Generated,
        started: Instant,
    ) -> ReportResult {
        let recommendations = recommendations(
            report_type,
            generated.source,
            &generated.findings,
            generated.quality_score,
        );
        let data_freshness = match generated.source {
            ReportSource::Backend => DataFreshness::Aggregated,
            ReportSource::Journal | ReportSource::Hybrid => DataFreshness::RealTime,
        };

        ReportResult {
            data: generated.data,
            source: generated.source,
            quality_score: generated.quality_score,
            recommendations,
            performance: PerformanceMetrics {
                generation_time_ms: started.elapsed().as_millis() as u64,
                data_freshness,
                cache_hit: false,
                fallback_used: generated.fallback_used,
            },
            metadata: ReportMetadata {
                report_id: Uuid::new_v4(),
                report_type: report_type.clone(),
                generated_at: self.cache.now(),
                data_sources: generated.data_sources,
                validation_results: generated.findings,
                optimizations_applied: generated.optimizations,
            },
        }
    }

    fn cached_result(&self, report_type: &ReportType, entry: CacheEntry, started: Instant) -> ReportResult {
        let report = entry.report;
        ReportResult {
            data: report.data,
            source: report.source,
            quality_score: report.quality_score,
            recommendations: Vec::new(),
            performance: PerformanceMetrics {
                generation_time_ms: started.elapsed().as_millis() as u64,
                data_freshness: DataFreshness::Cached,
                cache_hit: true,
                fallback_used: report.fallback_used,
            },
            metadata: ReportMetadata {
                report_id: Uuid::new_v4(),
                report_type: report_type.clone(),
                generated_at: entry.created_at,
                data_sources: vec![report.source],
                validation_results: Vec::new(),
                optimizations_applied: vec!["cache_hit".to_string()],
            },
        }
    }
}

fn consulted(source: ReportSource) -> Vec<ReportSource> {
    match source {
        ReportSource::Hybrid => vec![ReportSource::Journal, ReportSource::Backend],
        single => vec![single],
    }
}

/// Keeps the journal payload and hangs the backend payload off it unchanged.
///
/// Non-object journal payloads have nowhere to carry the backend copy and are
/// returned as they are.
fn attach_secondary(primary: Value, secondary: Value) -> Value {
    match primary {
        Value::Object(mut map) => {
            map.insert("_secondary_validation".to_string(), secondary);
            map.insert("_confidence".to_string(), Value::String("high".to_string()));
            Value::Object(map)
        }
        other => other,
    }
}
