//! Source selection for report generation.
//!
//! The decision is a fixed heuristic over four factors. The data-volume factor
//! is a stub: nothing in the accounting backend exposes row counts yet, so the
//! estimate is injected and defaults to a constant.

use crate::models::{
    ReportOptions, ReportSource, ReportType, StrategyDecision, StrategyFactors,
};

pub const DEFAULT_DATE_RANGE_DAYS: i64 = 30;

const SMALL_VOLUME: u64 = 1_000;
const LARGE_VOLUME: u64 = 10_000;
const LONG_RANGE_DAYS: i64 = 365;
const REAL_TIME_THRESHOLD: f64 = 0.7;
const PREFERENCE_PENALTY: f64 = 0.9;

/// Estimates how many rows a report will touch.
pub trait DataVolumeEstimator: Send + Sync {
    fn estimate(&self, report_type: &ReportType, options: &ReportOptions) -> u64;
}

/// Stub estimator returning the same figure for every request.
pub struct FixedVolumeEstimator(pub u64);

impl DataVolumeEstimator for FixedVolumeEstimator {
    fn estimate(&self, _report_type: &ReportType, _options: &ReportOptions) -> u64 {
        self.0
    }
}

pub fn date_range_days(options: &ReportOptions) -> i64 {
    match (options.start_date, options.end_date) {
        (Some(start), Some(end)) => (end - start).num_days(),
        _ => DEFAULT_DATE_RANGE_DAYS,
    }
}

pub fn real_time_requirement(report_type: &ReportType) -> f64 {
    match report_type {
        ReportType::TrialBalance | ReportType::GeneralLedger => 0.8,
        _ => 0.3,
    }
}

pub fn complexity(report_type: &ReportType) -> f64 {
    match report_type {
        ReportType::CashFlow => 0.9,
        ReportType::ProfitLoss => 0.7,
        ReportType::BalanceSheet => 0.6,
        ReportType::GeneralLedger => 0.5,
        ReportType::TrialBalance => 0.4,
        ReportType::Other(_) => 0.5,
    }
}

pub fn decide_strategy(
    report_type: &ReportType,
    options: &ReportOptions,
    estimator: &dyn DataVolumeEstimator,
) -> StrategyDecision {
    let factors = StrategyFactors {
        data_volume: estimator.estimate(report_type, options),
        date_range_days: date_range_days(options),
        real_time_requirement: real_time_requirement(report_type),
        complexity: complexity(report_type),
    };

    let (mut source, mut confidence, mut reasoning) =
        if factors.real_time_requirement > REAL_TIME_THRESHOLD || factors.data_volume < SMALL_VOLUME {
            (
                ReportSource::Journal,
                0.8 + factors.real_time_requirement * 0.2,
                "Real-time accuracy required or small dataset - using journal-based calculation",
            )
        } else if factors.data_volume > LARGE_VOLUME || factors.date_range_days > LONG_RANGE_DAYS {
            (
                ReportSource::Backend,
                0.7 + (factors.data_volume as f64 / 50_000.0).min(0.3),
                "Large dataset or long period - using backend aggregation",
            )
        } else {
            (
                ReportSource::Hybrid,
                0.9,
                "Medium complexity - combining journal and backend sources",
            )
        };

    if options.prefer_journal_based {
        source = ReportSource::Journal;
        confidence *= PREFERENCE_PENALTY;
        reasoning = "Journal-based calculation requested by caller";
    }

    StrategyDecision {
        recommended_source: source,
        confidence,
        reasoning: reasoning.to_string(),
        factors,
    }
}
