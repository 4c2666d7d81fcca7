use serde_json::Value;

use crate::models::{
    FindingStatus, Impact, ReportSource, ReportType, ValidationFinding, ValidationLevel,
};

/// Allowed rounding difference for accounting identities.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Scores below this trigger a fallback attempt and a recommendation.
pub const FALLBACK_QUALITY_THRESHOLD: f64 = 0.8;

/// Extra check run only at the comprehensive level.
pub trait ValidationHook: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, report_type: &ReportType, data: &Value) -> Vec<ValidationFinding>;
}

/// Applies the built-in accounting checks plus any registered hooks.
///
/// Business-rule and cross-system hooks start empty; deployments register
/// their own.
#[derive(Default)]
pub struct ReportValidator {
    business_rules: Vec<Box<dyn ValidationHook>>,
    consistency_checks: Vec<Box<dyn ValidationHook>>,
}

impl ReportValidator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_business_rule(mut self, hook: Box<dyn ValidationHook>) -> Self {
        self.business_rules.push(hook);
        self
    }

    #[allow(dead_code)]
    pub fn with_consistency_check(mut self, hook: Box<dyn ValidationHook>) -> Self {
        self.consistency_checks.push(hook);
        self
    }

    pub fn validate(
        &self,
        report_type: &ReportType,
        data: &Value,
        level: ValidationLevel,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        if data.is_null() {
            findings.push(ValidationFinding::error(
                "data_presence",
                "Report returned no data",
                Impact::High,
            ));
            return findings;
        }

        if level >= ValidationLevel::Strict {
            findings.extend(check_accounting_identities(report_type, data));
        }

        if level == ValidationLevel::Comprehensive {
            for hook in self.business_rules.iter().chain(self.consistency_checks.iter()) {
                let hook_findings = hook.check(report_type, data);
                if !hook_findings.is_empty() {
                    tracing::debug!(
                        "Validation hook {} produced {} finding(s)",
                        hook.name(),
                        hook_findings.len()
                    );
                }
                findings.extend(hook_findings);
            }
        }

        findings
    }
}

fn number_at(data: &Value, pointer: &str) -> Option<f64> {
    data.pointer(pointer).and_then(Value::as_f64)
}

/// Balance sheet equation and trial balance equality.
///
/// A check is skipped when any figure it needs is missing from the payload.
fn check_accounting_identities(report_type: &ReportType, data: &Value) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    match report_type {
        ReportType::BalanceSheet | ReportType::ProfitLoss => {
            let assets = number_at(data, "/assets/total");
            let liabilities = number_at(data, "/liabilities/total");
            let equity = number_at(data, "/equity/total");

            if let (Some(assets), Some(liabilities), Some(equity)) = (assets, liabilities, equity) {
                let difference = assets - (liabilities + equity);
                if difference.abs() > BALANCE_TOLERANCE {
                    findings.push(ValidationFinding::error(
                        "balance_sheet_equation",
                        format!(
                            "Assets ({:.2}) do not equal liabilities plus equity ({:.2}); difference {:.2}",
                            assets,
                            liabilities + equity,
                            difference
                        ),
                        Impact::High,
                    ));
                }
            }
        }
        ReportType::TrialBalance => {
            let debits = number_at(data, "/total_debits");
            let credits = number_at(data, "/total_credits");

            if let (Some(debits), Some(credits)) = (debits, credits) {
                if (debits - credits).abs() > BALANCE_TOLERANCE {
                    findings.push(ValidationFinding::error(
                        "trial_balance_equality",
                        format!(
                            "Total debits ({:.2}) do not equal total credits ({:.2})",
                            debits, credits
                        ),
                        Impact::High,
                    ));
                }
            }
        }
        _ => {}
    }

    findings
}

fn penalty(finding: &ValidationFinding) -> f64 {
    match (finding.status, finding.impact) {
        (FindingStatus::Error, Impact::High) => 0.3,
        (FindingStatus::Error, Impact::Medium) => 0.2,
        (FindingStatus::Error, Impact::Low) => 0.1,
        (FindingStatus::Warning, Impact::High) => 0.1,
        (FindingStatus::Warning, Impact::Medium) => 0.05,
        (FindingStatus::Warning, Impact::Low) => 0.02,
        (FindingStatus::Pass, _) => 0.0,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Share of top-level fields that carry a truthy value.
///
/// Shallow on purpose: nested structures count as present regardless of
/// their contents. Non-objects and empty objects score zero.
pub fn completeness(data: &Value) -> f64 {
    match data {
        Value::Object(map) if !map.is_empty() => {
            let empty = map.values().filter(|v| is_falsy(v)).count();
            1.0 - empty as f64 / map.len() as f64
        }
        _ => 0.0,
    }
}

pub fn quality_score(findings: &[ValidationFinding], confidence: f64, data: &Value) -> f64 {
    let mut score = 1.0;
    for finding in findings {
        score -= penalty(finding);
    }
    score *= confidence;
    score *= completeness(data);
    score.clamp(0.0, 1.0)
}

pub fn recommendations(
    report_type: &ReportType,
    source: ReportSource,
    findings: &[ValidationFinding],
    score: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    for finding in findings {
        match finding.status {
            FindingStatus::Error => out.push(format!(
                "Resolve {} before relying on this report: {}",
                finding.rule, finding.message
            )),
            FindingStatus::Warning => {
                out.push(format!("Review {}: {}", finding.rule, finding.message))
            }
            FindingStatus::Pass => {}
        }
    }

    if score < FALLBACK_QUALITY_THRESHOLD {
        out.push(format!(
            "Report quality is low ({:.2}); verify the underlying journal entries or regenerate with a different source",
            score
        ));
    }

    if *report_type == ReportType::ProfitLoss && source == ReportSource::Backend {
        out.push("Journal-based calculation gives the most accurate profit and loss figures".to_string());
    }

    out
}
