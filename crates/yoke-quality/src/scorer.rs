//! Quality Scorer: counts → 0-10 rating plus classified findings
//!
//! ```text
//! rating = 10 - Σ weight(finding) - round(error_rate × error_rate_weight)
//!          clamped to [0, 10]
//! ```
//!
//! Critical findings weigh `critical_weight`, warnings `warning_weight`,
//! and the log-completeness warning weighs `incomplete_penalty`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::log::LogCompleteness;
use crate::parser::SessionCounts;
use crate::profile::ScoringProfile;

pub const MAX_RATING: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Critical => "❌",
            Severity::Warning => "⚠️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    NoBrowserVerification,
    ErrorRateCritical,
    ErrorRateElevated,
    NoScreenshots,
    LogIncomplete,
    LogMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
}

impl Finding {
    fn critical(code: FindingCode, message: String) -> Self {
        Self {
            severity: Severity::Critical,
            code,
            message,
        }
    }

    fn warning(code: FindingCode, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.marker(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub rating: u8,
    pub error_rate: f64,
    /// Critical findings first, then warnings, each in rule order
    pub findings: Vec<Finding>,
    pub profile: String,
}

impl QualityReport {
    /// Rendered critical findings (`❌ …`).
    pub fn critical_issues(&self) -> Vec<String> {
        self.rendered(Severity::Critical)
    }

    /// Rendered warnings (`⚠️ …`).
    pub fn warnings(&self) -> Vec<String> {
        self.rendered(Severity::Warning)
    }

    pub fn has(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    fn rendered(&self, severity: Severity) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .map(|f| f.to_string())
            .collect()
    }
}

pub struct QualityScorer {
    profile: ScoringProfile,
}

impl QualityScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    pub fn score(&self, counts: &SessionCounts, is_initializer: bool) -> QualityReport {
        let p = &self.profile;
        let error_rate = counts.error_rate();
        let mut critical = Vec::new();
        let mut warnings = Vec::new();

        // === Verification ===
        if counts.playwright_count == 0 {
            if !is_initializer {
                critical.push(Finding::critical(
                    FindingCode::NoBrowserVerification,
                    "No browser verification performed; the result is unverified".to_string(),
                ));
            }
        } else if counts.playwright_screenshot_count == 0 {
            warnings.push(Finding::warning(
                FindingCode::NoScreenshots,
                format!(
                    "Browser verification used {} time(s) but no screenshot was captured",
                    counts.playwright_count
                ),
            ));
        }

        // === Error rate ===
        if error_rate > p.critical_error_rate {
            critical.push(Finding::critical(
                FindingCode::ErrorRateCritical,
                format!(
                    "Error rate {:.1}% exceeds {:.0}% ({} of {} tool uses failed)",
                    error_rate * 100.0,
                    p.critical_error_rate * 100.0,
                    counts.error_count,
                    counts.total_tool_uses
                ),
            ));
        } else if error_rate > p.warning_error_rate {
            warnings.push(Finding::warning(
                FindingCode::ErrorRateElevated,
                format!(
                    "Elevated error rate {:.1}% ({} of {} tool uses failed)",
                    error_rate * 100.0,
                    counts.error_count,
                    counts.total_tool_uses
                ),
            ));
        }

        // === Log completeness ===
        match counts.completeness {
            LogCompleteness::Complete => {}
            LogCompleteness::Partial => warnings.push(Finding::warning(
                FindingCode::LogIncomplete,
                "Session log is incomplete; metrics have reduced confidence".to_string(),
            )),
            LogCompleteness::Missing => warnings.push(Finding::warning(
                FindingCode::LogMissing,
                "Session log not found; metrics are empty".to_string(),
            )),
        }

        let mut findings = critical;
        findings.extend(warnings);

        QualityReport {
            rating: self.rating(&findings, error_rate),
            error_rate,
            findings,
            profile: p.name.clone(),
        }
    }

    fn rating(&self, findings: &[Finding], error_rate: f64) -> u8 {
        let p = &self.profile;
        let finding_points: u64 = findings
            .iter()
            .map(|f| {
                let weight = match (f.severity, f.code) {
                    (_, FindingCode::LogIncomplete | FindingCode::LogMissing) => {
                        p.incomplete_penalty
                    }
                    (Severity::Critical, _) => p.critical_weight,
                    (Severity::Warning, _) => p.warning_weight,
                };
                u64::from(weight)
            })
            .sum();
        let rate_points = (error_rate * p.error_rate_weight).round() as u64;

        let lost = finding_points.saturating_add(rate_points);
        (MAX_RATING as u64).saturating_sub(lost) as u8
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(ScoringProfile::default())
    }
}

/// Score with the default profile.
pub fn score(counts: &SessionCounts, is_initializer: bool) -> QualityReport {
    QualityScorer::default().score(counts, is_initializer)
}
