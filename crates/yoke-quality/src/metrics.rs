//! Session metrics and project-level aggregation
//!
//! `SessionMetrics` is the record stored once per session. It is derived
//! entirely from the session log and can be recomputed at any time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::log::LogCompleteness;
use crate::parser::SessionCounts;
use crate::scorer::QualityReport;

/// Schema version written next to every stored metrics row
pub const CHECK_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub playwright_count: u32,
    pub playwright_screenshot_count: u32,
    pub total_tool_uses: u32,
    pub error_count: u32,
    pub error_rate: f64,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub overall_rating: u8,

    // === Detail kept in the JSON blob ===
    pub completeness: LogCompleteness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub tool_usage: BTreeMap<String, u32>,
}

impl SessionMetrics {
    pub fn from_report(counts: &SessionCounts, report: &QualityReport) -> Self {
        Self {
            playwright_count: counts.playwright_count,
            playwright_screenshot_count: counts.playwright_screenshot_count,
            total_tool_uses: counts.total_tool_uses,
            error_count: counts.error_count,
            error_rate: report.error_rate,
            critical_issues: report.critical_issues(),
            warnings: report.warnings(),
            overall_rating: report.rating,
            completeness: counts.completeness,
            duration_seconds: counts.duration_seconds(),
            tool_usage: counts.tool_usage.clone(),
        }
    }

    /// Value projected onto the session record.
    pub fn browser_verifications(&self) -> u32 {
        self.playwright_count
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Averages over a project's scored sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub total_sessions: u32,
    pub sessions_with_browser: u32,
    pub avg_playwright: f64,
    pub avg_rating: f64,
}

impl ProjectSummary {
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a SessionMetrics>,
    {
        let mut summary = Self::default();
        let mut playwright_sum = 0u64;
        let mut rating_sum = 0u64;

        for m in metrics {
            summary.total_sessions += 1;
            if m.playwright_count > 0 {
                summary.sessions_with_browser += 1;
            }
            playwright_sum += u64::from(m.playwright_count);
            rating_sum += u64::from(m.overall_rating);
        }

        if summary.total_sessions > 0 {
            let n = summary.total_sessions as f64;
            summary.avg_playwright = playwright_sum as f64 / n;
            summary.avg_rating = rating_sum as f64 / n;
        }
        summary
    }
}

impl fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average Playwright count: {:.1}", self.avg_playwright)?;
        writeln!(f, "Average quality rating: {:.1}/10", self.avg_rating)?;
        write!(
            f,
            "Sessions with browser verification: {}/{}",
            self.sessions_with_browser, self.total_sessions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::score;

    fn metrics(playwright: u32, screenshots: u32) -> SessionMetrics {
        let mut counts = SessionCounts::empty(LogCompleteness::Complete);
        counts.total_tool_uses = 10;
        counts.playwright_count = playwright;
        counts.playwright_screenshot_count = screenshots;
        let report = score(&counts, false);
        SessionMetrics::from_report(&counts, &report)
    }

    #[test]
    fn test_from_report_splits_findings() {
        let m = metrics(0, 0);
        assert_eq!(m.critical_issues.len(), 1);
        assert!(m.critical_issues[0].starts_with("❌"));
        assert!(m.warnings.is_empty());
        assert_eq!(m.overall_rating, 7);

        let m = metrics(2, 0);
        assert!(m.critical_issues.is_empty());
        assert!(m.warnings[0].starts_with("⚠️"));
        assert_eq!(m.browser_verifications(), 2);
    }

    #[test]
    fn test_json_blob_has_stored_fields() {
        let json = metrics(1, 1).to_json();
        assert_eq!(json["playwright_count"], 1);
        assert_eq!(json["overall_rating"], 10);
        assert_eq!(json["completeness"], "complete");
    }

    #[test]
    fn test_project_summary() {
        let all = vec![metrics(0, 0), metrics(2, 1), metrics(4, 1)];
        let summary = ProjectSummary::from_metrics(&all);

        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.sessions_with_browser, 2);
        assert_eq!(summary.avg_playwright, 2.0);
        assert_eq!(summary.avg_rating, 9.0);
        assert!(summary
            .to_string()
            .contains("Sessions with browser verification: 2/3"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = ProjectSummary::from_metrics(Vec::<SessionMetrics>::new().iter());
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.avg_rating, 0.0);
    }
}
