//! YokeFlow Quality: post-hoc scoring of finished agent sessions
//!
//! Replays a session log and derives the metrics stored for that session.
//!
//! # Scoring Flow
//!
//! ```text
//! session_NNN_*.jsonl → SessionLog → parse → SessionCounts → score → QualityReport
//!                          │                                              │
//!                     completeness ───────────────────────────────▶ SessionMetrics
//! ```
//!
//! # Example
//!
//! ```
//! use yoke_quality::{analyze, QualityScorer, SessionLog};
//!
//! let jsonl = r#"{"type":"tool_use","tool_use_id":"t1","tool_name":"Bash","input":{"command":"npm test"},"timestamp":"2026-01-05T10:00:00Z"}
//! {"type":"tool_result","tool_use_id":"t1","exit_code":0,"timestamp":"2026-01-05T10:00:04Z"}
//! {"type":"session_end"}"#;
//!
//! let log = SessionLog::from_jsonl("session-1", jsonl);
//! let metrics = analyze(&log, true, &QualityScorer::default());
//!
//! assert_eq!(metrics.total_tool_uses, 1);
//! assert_eq!(metrics.overall_rating, 10);
//! ```

pub mod log;
pub mod metrics;
pub mod parser;
pub mod profile;
pub mod scorer;

pub use log::{
    session_log_dir, session_log_file_pattern, LogCompleteness, LogDefects, LogRecord, SessionLog,
};
pub use metrics::{ProjectSummary, SessionMetrics, CHECK_VERSION};
pub use parser::{count_entries, parse, SessionCounts};
pub use profile::ScoringProfile;
pub use scorer::{score, Finding, FindingCode, QualityReport, QualityScorer, Severity};

/// Parse and score one session log.
pub fn analyze(log: &SessionLog, is_initializer: bool, scorer: &QualityScorer) -> SessionMetrics {
    let counts = parse(log);
    let report = scorer.score(&counts, is_initializer);
    tracing::debug!(
        session_id = %log.session_id,
        rating = report.rating,
        findings = report.findings.len(),
        "session scored"
    );
    SessionMetrics::from_report(&counts, &report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_missing_log() {
        let metrics = analyze(&SessionLog::missing("s1"), false, &QualityScorer::default());
        assert_eq!(metrics.total_tool_uses, 0);
        assert_eq!(metrics.completeness, LogCompleteness::Missing);
        assert_eq!(metrics.critical_issues.len(), 1);
        assert_eq!(metrics.warnings.len(), 1);
    }
}
