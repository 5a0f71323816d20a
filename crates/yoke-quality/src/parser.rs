//! Session Log Parser: entries → counts
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yoke_core::{SessionLogEntry, ToolInvocation, ToolKind};

use crate::log::{LogCompleteness, SessionLog};

/// Raw per-session counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCounts {
    pub total_tool_uses: u32,
    /// Browser verifications, whether through the verification tool or run
    /// inside the sandbox by a command
    pub playwright_count: u32,
    pub playwright_screenshot_count: u32,
    pub error_count: u32,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub completeness: LogCompleteness,
    /// Invocations per tool name
    pub tool_usage: BTreeMap<String, u32>,
}

impl SessionCounts {
    /// Zero counts for a log that could not be read at all.
    pub fn empty(completeness: LogCompleteness) -> Self {
        Self {
            total_tool_uses: 0,
            playwright_count: 0,
            playwright_screenshot_count: 0,
            error_count: 0,
            first_timestamp: None,
            last_timestamp: None,
            completeness,
            tool_usage: BTreeMap::new(),
        }
    }

    /// Share of invocations that failed, in [0, 1]; 0 when nothing ran.
    pub fn error_rate(&self) -> f64 {
        if self.total_tool_uses == 0 {
            return 0.0;
        }
        (self.error_count as f64 / self.total_tool_uses as f64).clamp(0.0, 1.0)
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some((last - first).num_seconds().max(0)),
            _ => None,
        }
    }
}

/// Count a session's entries, keeping the log's completeness.
pub fn parse(log: &SessionLog) -> SessionCounts {
    let mut counts = count_entries(&log.entries);
    counts.completeness = log.completeness;
    counts
}

/// Count entries assumed to form a complete log.
pub fn count_entries(entries: &[SessionLogEntry]) -> SessionCounts {
    let mut counts = SessionCounts::empty(LogCompleteness::Complete);

    for entry in entries {
        let invocation = &entry.invocation;
        counts.total_tool_uses += 1;
        *counts
            .tool_usage
            .entry(invocation.tool_name.clone())
            .or_insert(0) += 1;

        if let Some(check) = browser_check(invocation) {
            counts.playwright_count += 1;
            if check.screenshot {
                counts.playwright_screenshot_count += 1;
            }
        }

        if entry.is_error() {
            counts.error_count += 1;
        }

        let ts = entry.timestamp();
        counts.first_timestamp = Some(counts.first_timestamp.map_or(ts, |f| f.min(ts)));
        counts.last_timestamp = Some(counts.last_timestamp.map_or(ts, |l| l.max(ts)));
    }

    counts
}

struct BrowserCheck {
    screenshot: bool,
}

fn browser_check(invocation: &ToolInvocation) -> Option<BrowserCheck> {
    match invocation.kind() {
        ToolKind::Verification => Some(BrowserCheck {
            screenshot: invocation.tool_name.to_lowercase().contains("screenshot"),
        }),
        ToolKind::Command => {
            let command = invocation.command()?.to_lowercase();
            // Installing the browser tooling is not a verification.
            if !command.contains("playwright") || command.contains(" install") {
                return None;
            }
            Some(BrowserCheck {
                screenshot: command.contains("screenshot"),
            })
        }
        ToolKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use yoke_core::ToolResult;

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, sec).unwrap()
    }

    fn entry(tool: &str, command: Option<&str>, sec: u32, error: bool) -> SessionLogEntry {
        let mut inv = ToolInvocation::new(tool, "s1").with_timestamp(at(sec));
        if let Some(cmd) = command {
            inv = inv.with_argument("command", json!(cmd));
        }
        let result = if error {
            ToolResult::failed(at(sec))
        } else {
            ToolResult::ok(at(sec))
        };
        SessionLogEntry::new(inv, Some(result))
    }

    #[test]
    fn test_empty_log_counts_zero() {
        let counts = count_entries(&[]);
        assert_eq!(counts.total_tool_uses, 0);
        assert_eq!(counts.error_rate(), 0.0);
        assert!(counts.duration_seconds().is_none());
    }

    #[test]
    fn test_verification_and_screenshots() {
        let entries = vec![
            entry("mcp__playwright__browser_navigate", None, 1, false),
            entry("mcp__playwright__browser_take_screenshot", None, 2, false),
            entry(
                "mcp__task-manager__bash_docker",
                Some("node verify.js # playwright screenshot"),
                3,
                false,
            ),
            entry("Bash", Some("npx playwright install chromium"), 4, false),
            entry("Bash", Some("npm test"), 5, true),
            entry("Read", None, 6, false),
        ];
        let counts = count_entries(&entries);

        assert_eq!(counts.total_tool_uses, 6);
        assert_eq!(counts.playwright_count, 3);
        assert_eq!(counts.playwright_screenshot_count, 2);
        assert_eq!(counts.error_count, 1);
        assert_eq!(counts.tool_usage.get("Bash"), Some(&2));
        assert_eq!(counts.duration_seconds(), Some(5));
    }

    #[test]
    fn test_error_rate_bounds() {
        let entries: Vec<_> = (0..4).map(|i| entry("Bash", Some("false"), i, true)).collect();
        let counts = count_entries(&entries);
        assert_eq!(counts.error_rate(), 1.0);
    }

    #[test]
    fn test_parse_carries_completeness() {
        let log = SessionLog::missing("s1");
        let counts = parse(&log);
        assert_eq!(counts.completeness, LogCompleteness::Missing);
        assert_eq!(counts.total_tool_uses, 0);
    }
}
