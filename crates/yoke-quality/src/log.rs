//! Session log reader
//!
//! Logs are JSON Lines written while the session runs. A session that was
//! interrupted leaves a truncated file behind, so reading never fails on
//! bad content: it records what went wrong and marks the log `Partial`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use yoke_core::{SessionLogEntry, ToolInvocation, ToolResult, YokeError};

/// One line of a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    SessionStart {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    ToolUse {
        #[serde(default)]
        tool_use_id: Option<String>,
        tool_name: String,
        #[serde(default)]
        input: Map<String, Value>,
        timestamp: DateTime<Utc>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        exit_code: Option<i32>,
        #[serde(default)]
        content: Option<Value>,
        timestamp: DateTime<Utc>,
    },
    SessionEnd {
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Assistant text, token usage and anything else not scored
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCompleteness {
    Complete,
    /// Readable but truncated or damaged
    Partial,
    /// No log file at all
    Missing,
}

/// What made a log `Partial`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDefects {
    pub malformed_lines: u32,
    pub unanswered_tool_uses: u32,
    pub missing_session_end: bool,
    pub out_of_order: bool,
    /// Bytes that were not UTF-8 and were replaced while reading
    #[serde(default)]
    pub invalid_utf8: bool,
}

impl LogDefects {
    pub fn is_clean(&self) -> bool {
        self.malformed_lines == 0
            && self.unanswered_tool_uses == 0
            && !self.missing_session_end
            && !self.out_of_order
            && !self.invalid_utf8
    }
}

/// A session's tool invocations paired with their results
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLog {
    pub session_id: String,
    pub entries: Vec<SessionLogEntry>,
    pub completeness: LogCompleteness,
    pub defects: LogDefects,
}

impl SessionLog {
    pub fn missing(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            entries: Vec::new(),
            completeness: LogCompleteness::Missing,
            defects: LogDefects::default(),
        }
    }

    /// Build a log from entries already in memory (treated as complete).
    pub fn from_entries(session_id: impl Into<String>, entries: Vec<SessionLogEntry>) -> Self {
        let out_of_order = entries
            .windows(2)
            .any(|w| w[1].timestamp() < w[0].timestamp());
        let defects = LogDefects {
            out_of_order,
            ..LogDefects::default()
        };
        Self {
            session_id: session_id.into(),
            completeness: completeness_of(&defects),
            entries,
            defects,
        }
    }

    pub fn from_jsonl(session_id: impl Into<String>, text: &str) -> Self {
        let session_id = session_id.into();
        let mut entries: Vec<SessionLogEntry> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut defects = LogDefects {
            missing_session_end: true,
            ..LogDefects::default()
        };

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: LogRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    debug!(session_id = %session_id, line = lineno + 1, error = %e, "malformed log line");
                    defects.malformed_lines += 1;
                    continue;
                }
            };

            match record {
                LogRecord::ToolUse {
                    tool_use_id,
                    tool_name,
                    input,
                    timestamp,
                } => {
                    if entries.last().is_some_and(|e| timestamp < e.timestamp()) {
                        defects.out_of_order = true;
                    }
                    let mut invocation = ToolInvocation::new(tool_name, session_id.clone())
                        .with_arguments(input)
                        .with_timestamp(timestamp);
                    if let Some(id) = tool_use_id {
                        by_id.insert(id.clone(), entries.len());
                        invocation = invocation.with_tool_use_id(id);
                    }
                    entries.push(SessionLogEntry::new(invocation, None));
                }
                LogRecord::ToolResult {
                    tool_use_id,
                    is_error,
                    exit_code,
                    content,
                    timestamp,
                } => {
                    let slot = match tool_use_id {
                        Some(id) => by_id.get(&id).copied(),
                        None => entries.iter().rposition(|e| e.result.is_none()),
                    };
                    let Some(index) = slot else {
                        debug!(session_id = %session_id, line = lineno + 1, "result without matching tool use");
                        continue;
                    };
                    entries[index].result = Some(ToolResult {
                        is_error,
                        exit_code,
                        content: content.map(content_text),
                        timestamp,
                    });
                }
                LogRecord::SessionEnd { .. } => defects.missing_session_end = false,
                LogRecord::SessionStart { .. } | LogRecord::Other => {}
            }
        }

        defects.unanswered_tool_uses = entries.iter().filter(|e| e.result.is_none()).count() as u32;

        Self {
            session_id,
            completeness: completeness_of(&defects),
            entries,
            defects,
        }
    }

    /// Read a log file. A file that does not exist is a `Missing` log, not an
    /// error; a file that exists but cannot be read is `LogIncomplete`.
    pub fn read(session_id: impl Into<String>, path: &Path) -> Result<Self, YokeError> {
        let session_id = session_id.into();
        match fs::read(path) {
            Ok(bytes) => {
                let log = match String::from_utf8(bytes) {
                    Ok(text) => Self::from_jsonl(session_id, &text),
                    Err(e) => {
                        let text = String::from_utf8_lossy(e.as_bytes()).into_owned();
                        let mut log = Self::from_jsonl(session_id, &text);
                        log.defects.invalid_utf8 = true;
                        log.completeness = completeness_of(&log.defects);
                        log
                    }
                };
                if log.completeness == LogCompleteness::Partial {
                    warn!(path = %path.display(), defects = ?log.defects, "session log is partial");
                }
                Ok(log)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::missing(session_id)),
            Err(e) => Err(YokeError::LogIncomplete(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completeness == LogCompleteness::Complete
    }
}

/// Directory holding a project's session logs.
pub fn session_log_dir(generations_dir: &Path, project: &str) -> PathBuf {
    generations_dir.join(project).join("logs")
}

/// File-name glob for one session's logs, matched inside [`session_log_dir`].
///
/// Files are named `session_NNN_<suffix>.jsonl`, NNN zero-padded to three digits.
pub fn session_log_file_pattern(session_number: u32) -> String {
    format!("session_{:03}_*.jsonl", session_number)
}

fn completeness_of(defects: &LogDefects) -> LogCompleteness {
    if defects.is_clean() {
        LogCompleteness::Complete
    } else {
        LogCompleteness::Partial
    }
}

fn content_text(content: Value) -> String {
    match content {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
{"type":"session_start","session_id":"s1","timestamp":"2026-01-05T10:00:00Z"}
{"type":"tool_use","tool_use_id":"t1","tool_name":"Bash","input":{"command":"npm test"},"timestamp":"2026-01-05T10:00:01Z"}
{"type":"assistant","text":"running tests"}
{"type":"tool_result","tool_use_id":"t1","is_error":false,"exit_code":0,"content":"ok","timestamp":"2026-01-05T10:00:05Z"}
{"type":"tool_use","tool_use_id":"t2","tool_name":"mcp__playwright__browser_navigate","input":{"url":"http://localhost:3000"},"timestamp":"2026-01-05T10:00:06Z"}
{"type":"tool_result","tool_use_id":"t2","is_error":true,"content":[{"type":"text","text":"timeout"}],"timestamp":"2026-01-05T10:00:09Z"}
{"type":"session_end","timestamp":"2026-01-05T10:00:10Z"}
"#;

    #[test]
    fn test_complete_log() {
        let log = SessionLog::from_jsonl("s1", COMPLETE);
        assert_eq!(log.completeness, LogCompleteness::Complete);
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[0].invocation.command(), Some("npm test"));
        assert!(!log.entries[0].is_error());
        assert!(log.entries[1].is_error());
        assert!(log.entries[1]
            .result
            .as_ref()
            .unwrap()
            .content
            .as_deref()
            .unwrap()
            .contains("timeout"));
    }

    #[test]
    fn test_truncated_log_is_partial() {
        let cut = COMPLETE.find("{\"type\":\"tool_result\",\"tool_use_id\":\"t2\"").unwrap();
        let truncated = &COMPLETE[..cut + 30];
        let log = SessionLog::from_jsonl("s1", truncated);

        assert_eq!(log.completeness, LogCompleteness::Partial);
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.defects.malformed_lines, 1);
        assert_eq!(log.defects.unanswered_tool_uses, 1);
        assert!(log.defects.missing_session_end);
    }

    #[test]
    fn test_out_of_order_is_partial() {
        let text = r#"
{"type":"tool_use","tool_use_id":"a","tool_name":"Read","timestamp":"2026-01-05T10:00:05Z"}
{"type":"tool_result","tool_use_id":"a","timestamp":"2026-01-05T10:00:06Z"}
{"type":"tool_use","tool_use_id":"b","tool_name":"Read","timestamp":"2026-01-05T10:00:01Z"}
{"type":"tool_result","tool_use_id":"b","timestamp":"2026-01-05T10:00:02Z"}
{"type":"session_end"}
"#;
        let log = SessionLog::from_jsonl("s1", text);
        assert!(log.defects.out_of_order);
        assert_eq!(log.completeness, LogCompleteness::Partial);
    }

    #[test]
    fn test_result_without_id_pairs_with_latest_open_use() {
        let text = r#"
{"type":"tool_use","tool_name":"Bash","input":{"command":"false"},"timestamp":"2026-01-05T10:00:01Z"}
{"type":"tool_result","exit_code":1,"timestamp":"2026-01-05T10:00:02Z"}
{"type":"session_end"}
"#;
        let log = SessionLog::from_jsonl("s1", text);
        assert!(log.is_complete());
        assert!(log.entries[0].is_error());
    }

    #[test]
    fn test_read_missing_and_present_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_001_x.jsonl");

        let log = SessionLog::read("s1", &path).unwrap();
        assert_eq!(log.completeness, LogCompleteness::Missing);
        assert!(log.entries.is_empty());

        std::fs::write(&path, COMPLETE).unwrap();
        let log = SessionLog::read("s1", &path).unwrap();
        assert!(log.is_complete());
    }

    #[test]
    fn test_invalid_utf8_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_002_x.jsonl");
        let mut bytes = COMPLETE.as_bytes().to_vec();
        let at = COMPLETE.find("ok").unwrap();
        bytes[at] = 0xff;
        std::fs::write(&path, &bytes).unwrap();

        let log = SessionLog::read("s1", &path).unwrap();
        assert!(log.defects.invalid_utf8);
        assert_eq!(log.defects.malformed_lines, 0);
        assert_eq!(log.completeness, LogCompleteness::Partial);
        assert_eq!(log.entries.len(), 2);
    }

    #[test]
    fn test_session_log_location() {
        let dir = session_log_dir(Path::new("generations"), "claude_ai");
        assert_eq!(dir, Path::new("generations/claude_ai/logs"));
        assert_eq!(session_log_file_pattern(7), "session_007_*.jsonl");
        assert_eq!(session_log_file_pattern(123), "session_123_*.jsonl");
    }
}
