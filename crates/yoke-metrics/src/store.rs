//! SQLite storage for projects, sessions and per-session quality checks
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use yoke_quality::{ProjectSummary, SessionMetrics, CHECK_VERSION};

use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id              TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(id),
    session_number  INTEGER NOT NULL,
    type            TEXT NOT NULL DEFAULT 'coding',
    metrics         TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    UNIQUE (project_id, session_number)
);

CREATE TABLE IF NOT EXISTS session_quality_checks (
    id                           INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id                   TEXT NOT NULL UNIQUE REFERENCES sessions(id),
    check_version                TEXT NOT NULL,
    overall_rating               INTEGER NOT NULL,
    playwright_count             INTEGER NOT NULL,
    playwright_screenshot_count  INTEGER NOT NULL,
    total_tool_uses              INTEGER NOT NULL,
    error_count                  INTEGER NOT NULL,
    error_rate                   REAL NOT NULL,
    critical_issues              TEXT NOT NULL,
    warnings                     TEXT NOT NULL,
    metrics                      TEXT NOT NULL,
    created_at                   TEXT NOT NULL
);
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Initializer,
    Coding,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Initializer => "initializer",
            SessionType::Coding => "coding",
        }
    }

    fn parse(s: &str) -> Self {
        if s == "initializer" {
            SessionType::Initializer
        } else {
            SessionType::Coding
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub project_id: String,
    pub session_number: u32,
    pub session_type: SessionType,
}

impl SessionRecord {
    pub fn is_initializer(&self) -> bool {
        self.session_type == SessionType::Initializer
    }
}

/// A stored quality check row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCheck {
    pub session_id: String,
    pub check_version: String,
    pub metrics: SessionMetrics,
    pub created_at: DateTime<Utc>,
}

/// Destination for computed session metrics.
pub trait MetricsStore: Send + Sync {
    /// Insert or replace the metrics row for `session_id` and project the
    /// verification count onto the session record, atomically.
    fn upsert(&self, session_id: &str, metrics: &SessionMetrics) -> Result<(), StoreError>;

    fn load(&self, session_id: &str) -> Result<Option<StoredCheck>, StoreError>;
}

impl<T: MetricsStore + ?Sized> MetricsStore for Arc<T> {
    fn upsert(&self, session_id: &str, metrics: &SessionMetrics) -> Result<(), StoreError> {
        (**self).upsert(session_id, metrics)
    }

    fn load(&self, session_id: &str) -> Result<Option<StoredCheck>, StoreError> {
        (**self).load(session_id)
    }
}

/// Read side used by the recalculation run.
pub trait SessionCatalog {
    fn project_id(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// A project's sessions ordered by session number.
    fn sessions(&self, project_id: &str) -> Result<Vec<SessionRecord>, StoreError>;

    fn project_summary(&self, project_id: &str) -> Result<ProjectSummary, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn create_project(&self, name: &str) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.lock()?.execute(
            "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    pub fn create_session(
        &self,
        project_id: &str,
        session_number: u32,
        session_type: SessionType,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.lock()?.execute(
            "INSERT INTO sessions (id, project_id, session_number, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                project_id,
                session_number,
                session_type.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(id)
    }

    /// The session's denormalized `metrics` document.
    pub fn session_metrics(&self, session_id: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .lock()?
            .query_row(
                "SELECT metrics FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub fn check_count(&self, session_id: &str) -> Result<u32, StoreError> {
        let n: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM session_quality_checks WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(n as u32)
    }
}

impl MetricsStore for SqliteStore {
    fn upsert(&self, session_id: &str, metrics: &SessionMetrics) -> Result<(), StoreError> {
        let critical = serde_json::to_string(&metrics.critical_issues)?;
        let warnings = serde_json::to_string(&metrics.warnings)?;
        let blob = serde_json::to_string(metrics)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let touched = tx.execute(
            "UPDATE sessions
             SET metrics = json_set(COALESCE(NULLIF(metrics, ''), '{}'), '$.browser_verifications', ?1)
             WHERE id = ?2",
            params![metrics.browser_verifications(), session_id],
        )?;
        if touched == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::UnknownSession(session_id.to_string()));
        }

        tx.execute(
            "INSERT INTO session_quality_checks (
                session_id, check_version, overall_rating, playwright_count,
                playwright_screenshot_count, total_tool_uses, error_count, error_rate,
                critical_issues, warnings, metrics, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(session_id) DO UPDATE SET
                check_version = excluded.check_version,
                overall_rating = excluded.overall_rating,
                playwright_count = excluded.playwright_count,
                playwright_screenshot_count = excluded.playwright_screenshot_count,
                total_tool_uses = excluded.total_tool_uses,
                error_count = excluded.error_count,
                error_rate = excluded.error_rate,
                critical_issues = excluded.critical_issues,
                warnings = excluded.warnings,
                metrics = excluded.metrics,
                created_at = excluded.created_at",
            params![
                session_id,
                CHECK_VERSION,
                metrics.overall_rating,
                metrics.playwright_count,
                metrics.playwright_screenshot_count,
                metrics.total_tool_uses,
                metrics.error_count,
                metrics.error_rate,
                critical,
                warnings,
                blob,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        debug!(session_id, rating = metrics.overall_rating, "quality check stored");
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<StoredCheck>, StoreError> {
        let row: Option<(String, String, String)> = self
            .lock()?
            .query_row(
                "SELECT check_version, metrics, created_at
                 FROM session_quality_checks WHERE session_id = ?1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((check_version, blob, created_at)) = row else {
            return Ok(None);
        };
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|source| StoreError::InvalidTimestamp {
                session_id: session_id.to_string(),
                source,
            })?
            .with_timezone(&Utc);

        Ok(Some(StoredCheck {
            session_id: session_id.to_string(),
            check_version,
            metrics: serde_json::from_str(&blob)?,
            created_at,
        }))
    }
}

impl SessionCatalog for SqliteStore {
    fn project_id(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn sessions(&self, project_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_number, type FROM sessions
             WHERE project_id = ?1 ORDER BY session_number",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            let kind: String = row.get(2)?;
            Ok(SessionRecord {
                id: row.get(0)?,
                project_id: project_id.to_string(),
                session_number: row.get(1)?,
                session_type: SessionType::parse(&kind),
            })
        })?;
        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn project_summary(&self, project_id: &str) -> Result<ProjectSummary, StoreError> {
        let summary = self.lock()?.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN q.playwright_count > 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(AVG(q.playwright_count), 0.0),
                    COALESCE(AVG(q.overall_rating), 0.0)
             FROM session_quality_checks q
             JOIN sessions s ON s.id = q.session_id
             WHERE s.project_id = ?1",
            params![project_id],
            |row| {
                let total: i64 = row.get(0)?;
                let with_browser: i64 = row.get(1)?;
                Ok(ProjectSummary {
                    total_sessions: total as u32,
                    sessions_with_browser: with_browser as u32,
                    avg_playwright: row.get(2)?,
                    avg_rating: row.get(3)?,
                })
            },
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoke_quality::LogCompleteness;

    fn metrics(playwright: u32, rating: u8) -> SessionMetrics {
        SessionMetrics {
            playwright_count: playwright,
            playwright_screenshot_count: 0,
            total_tool_uses: 8,
            error_count: 2,
            error_rate: 0.25,
            critical_issues: vec![],
            warnings: vec!["⚠️ Browser verification used but no screenshot".to_string()],
            overall_rating: rating,
            completeness: LogCompleteness::Complete,
            duration_seconds: Some(600),
            tool_usage: Default::default(),
        }
    }

    fn seeded() -> (SqliteStore, String, String) {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("claude_ai").unwrap();
        let session = store.create_session(&project, 1, SessionType::Coding).unwrap();
        (store, project, session)
    }

    #[test]
    fn test_upsert_then_load() {
        let (store, _, session) = seeded();
        let m = metrics(3, 8);
        store.upsert(&session, &m).unwrap();

        let stored = store.load(&session).unwrap().unwrap();
        assert_eq!(stored.check_version, "1.0");
        assert_eq!(stored.metrics, m);
        assert_eq!(
            store.session_metrics(&session).unwrap().unwrap()["browser_verifications"],
            3
        );
    }

    #[test]
    fn test_second_upsert_replaces_row() {
        let (store, _, session) = seeded();
        store.upsert(&session, &metrics(1, 6)).unwrap();
        store.upsert(&session, &metrics(4, 9)).unwrap();

        assert_eq!(store.check_count(&session).unwrap(), 1);
        let stored = store.load(&session).unwrap().unwrap();
        assert_eq!(stored.metrics.overall_rating, 9);
        assert_eq!(
            store.session_metrics(&session).unwrap().unwrap()["browser_verifications"],
            4
        );
    }

    #[test]
    fn test_unknown_session_writes_nothing() {
        let (store, _, _) = seeded();
        let err = store.upsert("nope", &metrics(1, 5)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownSession(_)));
        assert_eq!(store.check_count("nope").unwrap(), 0);
    }

    #[test]
    fn test_corrupt_created_at_is_error() {
        let (store, _, session) = seeded();
        store.upsert(&session, &metrics(1, 7)).unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE session_quality_checks SET created_at = 'yesterday' WHERE session_id = ?1",
                params![session],
            )
            .unwrap();

        let err = store.load(&session).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTimestamp { .. }));
        assert!(err.to_string().starts_with("STORE/TIMESTAMP"));
    }

    #[test]
    fn test_catalog_queries() {
        let (store, project, first) = seeded();
        let third = store.create_session(&project, 3, SessionType::Coding).unwrap();
        let init = store.create_session(&project, 0, SessionType::Initializer).unwrap();

        assert_eq!(store.project_id("claude_ai").unwrap(), Some(project.clone()));
        assert_eq!(store.project_id("missing").unwrap(), None);

        let sessions = store.sessions(&project).unwrap();
        let numbers: Vec<_> = sessions.iter().map(|s| s.session_number).collect();
        assert_eq!(numbers, vec![0, 1, 3]);
        assert!(sessions[0].is_initializer());
        assert_eq!(sessions[0].id, init);

        store.upsert(&first, &metrics(2, 8)).unwrap();
        store.upsert(&third, &metrics(0, 6)).unwrap();
        let summary = store.project_summary(&project).unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.sessions_with_browser, 1);
        assert_eq!(summary.avg_playwright, 1.0);
        assert_eq!(summary.avg_rating, 7.0);
    }

    #[test]
    fn test_empty_project_summary() {
        let (store, project, _) = seeded();
        let summary = store.project_summary(&project).unwrap();
        assert_eq!(summary, ProjectSummary::default());
    }
}
