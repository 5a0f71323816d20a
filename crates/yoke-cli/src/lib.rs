//! Recalculation of stored quality metrics for a project
//!
//! Sessions are parsed and scored concurrently (each session's log is
//! disjoint), then written one at a time in session order.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use yoke_metrics::{MetricsRecorder, RetryPolicy, SessionCatalog, SessionRecord, SqliteStore};
use yoke_quality::{
    analyze, session_log_dir, session_log_file_pattern, LogCompleteness, ProjectSummary,
    QualityScorer, ScoringProfile, SessionLog, SessionMetrics,
};

#[derive(Debug, Clone)]
pub struct RecalcOptions {
    pub project: String,
    pub generations_dir: PathBuf,
    pub profile: ScoringProfile,
    pub retry: RetryPolicy,
}

impl RecalcOptions {
    pub fn new(project: impl Into<String>, generations_dir: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            generations_dir: generations_dir.into(),
            profile: ScoringProfile::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a session was left untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    LogMissing,
    LogUnreadable(String),
    StoreFailed(String),
}

#[derive(Debug, Clone)]
pub struct RecalcReport {
    pub project_id: String,
    pub recorded: Vec<u32>,
    pub skipped: Vec<(u32, SkipReason)>,
    pub summary: ProjectSummary,
}

/// First log file matching `session_NNN_*.jsonl`, in name order.
///
/// The directory part is matched literally, glob metacharacters included.
pub fn locate_session_log(
    generations_dir: &Path,
    project: &str,
    session_number: u32,
) -> Result<Option<PathBuf>> {
    let dir = session_log_dir(generations_dir, project);
    let literal_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&literal_dir)
        .join(session_log_file_pattern(session_number))
        .to_string_lossy()
        .into_owned();
    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid log pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

type Scored = std::result::Result<Option<SessionMetrics>, SkipReason>;

fn score_session(
    generations_dir: &Path,
    project: &str,
    session: &SessionRecord,
    scorer: &QualityScorer,
) -> Scored {
    let path = locate_session_log(generations_dir, project, session.session_number)
        .map_err(|e| SkipReason::LogUnreadable(e.to_string()))?;
    let Some(path) = path else {
        return Ok(None);
    };

    info!(session = session.session_number, log = %path.display(), "processing session");
    let log = SessionLog::read(session.id.clone(), &path)
        .map_err(|e| SkipReason::LogUnreadable(e.to_string()))?;
    if log.completeness == LogCompleteness::Missing {
        return Ok(None);
    }
    Ok(Some(analyze(&log, session.is_initializer(), scorer)))
}

/// Re-score every session of `options.project` and store the results.
pub async fn recalculate_project(
    store: Arc<SqliteStore>,
    options: &RecalcOptions,
) -> Result<RecalcReport> {
    let project_id = {
        let store = store.clone();
        let name = options.project.clone();
        tokio::task::spawn_blocking(move || store.project_id(&name)).await??
    }
    .ok_or_else(|| anyhow!("Project '{}' not found", options.project))?;

    info!(project = %options.project, project_id = %project_id, "processing project");

    let sessions = {
        let store = store.clone();
        let pid = project_id.clone();
        tokio::task::spawn_blocking(move || store.sessions(&pid)).await??
    };
    info!(count = sessions.len(), "found sessions to process");

    // === Parse and score, concurrently ===
    let scorer = Arc::new(QualityScorer::new(options.profile.clone()));
    let handles: Vec<(SessionRecord, JoinHandle<Scored>)> = sessions
        .into_iter()
        .map(|session| {
            let scorer = scorer.clone();
            let dir = options.generations_dir.clone();
            let project = options.project.clone();
            let record = session.clone();
            let handle = tokio::task::spawn_blocking(move || {
                score_session(&dir, &project, &record, &scorer)
            });
            (session, handle)
        })
        .collect();

    let mut scored = Vec::with_capacity(handles.len());
    for (session, handle) in handles {
        let outcome = handle
            .await
            .with_context(|| format!("scoring task for session {} failed", session.session_number))?;
        scored.push((session, outcome));
    }

    // === Record, sequentially ===
    let retry = options.retry;
    let (recorded, skipped) = tokio::task::spawn_blocking({
        let store = store.clone();
        move || record_all(store, retry, scored)
    })
    .await?;

    info!("recalculation complete");

    let summary = {
        let store = store.clone();
        let pid = project_id.clone();
        tokio::task::spawn_blocking(move || store.project_summary(&pid)).await??
    };

    for line in summary.to_string().lines() {
        info!("{}", line);
    }

    if recorded.is_empty() && !skipped.is_empty() {
        warn!(skipped = skipped.len(), "no session of this project had a usable log");
    }

    Ok(RecalcReport {
        project_id,
        recorded,
        skipped,
        summary,
    })
}

fn record_all(
    store: Arc<SqliteStore>,
    retry: RetryPolicy,
    scored: Vec<(SessionRecord, Scored)>,
) -> (Vec<u32>, Vec<(u32, SkipReason)>) {
    let recorder = MetricsRecorder::with_retry(store, retry);
    let mut recorded = Vec::new();
    let mut skipped = Vec::new();

    for (session, outcome) in scored {
        let number = session.session_number;
        let metrics = match outcome {
            Ok(Some(metrics)) => metrics,
            Ok(None) => {
                warn!(session = number, "no log found for session");
                skipped.push((number, SkipReason::LogMissing));
                continue;
            }
            Err(reason) => {
                warn!(session = number, reason = ?reason, "session log unusable, skipping");
                skipped.push((number, reason));
                continue;
            }
        };

        info!(
            session = number,
            playwright = metrics.playwright_count,
            rating = metrics.overall_rating,
            "session rescored"
        );

        match recorder.upsert(&session.id, &metrics) {
            Ok(()) => recorded.push(number),
            Err(e) => {
                warn!(session = number, error = %e, "failed to store metrics, skipping");
                skipped.push((number, SkipReason::StoreFailed(e.to_string())));
            }
        }
    }

    (recorded, skipped)
}

/// Fail when the project name is empty; everything else is checked against the store.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("project name must not be empty");
    }
    Ok(())
}
