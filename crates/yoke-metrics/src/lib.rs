//! YokeFlow Metrics: persistence of per-session quality metrics
//!
//! One `session_quality_checks` row per session, replaced on every
//! recomputation, plus the verification count projected onto the
//! session's own `metrics` document in the same transaction.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use yoke_metrics::{MetricsRecorder, SessionType, SqliteStore};
//! use yoke_quality::{analyze, QualityScorer, SessionLog};
//!
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let project = store.create_project("demo").unwrap();
//! let session = store.create_session(&project, 1, SessionType::Coding).unwrap();
//!
//! let metrics = analyze(&SessionLog::missing(&session), false, &QualityScorer::default());
//! let recorder = MetricsRecorder::new(store.clone());
//! recorder.upsert(&session, &metrics).unwrap();
//!
//! assert_eq!(store.check_count(&session).unwrap(), 1);
//! ```

pub mod backoff;
pub mod error;
pub mod recorder;
pub mod store;

pub use backoff::{Backoff, RetryPolicy};
pub use error::StoreError;
pub use recorder::MetricsRecorder;
pub use store::{
    MetricsStore, SessionCatalog, SessionRecord, SessionType, SqliteStore, StoredCheck,
};
