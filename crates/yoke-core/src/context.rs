//! Session Context: read-only state shared by every hook during a session
use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub session_number: Option<u32>,
    pub trace_id: String,
    /// Agent working directory (project workspace)
    pub workspace_dir: PathBuf,
    pub is_initializer: bool,
    pub metadata: HashMap<String, Value>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            session_number: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
            workspace_dir: workspace_dir.into(),
            is_initializer: false,
            metadata: HashMap::new(),
        }
    }

    pub fn with_session_number(mut self, number: u32) -> Self {
        self.session_number = Some(number);
        self
    }

    pub fn initializer(mut self) -> Self {
        self.is_initializer = true;
        self
    }
}
