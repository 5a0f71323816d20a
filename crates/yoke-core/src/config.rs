//! Configuration
//!
//! YAML configuration with defaults for every section. Loaded once, then
//! handed to the evaluator and router as immutable values; nothing in the
//! gate reads process state at decision time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::YokeError;

/// Default config file name, looked up in the current then home directory.
pub const CONFIG_FILE_NAME: &str = ".yokeflow.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YokeConfig {
    pub security: SecurityConfig,
    pub sandbox: SandboxConfig,
    pub database: DatabaseConfig,
    pub project: ProjectConfig,
    /// Scoring profile, interpreted by the quality crate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub additional_blocked_commands: Vec<String>,
}

/// Execution backend selected for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxBackend {
    #[default]
    None,
    #[serde(alias = "docker")]
    Container,
    #[serde(alias = "e2b")]
    Remote,
}

impl std::fmt::Display for SandboxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SandboxBackend::None => write!(f, "none"),
            SandboxBackend::Container => write!(f, "container"),
            SandboxBackend::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    #[serde(rename = "type")]
    pub backend: SandboxBackend,

    // Container settings
    pub docker_image: String,
    pub docker_network: String,
    pub docker_memory_limit: String,
    pub docker_cpu_limit: String,
    /// Only needed for manual browser debugging; in-container verification needs none
    pub docker_ports: Vec<String>,
    pub container_workdir: String,
    /// Run browser verification inside the container instead of a separate tool
    pub use_container_playwright: bool,

    // Remote settings
    pub e2b_api_key: Option<String>,
    pub e2b_tier: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            backend: SandboxBackend::None,
            docker_image: "yokeflow-sandbox:latest".to_string(),
            docker_network: "bridge".to_string(),
            docker_memory_limit: "2g".to_string(),
            docker_cpu_limit: "2.0".to_string(),
            docker_ports: Vec::new(),
            container_workdir: "/workspace".to_string(),
            use_container_playwright: true,
            e2b_api_key: std::env::var("E2B_API_KEY").ok(),
            e2b_tier: "free".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub database_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "yokeflow.db".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub default_generations_dir: String,
    /// None = unlimited
    pub max_iterations: Option<u32>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_generations_dir: "generations".to_string(),
            max_iterations: None,
        }
    }
}

impl YokeConfig {
    /// Parse configuration from YAML; absent keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, YokeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| YokeError::Config(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, YokeError> {
        if !path.exists() {
            return Err(YokeError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// `.yokeflow.yaml` in the current directory, then in the home directory,
    /// then defaults.
    pub fn load_default() -> Result<Self, YokeError> {
        for candidate in default_locations() {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "loading configuration");
                return Self::load_from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    pub fn to_yaml(&self) -> Result<String, YokeError> {
        serde_yaml::to_string(self).map_err(|e| YokeError::Config(e.to_string()))
    }

    /// The slice of configuration the live gate consumes.
    pub fn governance(&self) -> GovernanceConfig {
        GovernanceConfig {
            additional_blocked_commands: self.security.additional_blocked_commands.clone(),
            sandbox_backend: self.sandbox.backend,
            container_workdir: self.sandbox.container_workdir.clone(),
            use_container_playwright: self.sandbox.use_container_playwright,
        }
    }
}

/// Immutable governance settings fixed at session start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceConfig {
    pub additional_blocked_commands: Vec<String>,
    pub sandbox_backend: SandboxBackend,
    pub container_workdir: String,
    pub use_container_playwright: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        YokeConfig::default().governance()
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(CONFIG_FILE_NAME));
    }
    locations
}
