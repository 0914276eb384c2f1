use crate::error::{DuckPanelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_threads() -> Option<u32> {
    std::env::var("DUCKPANEL_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
}

fn default_extensions() -> Vec<String> {
    vec!["httpfs".to_string()]
}

/// A remote file exposed to queries as the table `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFrameLink {
    #[serde(default)]
    pub id: u32,
    pub url: String,
    pub alias: String,
}

const REMOTE_SCHEMES: [&str; 6] = ["http://", "https://", "s3://", "gs://", "gcs://", "az://"];

impl DataFrameLink {
    /// Whether reading `url` needs a network extension such as `httpfs`.
    pub fn is_remote(&self) -> bool {
        let url = self.url.to_ascii_lowercase();
        REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
    }

    pub fn new(id: u32, url: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Database file; in-memory when unset.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Extensions installed and loaded when any link has a remote URL.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_threads")]
    pub threads: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: None,
            extensions: default_extensions(),
            threads: default_threads(),
        }
    }
}

impl EngineConfig {
    /// In-memory database with no extensions.
    pub fn offline() -> Self {
        Self {
            database: None,
            extensions: Vec::new(),
            threads: None,
        }
    }

    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }
}

/// Persisted data-source settings: the `dataFrames` list plus engine options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSettings {
    #[serde(default)]
    pub data_frames: Vec<DataFrameLink>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DataSourceSettings {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DuckPanelError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Err(DuckPanelError::Config(format!(
                "Unsupported settings format: {}",
                path.display()
            ))),
        }
    }
}
