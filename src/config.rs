use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_SET_SIZE, DEFAULT_WINDOW_SIZE, clamp_window_size,
};
use crate::error::Result;
use gnd_protocol::SequenceVersion;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub metadata_url: String,
    pub record_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            metadata_url: "http://localhost/gnd/metadata".to_string(),
            record_url: "http://localhost/gnd/record".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub window_size: u32,
    /// Diagrams per record request.
    pub set_size: usize,
    /// Record requests per "show more".
    pub batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            set_size: DEFAULT_SET_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub requested_version: SequenceVersion,
    /// When set, the search loads the members of this UniRef cluster.
    pub uniref_id: Option<String>,
    /// Search run on startup, e.g. a cluster number.
    pub initial_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas_width: f64,
    pub orient_query_forward: bool,
    pub show_center_guide: bool,
    /// Page the UniRef expand links point to; no links are drawn when unset.
    pub expand_base_url: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1000.0,
            orient_query_forward: true,
            show_center_guide: false,
            expand_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GndConfig {
    pub job_id: String,
    pub job_key: String,
    pub api: ApiConfig,
    pub retrieval: RetrievalConfig,
    pub sequence: SequenceConfig,
    pub render: RenderConfig,
}

impl GndConfig {
    /// Reads a TOML config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let toml_str = read_to_string(path)?;
        let config = Self::from_toml(&toml_str)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.retrieval.window_size = clamp_window_size(config.retrieval.window_size);
        Ok(config)
    }
}
