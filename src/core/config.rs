//! Orchestrator configuration loaded from YAML and the environment

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the index endpoint
pub const ENV_ENDPOINT: &str = "ELASTIC_ENDPOINT";
/// Environment variable holding the index API key
pub const ENV_API_KEY: &str = "ELASTIC_API_KEY";
/// Environment variable overriding the index name
pub const ENV_INDEX: &str = "ELASTIC_INDEX";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Connection settings for the remote document index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexServiceConfig {
    /// Base URL of the index service
    pub endpoint: String,

    /// API key sent as `Authorization: ApiKey <credential>`
    #[serde(skip_serializing)]
    pub credential: Option<String>,

    /// Name of the index holding the corpus
    pub index_name: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IndexServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            credential: None,
            index_name: "health-plans".to_string(),
            timeout_secs: 10,
        }
    }
}

impl IndexServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint without a trailing slash, ready for path joining
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

/// Top-level orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub index: IndexServiceConfig,

    /// Number of documents fetched for the post-run sample
    pub sample_size: usize,

    /// Directory the stages run in (defaults to the current directory)
    pub working_dir: Option<PathBuf>,

    /// Container orchestration command used for supporting services
    pub compose_program: String,

    /// Container runtime probed as a prerequisite
    pub container_runtime: String,

    /// Runtime used to launch the content-processing scripts
    pub script_runtime: String,

    /// Seconds to wait after starting the message broker
    pub settle_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            index: IndexServiceConfig::default(),
            sample_size: 3,
            working_dir: None,
            compose_program: "docker-compose".to_string(),
            container_runtime: "docker".to_string(),
            script_runtime: "node".to_string(),
            settle_secs: 10,
        }
    }
}

impl OrchestratorConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: OrchestratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Default config file location, `<config_dir>/corpus-pipeline/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("corpus-pipeline").join("config.yaml"))
    }

    /// Resolve configuration: defaults, then a YAML file, then the environment.
    ///
    /// An explicit `path` must exist. The default location is only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::from_file(default)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            self.index.endpoint = endpoint;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.index.credential = Some(key);
        }
        if let Some(index) = lookup(ENV_INDEX).filter(|v| !v.is_empty()) {
            self.index.index_name = index;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.index.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Invalid("index endpoint is empty".to_string()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "index endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }
        if self.index.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid("index name is empty".to_string()));
        }
        if self.index.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if !(1..=100).contains(&self.sample_size) {
            return Err(ConfigError::Invalid(format!(
                "sample_size must be between 1 and 100, got {}",
                self.sample_size
            )));
        }
        Ok(())
    }

    /// Directory stages run in
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}
