use crate::scraper::{
    self, AddonInfo, AddonKind, AddonRegistry, ContentType, ExpressionEngine, HttpClient, Scraper,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Base name of the optional configuration file (`scrapechain.toml`)
const CONFIG_FILE: &str = "scrapechain";

/// Prefix of environment overrides, e.g. `SCRAPECHAIN__LOG__LEVEL=debug`
const ENV_PREFIX: &str = "SCRAPECHAIN";

const DEFAULT_USER_AGENT: &str = concat!("scrapechain/", env!("CARGO_PKG_VERSION"));

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Directory for daily rolling log files; console only when unset
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the response cache (`<cache_root>/scrapers/<id>`)
    pub cache_root: PathBuf,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Cache persistence for addons that do not declare one
    pub default_persistence_hours: u64,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_root: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("scrapechain"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            default_persistence_hours: 24,
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `scrapechain.toml` in the working directory (if present)
    /// and `SCRAPECHAIN__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load with an explicit configuration file instead of the default one
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values the deserializer cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache_root must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn default_persistence(&self) -> Duration {
        Duration::from_secs(self.default_persistence_hours.saturating_mul(60 * 60))
    }

    /// Addon description carrying the configured cache persistence; addons
    /// that declare their own call `with_persistence` afterwards
    pub fn addon(&self, id: &str, kind: AddonKind, program_path: impl Into<PathBuf>) -> AddonInfo {
        AddonInfo::new(id, kind, program_path).with_persistence(self.default_persistence())
    }

    /// Scraper whose response cache lives under `cache_root`
    pub fn scraper(
        &self,
        addon: &AddonInfo,
        content: ContentType,
        engine: Arc<dyn ExpressionEngine>,
        registry: Arc<dyn AddonRegistry>,
    ) -> Scraper {
        Scraper::new(addon, content, engine, registry, &self.cache_root)
    }

    /// HTTP client configured with the user agent and timeout
    pub fn http_client(&self) -> scraper::Result<HttpClient> {
        HttpClient::new(&self.user_agent, self.request_timeout())
    }
}
