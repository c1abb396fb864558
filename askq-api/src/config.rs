use askq_llm_sdk::providers;
use askq_llm_sdk::retry::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::answer::Locale;

const ENV_PREFIX: &str = "ASKQ";
const LOCAL_CONFIG_FILE: &str = "askq.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub graphql: GraphQlConfig,
    pub cors: CorsConfig,
    pub store: StoreConfig,
    pub answer: AnswerConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GraphQlConfig {
    pub path: String,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            path: "/graphql".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    /// `"*"` allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of stored questions; unbounded when unset
    pub capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Simulated,
    Agent,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AnswerConfig {
    pub mode: AnswerMode,
    pub locale: Locale,
    /// Overall deadline for an agent answer, retries included
    pub timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            mode: AnswerMode::Simulated,
            locale: Locale::En,
            timeout_secs: 30,
        }
    }
}

impl AnswerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// `agent` (generic HTTP endpoint) or `workers_ai`
    pub provider: String,
    pub base_url: Option<String>,
    pub account_id: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            provider: providers::AGENT.to_string(),
            base_url: None,
            account_id: None,
            api_key: None,
            model: None,
            request_timeout_secs: 30,
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            max_delay_ms: retry.max_delay.as_millis() as u64,
        }
    }
}

impl AgentConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Daily rolling log files are written here when set
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl ApiConfig {
    /// Load defaults, then the config file, then `ASKQ__*` environment variables.
    ///
    /// An explicit `path` must exist. Without one, `./askq.toml` and then
    /// `<config dir>/askq/api.toml` are used if present. Returns the file that
    /// was read, if any.
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let config_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };
        let config = Self::load_from(config_path.as_deref(), env_source())?;
        Ok((config, config_path))
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        let config: ApiConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.graphql.path.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "graphql.path must start with '/': {}",
                self.graphql.path
            )));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Message(
                "server.max_body_bytes must be positive".to_string(),
            ));
        }
        if self.store.capacity == Some(0) {
            return Err(ConfigError::Message(
                "store.capacity must be positive when set".to_string(),
            ));
        }
        if self.answer.mode == AnswerMode::Agent && self.answer.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "answer.timeout_secs must be positive in agent mode".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("askq/api.toml"))
        .filter(|path| path.exists())
}
