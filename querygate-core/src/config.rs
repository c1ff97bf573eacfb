use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete runtime configuration, read once at startup and never reloaded.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct QueryGateConfig {
    pub database: DatabaseConfig,
    pub pool: PoolConfig,
    pub memory: MemoryConfig,
    pub llm: LlmConfig,
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    /// Namespace introspected for the schema snapshot
    pub schema: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PoolConfig {
    pub size: u32,
    pub max_overflow: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub statement_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    /// Entries rendered into each prompt. Must be at least 1; `load` rejects 0.
    pub window_size: usize,
    /// Per-entry outcome truncation, in characters
    pub summary_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Stub,
    OpenAI,
    Ollama,
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Fixed reply of the deterministic stub backend
    pub stub_response: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: None,
            user: None,
            password: None,
            ssl_mode: "prefer".to_string(),
            schema: "public".to_string(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            max_overflow: 10,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 300,
            statement_timeout_secs: None,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            summary_chars: 200,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Stub,
            model: None,
            api_key: None,
            base_url: None,
            max_tokens: 1024,
            temperature: 0.0,
            stub_response: "SELECT 1".to_string(),
        }
    }
}

// Secrets stay out of Debug output and therefore out of logs
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ssl_mode", &self.ssl_mode)
            .field("schema", &self.schema)
            .finish()
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl DatabaseConfig {
    /// Required connection settings that are absent or blank
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("name", &self.name),
            ("user", &self.user),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(field, _)| field.to_string())
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl PoolConfig {
    /// Hard ceiling on open connections: base size plus burst overflow
    pub fn max_connections(&self) -> u32 {
        self.size.saturating_add(self.max_overflow).max(1)
    }
}

impl QueryGateConfig {
    /// Loads defaults, then the TOML file, then `QUERYGATE_*` and legacy `DB_*` variables.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::from(default_config_path()).required(false),
        };

        let builder = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("QUERYGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: QueryGateConfig = builder.try_deserialize()?;
        config.apply_legacy_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that deserialize fine but cannot be honoured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.window_size == 0 {
            return Err(ConfigError::Message(
                "memory.window_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the flat `DB_*` and `OPENAI_API_KEY` variables on top of everything else.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.database.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Message(format!("DB_PORT is not a valid port: {port}")))?;
        }
        if let Some(name) = lookup("DB_NAME") {
            self.database.name = Some(name);
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(ssl_mode) = lookup("DB_SSL_MODE") {
            self.database.ssl_mode = ssl_mode;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            if self.llm.api_key.is_none() {
                self.llm.api_key = Some(key);
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("querygate/querygate.toml")
    } else {
        PathBuf::from("querygate.toml")
    }
}
