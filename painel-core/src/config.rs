use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct PainelConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub import: ImportConfig,
    pub llm: LlmConfig,
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// "postgres" or "memory"
    pub backend: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8780,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    pub default_company_id: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_company_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    pub base_url: String,
    pub calendar_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Seconds without activity before a chat session is discarded.
    pub idle_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
        }
    }
}

impl PainelConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
