use std::time::Duration;

use anyhow::Result;
use ::config::{Environment, File};
use serde::{Deserialize, Serialize};

use crate::assistant::PollSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for plain chat completions when no assistant is configured.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of recent messages echoed back with every chat reply.
    #[serde(default = "default_chat_window")]
    pub chat_window: u32,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_fallback_model() -> String {
    "gpt-4".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_chat_window() -> u32 {
    10
}

fn default_limit() -> u32 {
    20
}

impl Config {
    /// Load configuration from `.env`, an optional config file and the environment.
    ///
    /// The file is taken from `CONFIG_PATH` when set, otherwise `conf.yaml` /
    /// `conf.json` in the working directory is used if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("CONFIG_PATH").ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&str>) -> Result<Self> {
        Self::load_from_env(path, std::env::vars().collect())
    }

    /// Same as [`Config::load_from`], reading variables from `vars` instead of
    /// the process environment.
    pub fn load_from_env(path: Option<&str>, vars: ::config::Map<String, String>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("conf").required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .source(Some(vars.clone())),
            )
            .set_override_option("server.host", vars.get("HOST").cloned())?
            .set_override_option("server.port", vars.get("PORT").cloned())?
            .set_override_option("openai.api_key", vars.get("OPENAI_API_KEY").cloned())?
            .set_override_option(
                "openai.assistant_id",
                vars.get("OPENAI_ASSISTANT_ID").cloned(),
            )?
            .set_override_option("openai.base_url", vars.get("OPENAI_BASE_URL").cloned())?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config.normalized())
    }

    /// Blank credentials are treated the same as missing ones.
    pub fn normalized(mut self) -> Self {
        self.openai.api_key = non_blank(self.openai.api_key.take());
        self.openai.assistant_id = non_blank(self.openai.assistant_id.take());
        self.openai.base_url = self.openai.base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            max_retries: self.polling.max_retries,
            interval: Duration::from_millis(self.polling.interval_ms),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: default_base_url(),
            fallback_model: default_fallback_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            chat_window: default_chat_window(),
            default_limit: default_limit(),
        }
    }
}
