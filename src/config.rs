// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:9117";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3:8b";
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TELEGRAM_TOKEN is not set; put it in .env or the environment")]
    MissingToken,
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AdviceConfig {
    pub host: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_OLLAMA_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: Option<String>,
    /// `None` means the platform data dir.
    pub database_path: Option<PathBuf>,
    pub advice: AdviceConfig,
    pub sessions: SessionBackend,
    pub poll_timeout: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs = match get("OLLAMA_TIMEOUT") {
            Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "OLLAMA_TIMEOUT",
                expected: "a number of seconds",
                value: v.clone(),
            })?,
            None => DEFAULT_OLLAMA_TIMEOUT_SECS,
        };
        let sessions = match get("SESSION_STORE").as_deref() {
            None | Some("sqlite") => SessionBackend::Sqlite,
            Some("memory") => SessionBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SESSION_STORE",
                    expected: "'sqlite' or 'memory'",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            telegram_token: get("TELEGRAM_TOKEN"),
            database_path: get("DB_URL").map(|url| database_path_from_url(&url)),
            advice: AdviceConfig {
                host: get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
                model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                temperature: DEFAULT_TEMPERATURE,
            },
            sessions,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        })
    }

    /// The bot token; only `run` needs it, and there it is fatal when absent.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.telegram_token
            .as_deref()
            .ok_or(ConfigError::MissingToken)
    }
}

/// Accepts `sqlite:///finance_bot.db`, `sqlite://finance_bot.db` or a plain path.
pub fn database_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}
