//! Configuration loading for the payroll console.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `NOMINA_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "NOMINA_";

/// Application configuration derived from `NOMINA_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Root of the payroll REST API; relative routes are joined onto it
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Page ceiling of a full-collection export
    #[serde(default = "default_export_max_pages")]
    pub export_max_pages: usize,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_base_url: default_api_base_url(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            request_timeout_ms: default_request_timeout_ms(),
            export_max_pages: default_export_max_pages(),
            export_dir: default_export_dir(),
            notification_duration_ms: default_notification_duration_ms(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    /// Returns a redacted JSON representation (credentials in the base URL are hidden).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if let Ok(mut url) = Url::parse(&config.api_base_url) {
            if !url.username().is_empty() || url.password().is_some() {
                let _ = url.set_username("REDACTED");
                let _ = url.set_password(None);
                config.api_base_url = url.to_string();
            }
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: self.api_base_url.clone(),
            source,
        })?;

        if self.export_max_pages == 0 {
            return Err(ConfigError::InvalidExportMaxPages {
                value: self.export_max_pages,
            });
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidRequestTimeout {
                value: self.request_timeout_ms,
            });
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_export_max_pages() -> usize {
    7
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_notification_duration_ms() -> u64 {
    3_000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid API base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("export page ceiling must be at least 1, got {value}")]
    InvalidExportMaxPages { value: usize },
    #[error("request timeout must be positive, got {value}ms")]
    InvalidRequestTimeout { value: u64 },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
}

/// Loads configuration using layered `.env` files and `NOMINA_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads `.env`, `.env.local`, `.env.<profile>`, `.env.<profile>.local`
    /// in that order, then the process environment, and validates the result.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_base_url = layered
            .remove("API_BASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_base_url);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(default_log_format);
        let request_timeout_ms = layered
            .remove("REQUEST_TIMEOUT_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_else(default_request_timeout_ms);
        let export_max_pages = layered
            .remove("EXPORT_MAX_PAGES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_else(default_export_max_pages);
        let export_dir = layered
            .remove("EXPORT_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_export_dir);
        let notification_duration_ms = layered
            .remove("NOTIFICATION_DURATION_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_else(default_notification_duration_ms);

        let config = AppConfig {
            profile,
            api_base_url,
            log_level,
            log_format,
            request_timeout_ms,
            export_max_pages,
            export_dir,
            notification_duration_ms,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("NOMINA_PROFILE")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
