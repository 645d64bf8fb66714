//! Configuration loading for the showroom service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `SHOWROOM_`, producing a typed [`AppConfig`]. The unprefixed variables a
//! bundled front-end build already uses (`VITE_SUPABASE_URL`,
//! `VITE_SUPABASE_ANON_KEY`, `PORT`) are honored as fallbacks.

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::backend::BackendConfig;

const PREFIX: &str = "SHOWROOM_";

/// Unprefixed keys accepted as fallbacks, mapped to the key they stand in for.
const ALIASES: [(&str, &str); 3] = [
    ("VITE_SUPABASE_URL", "BACKEND_URL"),
    ("VITE_SUPABASE_ANON_KEY", "BACKEND_ANON_KEY"),
    ("PORT", "PORT"),
];

/// Application configuration derived from `SHOWROOM_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Directory holding the built UI bundle (`index.html` and assets)
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_anon_key: Option<String>,
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    /// Increment the price slider ceiling is rounded up to
    #[serde(default = "default_price_step")]
    pub price_step: f64,
    #[serde(default = "default_sales_page_limit")]
    pub sales_page_limit: usize,
    #[serde(default = "default_recent_sales_limit")]
    pub recent_sales_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            dist_dir: default_dist_dir(),
            backend_url: None,
            backend_anon_key: None,
            backend_timeout_ms: default_backend_timeout_ms(),
            storage_bucket: default_storage_bucket(),
            price_step: default_price_step(),
            sales_page_limit: default_sales_page_limit(),
            recent_sales_limit: default_recent_sales_limit(),
        }
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_backend_timeout_ms() -> u64 {
    10_000
}

fn default_storage_bucket() -> String {
    "car-images".to_string()
}

fn default_price_step() -> f64 {
    10_000.0
}

fn default_sales_page_limit() -> usize {
    250
}

fn default_recent_sales_limit() -> usize {
    8
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Both backend values are present and non-blank.
    pub fn is_backend_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.backend_url) && present(&self.backend_anon_key)
    }

    /// Backend connection settings, `None` when the backend is not configured.
    pub fn backend_config(&self) -> Result<Option<BackendConfig>, ConfigError> {
        if !self.is_backend_configured() {
            return Ok(None);
        }
        let raw = self.backend_url.as_deref().unwrap_or_default().trim();
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBackendUrl {
            value: raw.to_string(),
            source,
        })?;
        Ok(Some(BackendConfig {
            url,
            anon_key: self
                .backend_anon_key
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            timeout: Duration::from_millis(self.backend_timeout_ms),
            bucket: self.storage_bucket.clone(),
        }))
    }

    /// Returns a redacted JSON representation (the backend key is hidden).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.backend_anon_key.is_some() {
            config.backend_anon_key = Some("[REDACTED]".to_string());
        }
        serde_json::to_string_pretty(&config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
                source,
            })?;

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if let Some(raw) = self.backend_url.as_deref().map(str::trim)
            && !raw.is_empty()
        {
            let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBackendUrl {
                value: raw.to_string(),
                source,
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedBackendScheme {
                    value: raw.to_string(),
                });
            }
        }

        if self.backend_timeout_ms == 0 {
            return Err(ConfigError::MustBePositive {
                key: "BACKEND_TIMEOUT_MS",
            });
        }
        if !(self.price_step.is_finite() && self.price_step > 0.0) {
            return Err(ConfigError::MustBePositive { key: "PRICE_STEP" });
        }
        if self.sales_page_limit == 0 {
            return Err(ConfigError::MustBePositive {
                key: "SALES_PAGE_LIMIT",
            });
        }
        if self.recent_sales_limit == 0 {
            return Err(ConfigError::MustBePositive {
                key: "RECENT_SALES_LIMIT",
            });
        }
        if self.storage_bucket.trim().is_empty() {
            return Err(ConfigError::MustBePositive {
                key: "STORAGE_BUCKET",
            });
        }

        Ok(())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid PORT '{value}'")]
    InvalidPort { value: String },
    #[error("invalid backend url '{value}': {source}")]
    InvalidBackendUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("backend url '{value}' must use http or https")]
    UnsupportedBackendScheme { value: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be positive")]
    MustBePositive { key: &'static str },
}

/// Loads configuration using layered `.env` files and `SHOWROOM_*` env vars.
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

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, mut aliases, profile_hint) = self.collect_layered_env()?;

        // Process environment last so it wins.
        for (key, value) in env::vars() {
            absorb(&key, value, &mut layered, &mut aliases);
        }

        // Prefixed keys take precedence over their aliases.
        for (key, value) in aliases {
            layered.entry(key).or_insert(value);
        }

        let text = |layered: &mut BTreeMap<String, String>, key: &str| {
            layered.remove(key).filter(|v| !v.trim().is_empty())
        };

        let profile = text(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let mut api_bind_addr =
            text(&mut layered, "API_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        if let Some(port) = text(&mut layered, "PORT") {
            api_bind_addr = with_port(&api_bind_addr, &port)?;
        }

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level: text(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level),
            log_format: text(&mut layered, "LOG_FORMAT")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(default_log_format),
            dist_dir: text(&mut layered, "DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_dist_dir),
            backend_url: text(&mut layered, "BACKEND_URL"),
            backend_anon_key: text(&mut layered, "BACKEND_ANON_KEY"),
            backend_timeout_ms: number(&mut layered, "BACKEND_TIMEOUT_MS")?
                .unwrap_or_else(default_backend_timeout_ms),
            storage_bucket: text(&mut layered, "STORAGE_BUCKET")
                .unwrap_or_else(default_storage_bucket),
            price_step: number(&mut layered, "PRICE_STEP")?.unwrap_or_else(default_price_step),
            sales_page_limit: number(&mut layered, "SALES_PAGE_LIMIT")?
                .unwrap_or_else(default_sales_page_limit),
            recent_sales_limit: number(&mut layered, "RECENT_SALES_LIMIT")?
                .unwrap_or_else(default_recent_sales_limit),
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(
        &self,
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();
        let mut aliases = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values, &mut aliases)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values, &mut aliases)?;

        let profile = env::var(format!("{PREFIX}PROFILE"))
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
            &mut aliases,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
            &mut aliases,
        )?;

        Ok((values, aliases, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
        aliases: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    absorb(&key, value, values, aliases);
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

fn absorb(
    key: &str,
    value: String,
    values: &mut BTreeMap<String, String>,
    aliases: &mut BTreeMap<String, String>,
) {
    if let Some(stripped) = key.strip_prefix(PREFIX) {
        values.insert(stripped.to_string(), value);
    } else if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
        aliases.insert((*target).to_string(), value);
    }
}

fn number<T: std::str::FromStr>(
    layered: &mut BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match layered.remove(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn with_port(bind_addr: &str, port: &str) -> Result<String, ConfigError> {
    let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidPort {
        value: port.to_string(),
    })?;
    let mut addr: SocketAddr = bind_addr
        .parse()
        .map_err(|source| ConfigError::InvalidBindAddr {
            value: bind_addr.to_string(),
            source,
        })?;
    addr.set_port(port);
    Ok(addr.to_string())
}
