use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::rate_limit::{LimitRule, RateLimits};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Where cached answers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    File,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(CacheBackend::File),
            "memory" => Ok(CacheBackend::Memory),
            other => bail!("CACHE_BACKEND must be 'file' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Résumé sections, `roles/` and `system_instruction.json`.
    pub data_dir: PathBuf,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,

    pub cache_enabled: bool,
    pub cache_backend: CacheBackend,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    /// Zero disables the background sweep.
    pub cache_sweep_interval: Duration,

    pub rate_limit_enabled: bool,
    pub rate_limit_window: Duration,
    pub rate_limit_chat_requests: usize,
    pub rate_limit_roles_requests: usize,
    pub rate_limit_general_requests: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            port: parse_env("PORT", 5000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            cors_origins: parse_origins(&std::env::var("CORS_ORIGINS").unwrap_or_default()),

            cache_enabled: flag_env("CACHE_ENABLED", true)?,
            cache_backend: parse_env("CACHE_BACKEND", CacheBackend::File)?,
            cache_dir: std::env::var("CACHE_DIR")
                .unwrap_or_else(|_| "cache".to_string())
                .into(),
            cache_ttl: Duration::from_secs(parse_env("CACHE_TTL", 86_400)?),
            cache_sweep_interval: Duration::from_secs(parse_env("CACHE_SWEEP_INTERVAL", 600)?),

            rate_limit_enabled: flag_env("RATE_LIMIT_ENABLED", true)?,
            rate_limit_window: Duration::from_secs(parse_env("RATE_LIMIT_WINDOW", 60)?),
            rate_limit_chat_requests: parse_env("RATE_LIMIT_CHAT_REQUESTS", 5)?,
            rate_limit_roles_requests: parse_env("RATE_LIMIT_ROLES_REQUESTS", 20)?,
            rate_limit_general_requests: parse_env("RATE_LIMIT_GENERAL_REQUESTS", 30)?,
        })
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            chat: LimitRule::new(self.rate_limit_chat_requests, self.rate_limit_window),
            roles: LimitRule::new(self.rate_limit_roles_requests, self.rate_limit_window),
            general: LimitRule::new(self.rate_limit_general_requests, self.rate_limit_window),
        }
    }

    pub fn roles_dir(&self) -> PathBuf {
        self.data_dir.join("roles")
    }

    pub fn system_instruction_path(&self) -> PathBuf {
        self.data_dir.join("system_instruction.json")
    }

    /// Defaults with data and cache under `dir`, no environment involved.
    #[cfg(test)]
    pub fn for_tests(dir: &std::path::Path) -> Self {
        let limits = RateLimits::default();
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            data_dir: dir.to_path_buf(),
            cors_origins: None,
            cache_enabled: true,
            cache_backend: CacheBackend::Memory,
            cache_dir: dir.join("cache"),
            cache_ttl: Duration::from_secs(3600),
            cache_sweep_interval: Duration::ZERO,
            rate_limit_enabled: true,
            rate_limit_window: limits.chat.window,
            rate_limit_chat_requests: limits.chat.max_requests,
            rate_limit_roles_requests: limits.roles.max_requests,
            rate_limit_general_requests: limits.general.max_requests,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

fn flag_env(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw).with_context(|| format!("{key} must be a boolean, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_origins(raw: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        None
    } else {
        Some(origins)
    }
}
