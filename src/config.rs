//! Environment configuration, read once at startup.

use std::path::PathBuf;

use thiserror::Error;

pub const APP_NAME: &str = "Labsight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> String {
    format!("{}=info,tower_http=info", env!("CARGO_PKG_NAME"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream credential, never logged.
    pub api_key: String,
    pub upstream_base_url: String,
    pub model: String,
    pub port: u16,
    pub upstream_timeout_secs: u64,
    /// Request schema-validated output from the upstream API.
    pub structured_output: bool,
    pub max_upload_bytes: usize,
    /// CORS origin; unset means permissive (local development).
    pub allowed_origin: Option<String>,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        Ok(Self {
            api_key,
            upstream_base_url: var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            model: var_or("GEMINI_MODEL", "gemini-1.5-flash"),
            port: parse_or("PORT", 3001)?,
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", 120)?,
            structured_output: parse_or("STRUCTURED_OUTPUT", true)?,
            max_upload_bytes: parse_or::<usize>("MAX_UPLOAD_MB", 20)? * 1024 * 1024,
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("labsight-uploads")),
        })
    }
}

fn var_or(var: &'static str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}
