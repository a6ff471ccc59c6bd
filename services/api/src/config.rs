//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use jsonwebtoken::Algorithm;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// Origins allowed by CORS when `CORS_ORIGINS` is not set.
const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:8000",
    "http://127.0.0.1:3000",
];

/// Longest token lifetime accepted, ten years.
pub const MAX_EXPIRE_MINUTES: i64 = 60 * 24 * 365 * 10;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Secrets, algorithm and lifetimes for the two token classes.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub algorithm: Algorithm,
    pub access_expire_minutes: i64,
    pub refresh_expire_minutes: i64,
}

// Secrets stay out of logs.
impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("algorithm", &self.algorithm)
            .field("access_expire_minutes", &self.access_expire_minutes)
            .field("refresh_expire_minutes", &self.refresh_expire_minutes)
            .finish_non_exhaustive()
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage_dir: PathBuf,
    pub accounts_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
    pub tokens: TokenSettings,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        // --- Load Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./db"));
        let accounts_path = lookup("ACCOUNTS_PATH").map(PathBuf::from);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        // --- Load Token Settings (all required) ---
        let access_secret = required("SECRET_KEY")?;
        let refresh_secret = required("REFRESH_SECRET_KEY")?;
        if access_secret.is_empty() {
            return Err(invalid("SECRET_KEY", "must not be empty"));
        }
        if refresh_secret.is_empty() {
            return Err(invalid("REFRESH_SECRET_KEY", "must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(invalid("REFRESH_SECRET_KEY", "must differ from SECRET_KEY"));
        }

        let algorithm_str = required("ALGORITHM")?;
        let algorithm = Algorithm::from_str(&algorithm_str)
            .map_err(|_| invalid("ALGORITHM", &format!("'{}' is not a known algorithm", algorithm_str)))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(invalid("ALGORITHM", "only HS256, HS384 and HS512 are supported"));
        }

        let access_expire_minutes = parse_minutes("ACCESS_EXPIRE_MINUTES", &required("ACCESS_EXPIRE_MINUTES")?)?;
        let refresh_expire_minutes =
            parse_minutes("REFRESH_EXPIRE_MINUTES", &required("REFRESH_EXPIRE_MINUTES")?)?;

        Ok(Self {
            bind_address,
            log_level,
            storage_dir,
            accounts_path,
            cors_origins,
            tokens: TokenSettings {
                access_secret,
                refresh_secret,
                algorithm,
                access_expire_minutes,
                refresh_expire_minutes,
            },
        })
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), reason.to_string())
}

fn parse_minutes(key: &str, value: &str) -> Result<i64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(minutes) if minutes > MAX_EXPIRE_MINUTES => Err(invalid(
            key,
            &format!("{} minutes exceeds the maximum of {}", minutes, MAX_EXPIRE_MINUTES),
        )),
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(invalid(key, &format!("'{}' is not a positive number of minutes", value))),
    }
}
