use std::env;
use std::fmt::Display;
use std::str::FromStr;

use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub bind_addr: String,
    pub admin_username: String,
    pub admin_password: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub public_page_size: u32,
    pub max_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: "feedback.db".into(),
            bind_addr: "127.0.0.1:3004".into(),
            admin_username: "admin".into(),
            admin_password: "password123".into(),
            session_secret: Uuid::new_v4().simple().to_string(),
            session_ttl_hours: 24,
            cookie_secure: false,
            public_page_size: 5,
            max_page_size: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        let defaults = Config::default();

        let admin_username = var("ADMIN_USERNAME").unwrap_or_else(|| {
            warn!("ADMIN_USERNAME not set, using default admin account name");
            defaults.admin_username.clone()
        });
        let admin_password = var("ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("ADMIN_PASSWORD not set, using the default password; set it before going live");
            defaults.admin_password.clone()
        });
        let session_secret = var("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, generated one; admin sessions end on restart");
            defaults.session_secret.clone()
        });

        let config = Config {
            db_path: var("FEEDBACK_DB_PATH").unwrap_or(defaults.db_path),
            bind_addr: var("FEEDBACK_BIND_ADDR").unwrap_or(defaults.bind_addr),
            admin_username,
            admin_password,
            session_secret,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            cookie_secure: parse_or("COOKIE_SECURE", defaults.cookie_secure)?,
            public_page_size: parse_or("PUBLIC_PAGE_SIZE", defaults.public_page_size)?,
            max_page_size: parse_or("MAX_PAGE_SIZE", defaults.max_page_size)?,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.session_ttl_hours < 1 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_HOURS",
                message: "must be at least 1".into(),
            });
        }
        if self.public_page_size < 1 || self.max_page_size < self.public_page_size {
            return Err(ConfigError::Invalid {
                key: "PUBLIC_PAGE_SIZE",
                message: format!(
                    "must be between 1 and MAX_PAGE_SIZE ({})",
                    self.max_page_size
                ),
            });
        }
        Ok(())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("'{raw}': {e}"),
        }),
    }
}
