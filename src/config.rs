use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Clone, Debug)] // Clone needed if passed around, Debug for logging
pub struct Config {
    pub bind_address: SocketAddr,
    // Path to the SQLite file; ":memory:" keeps everything in RAM
    pub database_path: String,
    pub memes_page_size: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();

        let bind_address_str = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "memes.sqlite3".to_string());
        if database_path.trim().is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_PATH".into()));
        }

        let memes_page_size = match env::var("MEMES_PAGE_SIZE") {
            Ok(raw) => parse_page_size(&raw)?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Config {
            bind_address,
            database_path,
            memes_page_size,
        })
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn parse_page_size(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidVar("MEMES_PAGE_SIZE".into(), reason);
    let size = raw.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if size == 0 {
        return Err(invalid("page size must be at least 1".to_string()));
    }
    Ok(size)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_path: "memes.sqlite3".to_string(),
            memes_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
