use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("invalid value for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_db_connections: u32,
    pub seed_demo_data: bool,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://studydol.db?mode=rwc")?,
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:3000")?,
            upload_dir: try_load("UPLOAD_DIR", "public/uploads")?,
            max_db_connections: try_load("MAX_DB_CONNECTIONS", "5")?,
            seed_demo_data: try_load("SEED_DEMO_DATA", "false")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError {
            key,
            reason: e.to_string(),
        })
}
