use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Upload secrets that MUST NOT be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub store_timeout: Duration,
    pub reader_pool_size: usize,
    pub upload_endpoint: String,
    pub upload_public_url: String,
    pub upload_secret: String,
    pub upload_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = var("TIDEPOOL_PORT", "3000")
            .parse()
            .context("TIDEPOOL_PORT must be a port number")?;
        let store_timeout_ms: u64 = var("TIDEPOOL_STORE_TIMEOUT_MS", "5000")
            .parse()
            .context("TIDEPOOL_STORE_TIMEOUT_MS must be a number of milliseconds")?;
        let reader_pool_size: usize = var("TIDEPOOL_READER_POOL_SIZE", "4")
            .parse()
            .context("TIDEPOOL_READER_POOL_SIZE must be a number")?;
        let upload_ttl_secs: u64 = var("TIDEPOOL_UPLOAD_TTL_SECS", "60")
            .parse()
            .context("TIDEPOOL_UPLOAD_TTL_SECS must be a number of seconds")?;

        let upload_secret = lookup("TIDEPOOL_UPLOAD_SECRET").unwrap_or_default();
        if upload_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&upload_secret.as_str()) {
            bail!("TIDEPOOL_UPLOAD_SECRET is unset or still a placeholder");
        }

        let upload_endpoint = var("TIDEPOOL_UPLOAD_ENDPOINT", "http://localhost:9000/tidepool");
        let upload_public_url = lookup("TIDEPOOL_UPLOAD_PUBLIC_URL").unwrap_or_else(|| upload_endpoint.clone());

        Ok(Self {
            db_path: var("TIDEPOOL_DB_PATH", "tidepool.db").into(),
            host: var("TIDEPOOL_HOST", "0.0.0.0"),
            port,
            store_timeout: Duration::from_millis(store_timeout_ms),
            reader_pool_size,
            upload_endpoint,
            upload_public_url,
            upload_secret,
            upload_ttl: Duration::from_secs(upload_ttl_secs),
        })
    }
}
