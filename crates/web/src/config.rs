use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    /// Seconds between in-process sweeps; 0 leaves sweeping to an external scheduler.
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            sweep_interval_secs: match std::env::var("SWEEP_INTERVAL_SECS") {
                Ok(raw) => raw
                    .parse()
                    .context("SWEEP_INTERVAL_SECS must be a number of seconds")?,
                Err(_) => 86_400,
            },
        })
    }
}
