use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use gifoff_storage::services::RatingConfig;
use gifoff_storage::services::locks::DEFAULT_LOCK_TIMEOUT;
use gifoff_storage::services::notify::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    pub api_keys: String,
    pub group_lock_timeout: Duration,
    pub notification_queue: usize,
    pub rating: RatingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let rating = rating_from_env()?;

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            group_lock_timeout: Duration::from_millis(env_or(
                "GROUP_LOCK_TIMEOUT_MS",
                DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
            )?),
            notification_queue: env_or("NOTIFICATION_QUEUE", DEFAULT_QUEUE_CAPACITY)?,
            rating,
        })
    }
}

fn rating_from_env() -> Result<RatingConfig> {
    let defaults = RatingConfig::default();
    let rating = RatingConfig {
        mu: env_or("RATING_MU", defaults.mu)?,
        sigma: env_or("RATING_SIGMA", defaults.sigma)?,
        beta: env_or("RATING_BETA", defaults.beta)?,
        tau: env_or("RATING_TAU", defaults.tau)?,
        draw_probability: env_or("RATING_DRAW_PROBABILITY", defaults.draw_probability)?,
    };

    ensure!(rating.sigma > 0.0, "RATING_SIGMA must be positive");
    ensure!(rating.beta > 0.0, "RATING_BETA must be positive");
    ensure!(rating.tau >= 0.0, "RATING_TAU must not be negative");
    ensure!(
        (0.0..1.0).contains(&rating.draw_probability),
        "RATING_DRAW_PROBABILITY must be in [0, 1)"
    );

    Ok(rating)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {value}")),
        Err(_) => Ok(default),
    }
}
