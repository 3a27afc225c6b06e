use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cache::DEFAULT_DATA_TTL;
use crate::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};

pub const DEFAULT_BASE_URL: &str = "https://github-stats.yourdomain.dev";

#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub token; only the binary's GraphQL client needs it.
    pub access_token: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// TTL of the raw-data cache tier.
    pub data_ttl: Duration,
    pub sweep_interval: Duration,
    /// Public URL used in generated Markdown snippets.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            rate_limit_max: DEFAULT_MAX_REQUESTS,
            rate_limit_window: DEFAULT_WINDOW,
            data_ttl: DEFAULT_DATA_TTL,
            sweep_interval: Duration::from_secs(60),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            access_token: lookup("ACCESS_TOKEN").filter(|t| !t.is_empty()),
            rate_limit_max: parse_or(&lookup, "STATCARD_RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window: secs_or(
                &lookup,
                "STATCARD_RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window,
            )?,
            data_ttl: secs_or(&lookup, "STATCARD_DATA_TTL_SECS", defaults.data_ttl)?,
            sweep_interval: secs_or(
                &lookup,
                "STATCARD_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval,
            )?,
            base_url: lookup("STATCARD_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}
