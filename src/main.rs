use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statcard::{CachePolicy, CardParams, CardService, Config, GithubClient, MemoryStore, RateLimiter};

const CLI_CLIENT: &str = "cli";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statcard=info")),
        )
        .init();

    let config = Config::from_env()?;

    // key=value arguments, same names as the query string
    let mut out = None;
    let mut pairs = Vec::new();
    for arg in std::env::args().skip(1) {
        let Some((key, value)) = arg.split_once('=') else {
            warn!(%arg, "ignoring argument without '='");
            continue;
        };
        if key == "out" {
            out = Some(value.to_string());
        } else {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    let params = CardParams::from_pairs(pairs);

    let token = config
        .access_token
        .clone()
        .context("ACCESS_TOKEN must be set to query GitHub")?;
    let client = GithubClient::new(token)?;

    let limiter = RateLimiter::in_memory(config.rate_limit_max, config.rate_limit_window);
    let sweeper = limiter.spawn_sweeper(config.sweep_interval);
    let store = Arc::new(MemoryStore::new());
    let cache_sweeper = store.spawn_sweeper(config.sweep_interval);
    let cache = CachePolicy::new(store).with_data_ttl(config.data_ttl);
    let service = CardService::new(Arc::new(client), cache, limiter)
        .with_base_url(config.base_url.clone());

    let response = service.respond(CLI_CLIENT, &params).await;
    sweeper.abort();
    cache_sweeper.abort();

    let path = out.unwrap_or_else(|| format!("{}.svg", params.user));
    fs::write(&path, &response.body).with_context(|| format!("Failed to write {path}"))?;

    if response.status == 200 {
        info!(%path, "Generated card");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(%path, status = response.status, "Wrote error card");
        Ok(ExitCode::FAILURE)
    }
}
