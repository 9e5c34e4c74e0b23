use trend_spotter::config::{load_config, AppConfig};
use trend_spotter::session::plan_request;
use trend_spotter::{CacheKey, ComparisonCache, ComparisonReport, ComparisonSession, FetchMode, HttpAnalyticsSource};

use futures::future::join_all;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let source = match HttpAnalyticsSource::from_config(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to initialize analytics source: {}", e);
            return;
        }
    };
    let cache = ComparisonCache::new(source);

    // One session per configured slot, kept across refreshes so edits to
    // the config file show up as changed pairs.
    let mut config = config;
    let mut sessions: Vec<ComparisonSession> = Vec::new();
    loop {
        sessions.resize_with(config.comparisons.len(), ComparisonSession::new);

        let mut requests: Vec<(CacheKey, FetchMode)> = Vec::new();
        for (session, cmp) in sessions.iter_mut().zip(&config.comparisons) {
            match plan_request(session, &cache, &cmp.term_1, &cmp.term_2).await {
                Some(req) if !requests.iter().any(|(k, _)| *k == req.0) => requests.push(req),
                Some((key, _)) => info!("Skipping duplicate comparison {}", key),
                None => {}
            }
        }
        info!("Comparisons to process: {}", requests.len());

        let tasks: Vec<_> = requests
            .iter()
            .map(|(key, mode)| process_comparison(&cache, key, *mode))
            .collect();
        join_all(tasks).await;

        let Some(interval) = config.refresh_interval_seconds else {
            break;
        };

        info!("Waiting for timer ({}s) or Ctrl-C...", interval);
        tokio::select! {
            _ = sleep(Duration::from_secs(interval)) => {
                info!("Timer triggered, refreshing.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                break;
            }
        }

        match load_config(&config_path) {
            Ok(cfg) => config = Arc::new(cfg),
            Err(e) => warn!("Config reload failed, keeping previous config: {}", e),
        }
    }
}

async fn process_comparison(cache: &ComparisonCache, key: &CacheKey, mode: FetchMode) {
    info!("Processing comparison: {}", key);

    let result = match cache.fetch_key(key, mode).await {
        Ok(r) => r,
        Err(e) => {
            warn!("{} failed: {}", key, e.message());
            if let Some(stale) = cache.snapshot(key).await.data {
                info!(
                    "Keeping previous data for {} ('{}' vs '{}')",
                    key, stale.term_a.search_term, stale.term_b.search_term
                );
            }
            return;
        }
    };

    match ComparisonReport::build(&result) {
        Ok(report) => info!("\n{}", report),
        Err(e) => warn!("Failed to build report for {}: {}", key, e),
    }
}
