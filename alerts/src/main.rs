use std::sync::Arc;

use alerts::{
    config::AppConfig,
    db::Db,
    market::YahooPriceSource,
    metrics::counters::Counters,
    notify::{Broadcaster, RelayPushDelivery},
    pipeline::{SignalPipeline, run_signal_poller},
    signal_state::{JsonFileSignalStateStore, SignalStateStore, SqlxSignalStateStore},
    subscription::{SqlxSubscriptionRepository, SubscriptionRepository},
};
use anyhow::Context;
use common::logger::init_tracing;
use market::MaCrossover;

/// Picks the file-backed state store when a path is configured, otherwise a
/// row in the shared database.
fn state_store(cfg: &AppConfig, db: &Db) -> Arc<dyn SignalStateStore> {
    match &cfg.signal_state_path {
        Some(path) => {
            tracing::info!(path = %path, "signal state: json file");
            Arc::new(JsonFileSignalStateStore::new(path))
        }
        None => {
            tracing::info!("signal state: database");
            Arc::new(SqlxSignalStateStore::new(db.pool.clone(), cfg.symbol.clone()))
        }
    }
}

fn build_pipeline(cfg: &AppConfig, db: &Db) -> anyhow::Result<SignalPipeline> {
    let signal = MaCrossover::new(cfg.short_window, cfg.long_window)
        .context("invalid SHORT_WINDOW / LONG_WINDOW")?;

    let prices = Arc::new(YahooPriceSource::new(
        cfg.yahoo_base_url.clone(),
        cfg.price_interval.clone(),
        cfg.price_range.clone(),
        cfg.http_timeout,
    )?);

    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(SqlxSubscriptionRepository::new(db.pool.clone()));
    let delivery = Arc::new(RelayPushDelivery::new(
        cfg.push_relay_url.clone(),
        cfg.push_ttl_secs,
        cfg.http_timeout,
    )?);
    let notifier = Arc::new(Broadcaster::new(
        subscriptions,
        delivery,
        cfg.notification_url.clone(),
    ));

    Ok(SignalPipeline::new(
        cfg.symbol.clone(),
        signal,
        prices,
        state_store(cfg, db),
        notifier,
        cfg.first_run_policy,
        Counters::default(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing("crossover-alerts", is_production);

    tracing::info!("Starting crossover alert service...");

    let cfg = AppConfig::from_env()?;

    let db = Db::connect(&cfg.database_url)
        .await
        .context("connect database")?;
    db.migrate().await.context("migrate database")?;

    let pipeline = Arc::new(build_pipeline(&cfg, &db)?);

    tracing::info!(
        symbol = %cfg.symbol,
        short_window = cfg.short_window,
        long_window = cfg.long_window,
        first_run = ?cfg.first_run_policy,
        "pipeline ready"
    );

    let poller = tokio::spawn(run_signal_poller(pipeline, cfg.poll_interval));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    poller.abort();

    Ok(())
}
