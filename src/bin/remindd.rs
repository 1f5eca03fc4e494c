use anyhow::Result;
use async_trait::async_trait;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use remindd::{Config, DeliveryTransport, FileReminderStore, ReminderScheduler};

/// Transport that writes deliveries to the log. Stands in for a real chat
/// backend so the daemon runs end-to-end on its own.
struct LogTransport;

#[async_trait]
impl DeliveryTransport for LogTransport {
    async fn send_direct(&self, destination: &str, message: &str) -> Result<()> {
        info!("[direct] {destination}: {message}");
        Ok(())
    }

    async fn send_broadcast(&self, destination: &str, message: &str) -> Result<()> {
        info!("[broadcast] {destination}: {message}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!(
        "remindd starting (base: {}, overlay: {})",
        config.base_config_path.display(),
        config.overlay_config_path.display()
    );

    let store = Arc::new(FileReminderStore::new(
        &config.base_config_path,
        &config.overlay_config_path,
    ));
    let scheduler = ReminderScheduler::with_timing(store, Arc::new(LogTransport), config.timing());

    scheduler.start()?;
    for status in scheduler.list() {
        info!("  {status}");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.shutdown_all();

    Ok(())
}
