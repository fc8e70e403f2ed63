use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use weatherhub::{HubConfig, WeatherHub, logging, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = HubConfig::load_from_path(config_path)?;
    logging::init(&config.logging)?;

    tracing::info!("Starting weatherhub {}", weatherhub::VERSION);
    let hub = WeatherHub::from_config(&config)
        .await
        .context("Failed to initialize services")?;

    web::run(Arc::new(hub), config.server.port).await
}
