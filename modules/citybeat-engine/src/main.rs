use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use citybeat_client::BackendClient;
use citybeat_common::{city_profile, Config};
use citybeat_engine::{MapEngine, PlaybackSignal};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("citybeat=info".parse()?))
        .init();

    info!("City Beat engine starting...");

    let config = Config::from_env();
    let city = city_profile(&config.city)
        .ok_or_else(|| anyhow::anyhow!("unknown city {:?}", config.city))?;
    if !city.available {
        anyhow::bail!("city {} has no ingested data", city.id);
    }

    let client = Arc::new(BackendClient::new(config.api_url.clone())?);
    let engine = MapEngine::new(client.clone(), client, city);

    if !engine.login(&config.api_login, &config.api_password).await {
        anyhow::bail!("backend rejected the configured credentials");
    }

    engine.refresh().await?;
    let stats = engine.stats().await;
    info!(city = city.id, "initial fetch complete: {stats}");

    // Ride one full playback over the selected day.
    let mut playback = engine.play().await;
    while let Some(signal) = playback.signals.recv().await {
        match signal {
            PlaybackSignal::Advanced { hour } => info!(hour, "hour advanced"),
            PlaybackSignal::Stopped => break,
        }
    }
    playback.join().await;

    let stats = engine.stats().await;
    info!("playback finished: {stats}");
    Ok(())
}
