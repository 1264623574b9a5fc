mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use duotui_core::{
    config::{self, AppConfig},
    listing::{ListingClient, ListingRefresher},
};
use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let client = ListingClient::new(&config);
    let refresher = ListingRefresher::new(client, config.refresh_period());

    let (refresh_tx, refresh_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        if let Err(err) = refresher.run(refresh_tx).await {
            tracing::error!("Listing refresh task error: {err}");
        }
    });

    let mut app = app::DuoApp::new(config);
    app.attach_refresh(refresh_rx);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("duotui.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
