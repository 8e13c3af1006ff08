//! Terminal client for the tower-climb runtime.
//!
//! Composition root: reads configuration from the environment, loads content
//! from the data directory, assembles the runtime and hands its handle to the
//! line-based [`app::CliApp`].
//!
//! ```bash
//! TOWER_DATA_DIR=crates/client/assets cargo run -p tower-client
//! TOWER_FLOORS=1 TOWER_INTERACTIVE_BATTLES=1 cargo run -p tower-client
//! ```
//!
//! `TOWER_DATA_DIR` defaults to `assets`, resolved against the working
//! directory.
mod app;
mod config;
mod input;
mod logging;
mod presentation;

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_content::ContentFactory;
use tower_runtime::{DirectoryFloorSource, DirectoryStorySource, Runtime};

use crate::app::CliApp;
use crate::config::ClientConfig;
use crate::presentation::TerminalUi;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting tower client");
    tracing::info!(data_dir = %config.data_dir.display(), level = %config.level, "content");

    let content = ContentFactory::new(&config.data_dir);
    let game_config = content
        .load_config()
        .with_context(|| format!("failed to load config from {}", config.data_dir.display()))?;
    let level = content
        .load_level(&config.level, &game_config)
        .with_context(|| format!("failed to load level {}", config.level))?;

    let ui = Arc::new(TerminalUi::new(config.message_capacity));
    let mut builder = Runtime::builder()
        .config(config.runtime_config())
        .game_config(game_config.clone())
        .level(level)
        .ui(ui.clone())
        .stories(Arc::new(DirectoryStorySource::new(content.story_dir())));

    if config.floors {
        let fallback = content.levels_dir().join(format!("{}.json", config.level));
        let floors = DirectoryFloorSource::new(content.levels_dir(), game_config)
            .with_fallback(fallback);
        builder = builder.floors(Arc::new(floors));
    }

    let battles = if config.interactive_battles {
        let (with_battles, requests, _canceller) = builder.interactive_battles(1);
        builder = with_battles;
        Some(requests)
    } else {
        None
    };

    let runtime = builder.build().await.context("failed to start runtime")?;
    tracing::info!("Runtime built successfully");

    let result = CliApp::new(runtime.handle(), ui, battles).run().await;

    runtime.shutdown().await?;
    tracing::info!("Client shutdown complete");
    result
}
