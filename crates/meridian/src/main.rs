//! World service entry point.
//!
//! Loads configuration and the world definition files, builds the spatial
//! index for every plane, runs the region consistency audit, and then waits
//! for a shutdown signal.

mod cli;
mod config;
mod loader;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use world_core::{FileTerrainSource, FlatTerrain, PlaneSpec, TerrainSource, WorldIndex};

use cli::CliArgs;
use config::{AppConfig, LoggingSettings};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .with_context(|| format!("loading configuration {}", args.config_path.display()))?;

    if let Some(data_dir) = args.data_dir {
        config.world.data_dir = data_dir.to_string_lossy().into_owned();
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;

    setup_logging(&config.logging);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config_path.display(),
        "Meridian world server starting"
    );

    let world = build_world(&config).await?;

    let findings = world.audit();
    if findings > 0 {
        warn!(findings, "region consistency audit reported problems");
    } else {
        info!("region consistency audit clean");
    }
    info!(
        planes = config.world.planes.len(),
        regions = world.atlas().iter().count(),
        "world index ready"
    );

    wait_for_shutdown().await?;
    info!("shutdown signal received, stopping");
    Ok(())
}

async fn build_world(config: &AppConfig) -> Result<WorldIndex> {
    let planes: Vec<PlaneSpec> = config
        .world
        .planes
        .iter()
        .map(|p| PlaneSpec { width: p.width, height: p.height })
        .collect();

    let source: Arc<dyn TerrainSource> = match config.world.terrain.as_str() {
        "files" => {
            let widths: Vec<u16> = config.world.planes.iter().map(|p| p.width).collect();
            Arc::new(FileTerrainSource::new(&config.world.data_dir, &widths))
        }
        _ => Arc::new(FlatTerrain { tile: 0, height: 0 }),
    };

    let catalog = Arc::new(loader::load_catalog(Path::new(&config.world.models_file)).await?);
    let defs = loader::load_regions(Path::new(&config.world.regions_file)).await?;

    WorldIndex::build(&planes, catalog, source, defs).context("building world index")
}

fn setup_logging(config: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false))
            .init();
    }
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("received Ctrl+C");
    }

    Ok(())
}
