// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridchart_server::config::ServerConfig;
use gridchart_server::{AppState, build_router};

#[derive(Debug, Parser)]
#[command(name = "gridchart-server")]
#[command(author, version, about = "Electricity generation charting server")]
struct Cli {
    /// TOML configuration file
    #[arg(long, default_value = "gridchart.toml")]
    config: PathBuf,

    /// Dataset CSV, overrides `dataset.path` from the config
    #[arg(long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("gridchart_server=info,gridchart_core=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    info!(path = %cli.config.display(), "Loading configuration");
    let mut config = ServerConfig::from_file(&cli.config)?;
    if let Some(data) = cli.data {
        config.dataset.path = data;
        config.validate()?;
    }

    let dataset_path = config.dataset.path.clone();
    let state = AppState::load(config)
        .with_context(|| format!("Failed to load dataset: {}", dataset_path.display()))?;

    #[cfg(unix)]
    spawn_reload_on_sighup(state.clone())?;

    let addr = format!(
        "{}:{}",
        state.config.server.bind_address, state.config.server.port
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("gridchart server listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild the snapshot from disk on every SIGHUP
#[cfg(unix)]
fn spawn_reload_on_sighup(state: AppState) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            info!("SIGHUP received, reloading dataset");
            let state = state.clone();
            match tokio::task::spawn_blocking(move || state.reload()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Dataset reload failed, keeping previous snapshot");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Dataset reload task panicked");
                }
            }
        }
    });
    Ok(())
}
