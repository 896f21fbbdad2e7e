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

pub mod api;
pub mod chart;
pub mod config;
pub mod cors;
pub mod pages;
pub mod request;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use gridchart_core::{DatasetSnapshot, LoadResult, Palette, SnapshotHandle};
use tracing::info;

use crate::config::ServerConfig;

/// Application state for web handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: Arc<SnapshotHandle>,
    pub config: Arc<ServerConfig>,
    pub palette: Arc<Palette>,
}

impl AppState {
    #[must_use]
    pub fn new(snapshot: DatasetSnapshot, config: ServerConfig) -> Self {
        Self {
            palette: Arc::new(config.charts.palette()),
            snapshot: Arc::new(SnapshotHandle::new(snapshot)),
            config: Arc::new(config),
        }
    }

    /// Load the configured dataset and build the initial state
    pub fn load(config: ServerConfig) -> LoadResult<Self> {
        let snapshot = DatasetSnapshot::load(&config.dataset.path, &config.composition.rules())?;
        Ok(Self::new(snapshot, config))
    }

    /// Snapshot for one request
    #[must_use]
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        self.snapshot.current()
    }

    /// Re-read the dataset and publish it.
    ///
    /// On error the current snapshot keeps serving.
    pub fn reload(&self) -> LoadResult<usize> {
        let snapshot = DatasetSnapshot::load(
            &self.config.dataset.path,
            &self.config.composition.rules(),
        )?;
        let rows = snapshot.table.len();
        let previous = self.snapshot.replace(snapshot);
        info!(
            rows,
            previous_rows = previous.table.len(),
            "Dataset reloaded"
        );
        Ok(rows)
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors::cors_layer(&state.config.cors);

    Router::new()
        .route("/", get(pages::index_handler))
        .route("/days_form", get(pages::days_form_handler))
        .route("/avg_form", get(pages::avg_form_handler))
        .route("/composition_form", get(pages::composition_form_handler))
        .route("/plot", post(pages::plot_handler))
        .route("/avg_plot", post(pages::avg_plot_handler))
        .route("/composition_plot", post(pages::composition_plot_handler))
        .route("/api/columns", get(api::columns_handler))
        .route("/api/plot", post(api::plot_handler))
        .route("/api/avg_plot", post(api::avg_plot_handler))
        .route("/api/composition_plot", post(api::composition_plot_handler))
        .route("/api/export", get(api::export_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.snapshot().table.is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "EMPTY")
    } else {
        (StatusCode::OK, "OK")
    }
}
