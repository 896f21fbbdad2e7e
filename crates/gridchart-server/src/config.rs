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

use anyhow::{Context, Result, bail};
use gridchart_core::{CompositionRules, Palette};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub composition: CompositionSettings,
    #[serde(default)]
    pub charts: ChartSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

/// Which columns may appear in the composition chart
#[derive(Debug, Clone, Deserialize)]
pub struct CompositionSettings {
    #[serde(default = "default_generation_prefix")]
    pub prefix: String,
    #[serde(default = "default_composition_exclude")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartSettings {
    /// Day count for `/plot` and `/composition_plot` when the form omits it
    #[serde(default = "default_days")]
    pub default_days: i64,
    /// Prefilled day count on the composition form
    #[serde(default = "default_composition_form_days")]
    pub composition_form_days: i64,
    /// Series colors; empty means the Plotly palette
    #[serde(default)]
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Exact origins, or patterns ending in `:*` to allow any port
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/energy_clean.csv")
}

fn default_generation_prefix() -> String {
    CompositionRules::default().prefix
}

fn default_composition_exclude() -> Vec<String> {
    CompositionRules::default().exclude
}

fn default_days() -> i64 {
    3
}

fn default_composition_form_days() -> i64 {
    10
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:*".to_owned()]
}

fn default_allow_credentials() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            prefix: default_generation_prefix(),
            exclude: default_composition_exclude(),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            composition_form_days: default_composition_form_days(),
            palette: Vec::new(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: default_allow_credentials(),
        }
    }
}

impl CompositionSettings {
    #[must_use]
    pub fn rules(&self) -> CompositionRules {
        CompositionRules {
            prefix: self.prefix.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

impl ChartSettings {
    /// Configured palette, falling back to Plotly when none is set
    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::new(self.palette.clone()).unwrap_or_default()
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.path.as_os_str().is_empty() {
            bail!("dataset.path must be set");
        }
        if self.composition.prefix.is_empty() {
            bail!("composition.prefix must not be empty");
        }
        if self.charts.default_days < 1 {
            bail!("charts.default_days must be at least 1");
        }
        if self.charts.composition_form_days < 1 {
            bail!("charts.composition_form_days must be at least 1");
        }
        if self.charts.palette.iter().any(|c| c.trim().is_empty()) {
            bail!("charts.palette must not contain empty colors");
        }
        if self.cors.allow_credentials && self.cors.allowed_origins.iter().any(|o| o == "*") {
            bail!("cors.allowed_origins cannot contain \"*\" while allow_credentials is set");
        }
        Ok(())
    }
}
