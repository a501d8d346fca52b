use crate::core::loader::DEFAULT_DATA_PATH;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Where to read the metrics document from. A URL wins over a path.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub path: Option<String>,
}

impl SourceConfig {
    pub fn location(&self) -> &str {
        self.url
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or(DEFAULT_DATA_PATH)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartBackend {
    /// Inline SVG, no external scripts
    #[default]
    Svg,
    /// Plotly.js loaded from a CDN
    Plotly,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub charts: ChartBackend,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_output() -> String {
    "dashboard.html".to_string()
}

fn default_title() -> String {
    "Rent Roll BI Dashboard".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceConfig::default(),
            output: default_output(),
            charts: ChartBackend::default(),
            title: default_title(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "rrdash", "rrdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
