pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::{AppConfig, ChartBackend};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// A command that needs the metrics document. `source` overrides the
/// configured location for a single run.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Render {
        source: Option<String>,
        output: Option<PathBuf>,
        charts: Option<ChartBackend>,
    },
    Summary {
        source: Option<String>,
    },
    Compare {
        source: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rent roll dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let location = |source: &Option<String>| {
        source
            .clone()
            .unwrap_or_else(|| config.source.location().to_string())
    };

    match &command {
        AppCommand::Render {
            source,
            output,
            charts,
        } => {
            let source = providers::source_for(&location(source));
            let output = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output));
            let backend = charts.unwrap_or(config.charts);
            cli::render::run(source.as_ref(), &output, backend, &config.title).await
        }
        AppCommand::Summary { source } => {
            let source = providers::source_for(&location(source));
            cli::summary::run(source.as_ref()).await
        }
        AppCommand::Compare { source } => {
            let source = providers::source_for(&location(source));
            cli::compare::run(source.as_ref()).await
        }
    }
}
