use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rrdash::core::config::ChartBackend;
use rrdash::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for rrdash::AppCommand {
    fn from(cmd: Commands) -> rrdash::AppCommand {
        match cmd {
            Commands::Render {
                source,
                output,
                charts,
            } => rrdash::AppCommand::Render {
                source,
                output,
                charts,
            },
            Commands::Summary { source } => rrdash::AppCommand::Summary { source },
            Commands::Compare { source } => rrdash::AppCommand::Compare { source },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Render the dashboard as an HTML page
    Render {
        /// URL or file path of the metrics document
        #[arg(short, long)]
        source: Option<String>,
        /// Where to write the page
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Chart backend
        #[arg(long, value_enum)]
        charts: Option<ChartBackend>,
    },
    /// Display fund summaries in the terminal
    Summary {
        /// URL or file path of the metrics document
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Display the fund comparison table
    Compare {
        /// URL or file path of the metrics document
        #[arg(short, long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => rrdash::cli::setup::setup_at_path(path),
            None => rrdash::cli::setup::setup(),
        },
        Some(cmd) => rrdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
