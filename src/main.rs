use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use securevision::config::{ConsoleConfig, LogFormat, LoggingConfig};
use securevision::dashboard::Dashboard;
use securevision::detect::AlertPipeline;
use securevision::session::Session;

#[derive(Parser)]
#[command(
    name = "securevision",
    about = "Operator console for the SecureVision surveillance pipeline",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the pipeline and print the dashboard on every change
    Watch {
        /// Telemetry endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// JSON snapshots instead of the text dashboard
        #[arg(long)]
        json: bool,

        /// Operator session token shown in the header
        #[arg(long)]
        token: Option<String>,
    },

    /// Run the engine with the read-only HTTP API
    Serve {
        /// Telemetry endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Feed a recorded JSONL session through the dashboard
    Replay {
        /// Recording file, one frame per line
        #[arg(long)]
        file: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the dashboard.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ConsoleConfig::load_or_default();
    init_tracing(&config.logging);

    match cli.command {
        Commands::Watch {
            endpoint,
            json,
            token,
        } => {
            if let Some(endpoint) = endpoint {
                config.link.endpoint = endpoint;
            }
            let mut session = Session::new();
            if let Some(token) = token {
                if let Err(e) = session.login(token) {
                    tracing::warn!(error = %e, "continuing without operator identity");
                }
            }
            tracing::info!(endpoint = %config.link.endpoint, "Starting SecureVision console");
            let summary = securevision::watch(&config, &session, json).await?;
            tracing::info!(?summary, "console closed");
        }
        Commands::Serve { endpoint, bind } => {
            if let Some(endpoint) = endpoint {
                config.link.endpoint = endpoint;
            }
            if let Some(bind) = bind {
                config.api.listen_address = bind;
            }
            let summary = securevision::serve(&config).await?;
            tracing::info!(?summary, "console closed");
        }
        Commands::Replay { file, json } => {
            let mut dashboard =
                Dashboard::new(AlertPipeline::new(config.incidents.location.clone()));
            let summary = securevision::replay::replay_file(&file, &mut dashboard).await?;
            let snapshot = dashboard.snapshot();
            if json {
                let output = serde_json::json!({ "summary": summary, "snapshot": snapshot });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "{}",
                    securevision::view::render_dashboard(&snapshot, &Session::new())
                );
                println!(
                    "Replayed {} frames: {} accepted, {} dropped",
                    summary.frames, summary.accepted, summary.dropped
                );
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
