use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sentinel::{
    config::{CameraConfig, PipelineConfig, SentinelConfig},
    engine::SentinelKernel,
    hal::SourceRegistry,
    resilience::Dispatcher,
    sinks::{BroadcastHub, IncidentStore, JsonlIncidentStore, LiveMessage, LogSink},
};

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Real-time motion-anomaly and loitering detection for camera feeds",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one source or every camera in a config file
    Run {
        /// JSON config with `cameras` and optional `pipeline`; overrides --source
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Camera URI (sim://, offline://, file://<dir> or an image directory)
        #[arg(short, long, default_value = "sim://default")]
        source: String,

        #[arg(long, default_value = "WEB-01")]
        camera_id: String,

        #[arg(long, default_value = "admin")]
        owner_id: String,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Append incidents to this JSON-lines file
        #[arg(long)]
        incident_log: Option<PathBuf>,
    },

    /// List the registered source drivers
    Drivers,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Respect RUST_LOG; default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            camera_id,
            owner_id,
            duration_secs,
            incident_log,
        } => {
            let config = match config {
                Some(path) => SentinelConfig::load(&path)?,
                None => {
                    let config = SentinelConfig {
                        cameras: vec![CameraConfig::new(source, camera_id, owner_id)],
                        pipeline: PipelineConfig::default(),
                    };
                    config.validate()?;
                    config
                }
            };
            cmd_run(config, duration_secs.map(Duration::from_secs), incident_log).await
        }
        Commands::Drivers => {
            for driver in SourceRegistry::with_defaults().list_drivers() {
                println!("{}", driver);
            }
            Ok(())
        }
    }
}

async fn cmd_run(
    config: SentinelConfig,
    duration: Option<Duration>,
    incident_log: Option<PathBuf>,
) -> Result<()> {
    let store: Arc<dyn IncidentStore> = match incident_log {
        Some(path) => {
            info!("incident log: {}", path.display());
            Arc::new(JsonlIncidentStore::open(&path)?)
        }
        None => Arc::new(LogSink),
    };

    let hub = Arc::new(BroadcastHub::default());
    spawn_live_logger(&hub);

    let dispatcher = Dispatcher::new()
        .with_store(store)
        .with_incident_broadcaster(hub.clone())
        .with_stats_broadcaster(hub.clone());

    let mut kernel = SentinelKernel::new(config, SourceRegistry::with_defaults(), dispatcher);
    kernel.start().await.context("failed to start cameras")?;

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => info!("run duration elapsed"),
                res = tokio::signal::ctrl_c() => { res.context("failed to listen for Ctrl-C")?; info!("interrupted"); }
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("interrupted");
        }
    }

    kernel.stop().await?;
    info!("\n{}", kernel.monitor().generate_report());
    Ok(())
}

/// Echo live incidents as JSON, the way a websocket client would see them
fn spawn_live_logger(hub: &BroadcastHub) {
    let mut rx = hub.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message @ LiveMessage::Incident(_)) => match serde_json::to_string(&message) {
                    Ok(json) => info!(target: "sentinel::live", "{}", json),
                    Err(e) => tracing::warn!(error = %e, "failed to serialize live message"),
                },
                Ok(LiveMessage::Stats(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "live logger lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
