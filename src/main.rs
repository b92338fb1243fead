use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use sml::Orchestrator;
use sml_core::{Config, TimestampLayout};
use sml_sink::JsonlSink;

#[derive(Parser)]
#[command(
    name = "sml",
    about = "Ship My Logs — tail log files (paths on stdin) into a persistence sink"
)]
struct Cli {
    /// Config file layered over the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sink root directory (overrides the config file).
    #[arg(long)]
    sink_dir: Option<PathBuf>,
    /// Destination collection name.
    #[arg(long)]
    collection: Option<String>,
    /// Number of sink workers.
    #[arg(long)]
    workers: Option<usize>,
    /// Timestamp layout selector: 1 or 2.
    #[arg(long)]
    layout: Option<u8>,
    /// Verbose per-line engine logging.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(dir) = self.sink_dir {
            config.sink.root_dir = dir;
        }
        if let Some(collection) = self.collection {
            anyhow::ensure!(!collection.is_empty(), "--collection cannot be empty");
            config.sink.collection = collection;
        }
        if let Some(workers) = self.workers {
            anyhow::ensure!(workers >= 1, "--workers must be at least 1");
            config.pipeline.workers = workers;
        }
        if let Some(selector) = self.layout {
            config.tail.layout = TimestampLayout::from_selector(selector).ok_or_else(|| {
                anyhow::anyhow!("unrecognized --layout {selector} (expected 1 or 2)")
            })?;
        }
        if self.debug {
            config.tail.debug = true;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config)?;

    let sink = Arc::new(JsonlSink::open(&config.sink.root_dir, &config.sink.collection).await?);
    tracing::info!(
        sink = %sink.path().display(),
        workers = config.pipeline.workers,
        layout = %config.tail.layout,
        "sml starting; reading file paths from stdin"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; stopping engines");
                shutdown.cancel();
            }
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let summary = Orchestrator::new(config, sink).run(stdin, shutdown).await;
    tracing::info!(
        stopped = summary.stopped,
        failed = summary.failed,
        skipped = summary.skipped,
        "done"
    );
    Ok(())
}
