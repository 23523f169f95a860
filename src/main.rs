use anyhow::{bail, Context, Result};
use bg_widget::config::{AppConfig, OutputFormat};
use bg_widget::core::{RefreshHandle, RefreshScheduler, SnapshotBuilder};
use bg_widget_core::{BoxedDisplayer, Providers};
use bg_widget_displayers::{JsonDisplayer, TextDisplayer};
use bg_widget_sources::LiveSource;
use clap::Parser;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// bg-widget - glucose and loop status widget
#[derive(Parser, Debug, Clone)]
#[command(name = "bg-widget")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Provider state file (JSON), reloaded whenever it changes
    #[arg(value_name = "STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Seconds between refreshes (overrides the config file)
    #[arg(short = 'i', long = "interval", value_name = "SECS")]
    interval: Option<u64>,

    /// Output format (overrides the config file)
    #[arg(short = 'o', long = "output", value_enum)]
    output: Option<OutputFormat>,

    /// Refresh once and exit
    #[arg(long = "once")]
    once: bool,

    /// Config file to use instead of the default location
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting bg-widget v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> AppConfig {
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {:#}", e);
        AppConfig::default()
    });

    if let Some(interval) = cli.interval {
        config.refresh_interval_secs = interval;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(state_file) = &cli.state_file {
        config.state_file = Some(state_file.clone());
    }
    config
}

fn create_displayer(config: &AppConfig) -> BoxedDisplayer {
    let appearances = config.appearances();
    match config.output {
        OutputFormat::Text => {
            Box::new(TextDisplayer::new(std::io::stdout()).with_appearances(appearances))
        }
        OutputFormat::Json => {
            Box::new(JsonDisplayer::new(std::io::stdout()).with_appearances(appearances))
        }
    }
}

/// Reload the state file; failures keep the previous state
fn reload_state(source: &LiveSource, path: &Path) {
    match source.reload_from_path(path) {
        Ok(true) => debug!("Provider state changed"),
        Ok(false) => {}
        Err(e) => warn!("{}", e),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli);
    let Some(state_file) = config.state_file.clone() else {
        bail!("No provider state file given (pass STATE_FILE or set state_file in the config)");
    };

    let source = Arc::new(LiveSource::new());
    let builder = SnapshotBuilder::new(Providers::from_shared(source.clone()));
    let mut scheduler = RefreshScheduler::new(builder, create_displayer(&config))?;
    let widget_ids = config.widget_ids();

    if cli.once {
        reload_state(&source, &state_file);
        scheduler.request_refresh(&widget_ids, "once");
        scheduler.shutdown();
        return Ok(());
    }

    let handle = scheduler
        .handle()
        .context("Refresh scheduler already shut down")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    info!(
        "Refreshing {} widget(s) every {:?} from {}",
        widget_ids.len(),
        config.refresh_interval(),
        state_file.display()
    );
    rt.block_on(tick_loop(
        source,
        state_file,
        handle,
        widget_ids,
        config.refresh_interval(),
    ));

    scheduler.shutdown();
    Ok(())
}

/// Timer-driven refresh trigger; runs until Ctrl-C
async fn tick_loop(
    source: Arc<LiveSource>,
    state_file: PathBuf,
    handle: RefreshHandle,
    widget_ids: Vec<u32>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                reload_state(&source, &state_file);
                handle.request_refresh(&widget_ids, "timer");
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }
}
