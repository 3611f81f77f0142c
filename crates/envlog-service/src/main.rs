//! envlog - environmental telemetry collector.
//!
//! Run with: `cargo run -p envlog-service -- run`

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use envlog_core::{SensorReader, SimulatedSensorBuilder};
use envlog_service::config::default_config_path;
use envlog_service::{
    Clock, Config, OutputMode, Presenter, Renderer, Scheduler, SchedulerSettings, SensorKind,
    SensorLabels, SystemClock,
};
use envlog_store::Store;

/// envlog - sample environmental sensors, log them and chart the last day.
#[derive(Parser, Debug)]
#[command(name = "envlog")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides config).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Output directory for the page and charts (overrides config).
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Snapshot destination: page or terminal (overrides config).
    #[arg(short, long, global = true)]
    mode: Option<OutputMode>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sampling loop in the foreground (default behavior).
    Run,

    /// Render the charts for the current window once and exit.
    Render,

    /// Write a default configuration file.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the terminal snapshot owns stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("envlog_service=info".parse()?)
                .add_directive("envlog_store=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if let Some(Command::Init { force }) = args.command {
        let path = args.config.clone().unwrap_or_else(default_config_path);
        Config::init_file(&path, force)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(&args)?;

    match args.command {
        Some(Command::Render) => render_once(&config).await,
        Some(Command::Run) | Some(Command::Init { .. }) | None => run_collector(&config).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring default config: {}", e);
            Config::default()
        }),
    };

    // Override config with CLI args
    if let Some(db_path) = &args.database {
        config.storage.path = Some(db_path.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(mode) = args.mode {
        config.output.mode = mode;
    }

    config.validate()?;
    Ok(config)
}

fn renderer(config: &Config, db_path: PathBuf) -> Renderer {
    Renderer::new(db_path, &config.output.dir)
        .size(config.render.width, config.render.height)
        .labels(SensorLabels::from(&config.sensor))
}

fn prepare_output_dir(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.output.dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.dir.display()
        )
    })
}

async fn run_collector(config: &Config) -> anyhow::Result<()> {
    prepare_output_dir(config)?;

    let db_path = config.database_path();
    let store = Store::open(&db_path)?;
    info!("{} samples in {}", store.count()?, db_path.display());

    let labels = SensorLabels::from(&config.sensor);
    let presenter = match config.output.mode {
        OutputMode::Page => {
            info!("Publishing page to {}", config.output.dir.display());
            Presenter::page(&config.output.dir, config.output.title.clone(), labels)
                .chart_size(config.render.width, config.render.height)
        }
        OutputMode::Terminal => Presenter::terminal(labels),
    };

    let sensor = match config.sensor.kind {
        SensorKind::Simulated => {
            info!("Using simulated sensors");
            SimulatedSensorBuilder::new().variation(true).build()
        }
    };

    let mut scheduler = Scheduler::new(
        SensorReader::new(sensor),
        store,
        presenter,
        renderer(config, db_path),
        SchedulerSettings::from_config(config),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    scheduler.run_until(shutdown).await?;
    info!("Stopped after {} ticks", scheduler.ticks());
    Ok(())
}

async fn render_once(config: &Config) -> anyhow::Result<()> {
    prepare_output_dir(config)?;

    // Creates the database and schema if this is the first run
    let db_path = config.database_path();
    drop(Store::open(&db_path)?);

    let renderer = renderer(config, db_path);
    let now = SystemClock.now();
    let window = config.render.window_secs;
    let report = tokio::task::spawn_blocking(move || renderer.render(now, window)).await??;

    for chart in &report.charts {
        println!("{} ({:?} points)", chart.path.display(), chart.series_points);
    }
    Ok(())
}
