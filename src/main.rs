//! CLI entry point for launch_atlas.
//!
//! Provides subcommands for building the cumulative launch-site timeline,
//! laying out orbit ellipses, replaying either one on a timer, and recording
//! dataset statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use launch_atlas::analyzers::analyzer::LaunchPipeline;
use launch_atlas::analyzers::types::YearSnapshot;
use launch_atlas::config::AtlasConfig;
use launch_atlas::fetch::load_source;
use launch_atlas::orbit::{
    EllipseGeometry, OrbitAnimationState, OrbitGeometryEngine, OrbitRecord, Viewport,
};
use launch_atlas::output::{append_record, print_pretty, write_json};
use launch_atlas::parser::{RawRecord, SourceFormat, parse_records};
use launch_atlas::scheduler::{
    AnimationScheduler, EndPolicy, IntervalClock, OrbitSubscriber, PlaybackSubscriber,
};
use launch_atlas::sites::site_acronym;
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "launch_atlas")]
#[command(about = "Launch-site timelines and orbit ellipses from satellite catalogues", long_about = None)]
struct Cli {
    /// JSON config file (falls back to ATLAS_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build cumulative per-site snapshots for every launch year
    Timeline {
        /// Path to file or URL to fetch (CSV or JSON, optionally gzipped)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// JSON file to write the timeline to
        #[arg(short, long, default_value = "out/timeline.json")]
        output: String,

        /// Optional: CSV file to append dataset statistics to
        #[arg(long)]
        stats_csv: Option<String>,
    },
    /// Compute display ellipses for every orbit in a satellite catalogue
    Orbits {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// JSON file to write the layout to
        #[arg(short, long, default_value = "out/orbits.json")]
        output: String,

        /// Viewport width in pixels (overrides config)
        #[arg(long)]
        width: Option<f64>,

        /// Viewport height in pixels (overrides config)
        #[arg(long)]
        height: Option<f64>,
    },
    /// Replay the launch timeline one year per tick
    Play {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Milliseconds per year (overrides config)
        #[arg(short, long)]
        tick_ms: Option<u64>,

        /// Loop back to the first year instead of stopping at the last
        #[arg(long = "loop", default_value_t = false)]
        repeat: bool,

        /// Start at the first year at or after this one
        #[arg(long)]
        from_year: Option<i32>,

        /// Stop after this many ticks (looping playback otherwise runs until Ctrl+C)
        #[arg(short = 'n', long)]
        max_ticks: Option<u64>,
    },
    /// Animate satellites along their ellipses
    Animate {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Number of animation ticks to run
        #[arg(short = 'n', long, default_value_t = 300)]
        ticks: u64,

        /// Milliseconds per tick (overrides config)
        #[arg(short, long)]
        tick_ms: Option<u64>,
    },
    /// Append dataset statistics to a CSV file
    Stats {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append results to
        #[arg(short, long, default_value = "stats.csv")]
        output: String,
    },
}

/// One object in the orbit layout file.
#[derive(Serialize)]
struct OrbitLayout {
    orbit: OrbitRecord,
    ellipse: EllipseGeometry,
    animation: OrbitAnimationState,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/launch_atlas.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("launch_atlas.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = AtlasConfig::resolve(cli.config.as_deref())?;
    let pipeline = LaunchPipeline::from_config(&config)?;

    match cli.command {
        Commands::Timeline {
            source,
            output,
            stats_csv,
        } => {
            let records = load_records(&source).await?;
            let mut analysis = pipeline.analyze(&records);
            analysis.stats = analysis.stats.with_source(&source);

            write_json(&output, &analysis)?;
            if let Some(path) = stats_csv {
                append_record(&path, &analysis.stats)?;
            }
        }
        Commands::Orbits {
            source,
            output,
            width,
            height,
        } => {
            let viewport = Viewport {
                width: width.unwrap_or(config.orbit.viewport.width),
                height: height.unwrap_or(config.orbit.viewport.height),
                ..config.orbit.viewport
            };
            let orbits = pipeline.orbits(&load_records(&source).await?);
            let engine = OrbitGeometryEngine::linear(viewport, &orbits);

            let layout: Vec<OrbitLayout> = orbits
                .iter()
                .zip(engine.layout(&orbits))
                .enumerate()
                .map(|(i, (orbit, ellipse))| OrbitLayout {
                    orbit: *orbit,
                    ellipse,
                    animation: OrbitAnimationState::for_orbit(orbit, i),
                })
                .collect();

            write_json(&output, &layout)?;
        }
        Commands::Play {
            source,
            tick_ms,
            repeat,
            from_year,
            max_ticks,
        } => {
            let records = load_records(&source).await?;
            let analysis = pipeline.analyze(&records);
            if analysis.timeline.is_empty() {
                warn!(source = %source, "No launches with a year and a known site; nothing to play");
                return Ok(());
            }

            let policy = if repeat {
                EndPolicy::Loop
            } else {
                config.playback.end_policy
            };
            let start = from_year
                .and_then(|from| analysis.timeline.years().iter().position(|y| *y >= from))
                .unwrap_or(0);

            let subscriber = PlaybackSubscriber::new(analysis.timeline, policy, render_year);
            let controls = subscriber.controls();
            controls.seek(start);
            controls.play();

            let period = Duration::from_millis(tick_ms.unwrap_or(config.playback.tick_ms));
            let mut scheduler = AnimationScheduler::new(IntervalClock::new(period));
            scheduler.subscribe(subscriber);
            let ran = scheduler.run(max_ticks).await;
            info!(ticks = ran, "Playback finished");
        }
        Commands::Animate {
            source,
            ticks,
            tick_ms,
        } => {
            let orbits = pipeline.orbits(&load_records(&source).await?);
            if orbits.is_empty() {
                warn!(source = %source, "No drawable orbits; nothing to animate");
                return Ok(());
            }

            let engine = OrbitGeometryEngine::linear(config.orbit.viewport, &orbits);
            let states = orbits
                .iter()
                .enumerate()
                .map(|(i, o)| OrbitAnimationState::for_orbit(o, i))
                .collect();

            let mut frames = 0u64;
            let subscriber = OrbitSubscriber::new(engine.layout(&orbits), states, |positions: &[(f64, f64)]| {
                frames += 1;
                if let Some((x, y)) = positions.first() {
                    debug!(frame = frames, x, y, objects = positions.len(), "Orbit positions");
                }
            });

            let period = Duration::from_millis(tick_ms.unwrap_or(config.orbit.tick_ms));
            let mut scheduler = AnimationScheduler::new(IntervalClock::new(period));
            scheduler.subscribe(subscriber);
            let ran = scheduler.run(Some(ticks)).await;
            info!(ticks = ran, objects = orbits.len(), "Animation finished");
        }
        Commands::Stats { source, output } => {
            let records = load_records(&source).await?;
            let stats = pipeline.analyze(&records).stats.with_source(&source);

            print_pretty(&stats);
            info!(
                records = stats.total_records,
                event_pct = stats.event_pct(),
                orbit_pct = stats.orbit_pct(),
                "Dataset statistics"
            );
            append_record(&output, &stats)?;
        }
    }

    Ok(())
}

/// Loads and parses a dataset from a local file path or over HTTP.
#[tracing::instrument]
async fn load_records(source: &str) -> Result<Vec<RawRecord>> {
    let bytes = load_source(source).await?;
    let format = SourceFormat::detect(source, &bytes);
    let records = parse_records(&bytes, format)?;
    info!(records = records.len(), ?format, "Records parsed");
    Ok(records)
}

/// Stand-in renderer: logs the busiest sites of the active year.
fn render_year(year: i32, snapshot: &YearSnapshot) {
    let total: u32 = snapshot.values().map(|s| s.cumulative_count).sum();
    let busiest = snapshot
        .values()
        .max_by_key(|s| s.cumulative_count)
        .map(|s| format!("{} ({})", site_acronym(&s.site_name), s.cumulative_count));

    info!(year, sites = snapshot.len(), launches = total, busiest = ?busiest, "Year");
}
