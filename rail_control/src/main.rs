//! # Rail Control
//!
//! Headless driver for the rail motion simulator.
//!
//! Loads the simulator TOML config and the motion tuning settings file
//! (writing defaults on first run), then runs one tick per input frame read
//! from stdin until the input ends, `esc` is read, the tick limit is hit or
//! Ctrl-C is pressed. Stdin is read on its own thread so Ctrl-C also ends a
//! wait for the next line. Audio events are logged at TRACE level.

use clap::Parser;
use rail_common::config::{ConfigError, ConfigLoader, SimConfig};
use rail_common::consts::DEFAULT_CONFIG_FILE;
use rail_common::settings::SettingsStore;
use rail_control::audio::backend::TracingBackend;
use rail_control::cycle::{BackgroundFrames, TickRunner};
use rail_control::path::TrackCursor;
use rail_control::simulator::Simulator;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rail Control: per-frame rail vehicle simulator
#[derive(Parser, Debug)]
#[command(name = "rail_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Headless rail vehicle motion and audio state simulator")]
struct Args {
    /// Path to the simulator configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the tuning settings file path from the config.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Enable developer controls (forced-braking toggle).
    #[arg(long)]
    dev_mode: bool,

    /// Run unpaced with a constant step [s] instead of the wall clock.
    #[arg(long, value_name = "SECONDS")]
    fixed_step: Option<f64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = SimConfig::load(&args.config);
    setup_tracing(&args, loaded.as_ref().ok());

    info!("Rail Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Rail Control shutdown complete");
}

fn run(
    args: &Args,
    loaded: Result<SimConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match loaded {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) => {
            warn!(
                "Config '{}' not found, using defaults",
                args.config.display()
            );
            SimConfig::default()
        }
        Err(e) => return Err(Box::new(e)),
    };
    if args.dev_mode {
        config.controls.dev_mode = true;
    }
    if let Some(ref path) = args.settings {
        config.settings.path = path.display().to_string();
    }
    config.validate()?;

    info!(
        "Config OK: cycle_time={}µs, policy={:?}, lights={}",
        config.cycle.cycle_time_us,
        config.motion.throttle_brake_policy,
        config.controls.light_count,
    );

    let store = SettingsStore::new(&config.settings.path);
    let settings = store.load_or_init()?;
    info!(
        "Settings loaded from {}: max_speed={}",
        store.path().display(),
        settings.maximum_speed
    );

    let sim = Simulator::new(
        &config,
        &settings,
        Box::new(TracingBackend),
        Box::new(TrackCursor::new()),
    );
    let mut runner =
        TickRunner::new(sim, config.cycle.cycle_time_us).with_max_ticks(args.max_ticks);

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut frames = BackgroundFrames::spawn(BufReader::new(std::io::stdin()), running.clone());
    let summary = match args.fixed_step {
        Some(dt) => runner.run_fixed(&mut frames, dt, &running)?,
        None => runner.run(&mut frames, &running)?,
    };

    let stats = runner.stats();
    let sim = runner.simulator();
    info!(
        "Stopped ({:?}): ticks={}, speed={:.4}, progress={:.4}, avg_tick={}ns, overruns={}",
        summary.reason,
        summary.ticks,
        sim.speed(),
        sim.progress(),
        stats.avg_tick_ns(),
        stats.overruns,
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the config log level.
fn setup_tracing(args: &Args, config: Option<&SimConfig>) {
    let level = if args.verbose {
        "debug"
    } else {
        config.map_or("info", |c| c.shared.log_level.as_directive())
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
