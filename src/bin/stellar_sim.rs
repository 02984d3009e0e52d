//! Wall-following mapping simulation.
//!
//! Loads a ground-truth map image, drives the wall follower over it while
//! fusing sensor readings into a belief grid, and writes the belief dump
//! on exit (including Ctrl-C).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stellar_nav::sim::HeadlessDisplay;
use stellar_nav::{Config, Session, WorldGrid};

#[derive(Parser, Debug)]
#[command(name = "stellar_sim", about = "Wall-following mapping simulation")]
struct Args {
    /// Ground-truth map image (darker pixels = occupied)
    map: PathBuf,

    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulation steps, 0 = run until interrupted
    #[arg(short, long, default_value_t = 0)]
    steps: u64,

    /// Belief grid dump written on exit
    #[arg(short, long, default_value = "stellar.map")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(error = %e, "simulation failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> stellar_nav::Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let world = WorldGrid::from_image(&args.map, config.world.size)?;
    info!(
        map = %args.map.display(),
        size = config.world.size,
        "world loaded"
    );

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("interrupt received, finishing up");
        handler_flag.store(false, Ordering::Relaxed);
    })
    .map_err(|e| stellar_nav::StellarError::Config(format!("signal handler: {e}")))?;

    let mut session = Session::new(world, &config);
    let steps = session.run(&mut HeadlessDisplay, &running, args.steps);

    let (free, unknown, occupied) = session.belief().count_cells();
    info!(steps, free, unknown, occupied, "run finished");

    session.belief().save(&args.output)?;
    Ok(())
}
