//! Offline route planning over a saved belief grid.
//!
//! Loads a belief dump produced by `stellar_sim`, optionally stamps
//! landmark boundary segments into it, then plans and smooths a route
//! through the given waypoints, printing each leg and the final route.
//! A malformed dump is fatal; an unplannable leg is skipped with a
//! warning.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stellar_nav::planning::AStarPlanner;
use stellar_nav::sim::route::{connect_landmarks, plan_route};
use stellar_nav::sim::DisplaySurface;
use stellar_nav::{BeliefGrid, Config, GridPose, Pose, StellarError};

/// Headless "viewer" that prints marked cells instead of drawing them.
struct MarkerLog;

impl DisplaySurface for MarkerLog {
    fn display(&mut self, _: &Pose, _: &BeliefGrid, _: f32, _: f32) -> bool {
        true
    }

    fn show_marker(&mut self, cell: GridPose) {
        println!("marker: ({}, {})", cell.col, cell.row);
    }
}

#[derive(Parser, Debug)]
#[command(name = "stellar_view", about = "Offline route planning over a belief dump")]
struct Args {
    /// Belief grid dump from stellar_sim
    dump: PathBuf,

    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Waypoints as col,row pairs, visited in order
    #[arg(short, long, value_parser = parse_cell, num_args = 2..)]
    waypoints: Vec<GridPose>,

    /// Landmark cells as col,row pairs
    #[arg(short, long, value_parser = parse_cell)]
    landmarks: Vec<GridPose>,

    /// Landmark index pairs to connect as boundary segments, e.g. 0,1
    #[arg(long, value_parser = parse_pair)]
    connect: Vec<(usize, usize)>,
}

fn parse_cell(s: &str) -> Result<GridPose, String> {
    let (col, row) = s
        .split_once(',')
        .ok_or_else(|| format!("expected col,row, got {s:?}"))?;
    Ok(GridPose::new(
        col.trim().parse().map_err(|e| format!("bad col: {e}"))?,
        row.trim().parse().map_err(|e| format!("bad row: {e}"))?,
    ))
}

fn parse_pair(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected a,b, got {s:?}"))?;
    Ok((
        a.trim().parse().map_err(|e| format!("bad index: {e}"))?,
        b.trim().parse().map_err(|e| format!("bad index: {e}"))?,
    ))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(error = %e, "planning failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> stellar_nav::Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut belief = BeliefGrid::load(&args.dump, config.mapping.to_fusion_config())?;
    let (free, unknown, occupied) = belief.count_cells();
    info!(
        width = belief.width(),
        height = belief.height(),
        free,
        unknown,
        occupied,
        "belief grid loaded"
    );

    if !args.connect.is_empty() {
        connect_landmarks(&mut belief, &args.landmarks, &args.connect);
        info!(segments = args.connect.len(), "landmark boundaries stamped");
    }

    if args.waypoints.len() < 2 {
        warn!("fewer than two waypoints, nothing to plan");
        return Ok(());
    }

    for pair in args.waypoints.windows(2) {
        println!(
            "leg: ({}, {}) -> ({}, {})",
            pair[0].col, pair[0].row, pair[1].col, pair[1].row
        );
    }

    let planner = AStarPlanner::new(config.planning.to_planner_config());
    let route = plan_route(&planner, &belief, &args.waypoints, &mut MarkerLog)
        .ok_or_else(|| StellarError::World("no route through the given waypoints".into()))?;

    println!("route ({} waypoints):", route.len());
    for cell in &route {
        println!("  ({}, {})", cell.col, cell.row);
    }
    Ok(())
}
