//! # Mudcore Main Entry Point
//!
//! Builds the demo world, then drives the pulse scheduler over it either as
//! fast as possible or in real time.

use clap::Parser;
use log::{debug, error, info, warn};
use mudcore::{demo, GameConfig, MudResult, PulseReport, Scheduler, World};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the mudcore driver.
#[derive(Parser, Debug)]
#[command(name = "mudcore")]
#[command(about = "Runs the MUD world scheduler over a demo world")]
#[command(version)]
struct Args {
    /// JSON game configuration; defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for the world
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of pulses to run
    #[arg(short, long, default_value_t = 1200)]
    pulses: u64,

    /// Pace pulses at the configured pulses per second
    #[arg(long)]
    realtime: bool,

    /// Write a world snapshot here when the run ends
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(err) = run(&args).await {
        error!("Fatal: {}", err);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_timestamp_millis()
            .init();
    }
}

async fn run(args: &Args) -> MudResult<()> {
    info!("Starting mudcore v{}", mudcore::VERSION);

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            GameConfig::load(path)?
        }
        None => GameConfig::default(),
    };
    let seed = args.seed.unwrap_or(12345);

    info!("Building demo world with seed: {}", seed);
    let mut world = demo::demo_world(seed)?;
    let mut scheduler = Scheduler::new(config)?;
    info!(
        "World ready: {} areas, {} rooms, {} characters, {} objects",
        world.area_count(),
        world.room_count(),
        world.character_count(),
        world.object_count()
    );

    let total = if args.realtime {
        run_realtime(&mut scheduler, &mut world, args.pulses).await
    } else {
        let total = scheduler.run(&mut world, args.pulses);
        flush_output(&mut world);
        total
    };

    if let Err(err) = world.check_integrity() {
        warn!("World failed its integrity check: {}", err);
    }
    print_summary(&world, &total);

    if let Some(path) = &args.snapshot {
        world.snapshot().save(path)?;
        info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

/// Paces pulses on a tokio interval until the count runs out or ctrl-c.
async fn run_realtime(scheduler: &mut Scheduler, world: &mut World, pulses: u64) -> PulseReport {
    let per_second = scheduler.config().tick.pulses_per_second.max(1);
    let period = (Duration::from_secs(1) / per_second).max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    let mut total = PulseReport::default();

    for _ in 0..pulses {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted after {} pulses", scheduler.pulse_count());
                break;
            }
        }
        let report = scheduler.pulse(world);
        if !report.is_quiet() {
            info!(
                "Pulse {}: {} rounds, {} deaths, {} decayed, {} resets",
                scheduler.pulse_count(),
                report.rounds,
                report.deaths,
                report.objects_decayed,
                report.areas_reset
            );
        }
        total.merge(&report);
        flush_output(world);
    }
    total
}

/// Drains every connected character's output into the log.
fn flush_output(world: &mut World) {
    let connected: Vec<_> = world
        .characters()
        .filter(|&id| world.character(id).is_some_and(|ch| ch.session.is_some()))
        .collect();
    for id in connected {
        if let Some(ch) = world.character_mut(id) {
            for line in ch.take_output() {
                debug!("[{}] {}", ch.name, line);
            }
        }
    }
}

fn print_summary(world: &World, total: &PulseReport) {
    println!("=== Run Summary ===");
    println!("Pulses:            {}", total.pulses);
    println!("Combat rounds:     {}", total.rounds);
    println!("Mobile deaths:     {}", total.deaths);
    println!("Player deaths:     {}", total.player_deaths);
    println!("Class damage:      {}", total.class_damage);
    println!("Affects expired:   {}", total.affects_expired);
    println!("Objects decayed:   {}", total.objects_decayed);
    println!(
        "Area resets:       {} ({} deferred)",
        total.areas_reset, total.resets_deferred
    );
    println!("Mobiles spawned:   {}", total.mobiles_spawned);
    println!("Mobiles moved:     {}", total.mobiles_moved);
    println!("Sessions voided:   {}", total.sessions_voided);
    println!("Sessions closed:   {}", total.sessions_closed);
    println!(
        "World now:         {} characters, {} objects, {} sessions, day {} hour {}",
        world.character_count(),
        world.object_count(),
        world.session_count(),
        world.time.day,
        world.time.hour
    );
}
