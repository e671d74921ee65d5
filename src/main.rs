//! Slipstream - headless flight server
//!
//! Usage: slipstream [CONFIG.json] [OPTIONS]
//!
//! Options:
//!   --port <PORT>    Listen port (default: 7050)
//!   --slot <NAME>    Save slot to start from (default: "default")
//!   --slots <DIR>    Save slot directory (default: "saves")

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use slipstream::core::logging;
use slipstream::core::time::Cadence;
use slipstream::simulation::{Simulation, SimulationConfig};
use slipstream::snapshot::SnapshotStore;
use slipstream_net::{DEFAULT_PORT, MessageQueue, MessageServer};

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> slipstream::core::Result<()> {
    let config = match parse_config_arg(args) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            SimulationConfig::load(&path)?
        }
        None => SimulationConfig::default(),
    };
    let port = parse_u16_arg(args, "--port").unwrap_or(DEFAULT_PORT);
    let slot = parse_str_arg(args, "--slot").unwrap_or_else(|| "default".to_string());
    let slots = SnapshotStore::new(parse_str_arg(args, "--slots").unwrap_or_else(|| "saves".to_string()));

    let snapshot = slots.load_or_init(&slot)?;
    let queue = Arc::new(MessageQueue::new());
    let mut sim = Simulation::new(config.clone(), queue.clone(), snapshot)?;
    sim.enable_background_pruning()?;

    // Message server in background thread with tokio runtime
    let running = Arc::new(AtomicBool::new(true));
    let server_queue = queue.clone();
    let server_running = running.clone();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create tokio runtime: {}", e);
                server_running.store(false, Ordering::Relaxed);
                return;
            }
        };
        rt.block_on(async move {
            match MessageServer::bind(("0.0.0.0", port), server_queue).await {
                Ok(_server) => loop {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                },
                Err(e) => {
                    log::error!("Failed to start message server on port {}: {}", port, e);
                    server_running.store(false, Ordering::Relaxed);
                }
            }
        });
    });

    let mut physics = Cadence::new(config.tick_rate_hz);
    let mut terrain = Cadence::new(config.terrain_rate_hz);
    let mut last_saved = sim.snapshot().clone();
    let mut save = Cadence::new(0.2);

    log::info!(
        "Simulation running: {} Hz physics, {} Hz terrain, slot '{}'",
        config.tick_rate_hz,
        config.terrain_rate_hz,
        slot
    );

    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        if terrain.poll(now) {
            sim.stream_world();
        }
        if physics.poll(now) {
            sim.step();
        }
        if save.poll(now) && *sim.snapshot() != last_saved {
            last_saved = sim.snapshot().clone();
            if let Err(e) = slots.save(&slot, &last_saved) {
                log::error!("Failed to save slot '{}': {}", slot, e);
            }
        }

        let wait = physics.until_due(now).min(terrain.until_due(now));
        std::thread::sleep(wait);
    }
    Ok(())
}

fn parse_config_arg(args: &[String]) -> Option<PathBuf> {
    let mut i = 1;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
            continue;
        }
        return Some(Path::new(&args[i]).to_path_buf());
    }
    None
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u16_arg(args: &[String], flag: &str) -> Option<u16> {
    parse_str_arg(args, flag).and_then(|s| s.parse().ok())
}
