//! World survey binary - bulk-generates chunks and reports what a seed contains.
//!
//! Usage: cargo run --release --bin generate_world -- [OPTIONS]
//!
//! Options:
//!   --seed <SEED>        Noise seed (default: 12345)
//!   --radius <CHUNKS>    Chebyshev radius around the origin chunk (default: 16)
//!   --threshold <T>      Keep samples above this noise value (default: 0.3)
//!   --jobs <N>           Max parallel chunk builds (default: all cores)
//!   --out <FILE>         Write a JSON summary to this file
//!   --slot <NAME>        Save a snapshot with this seed to saves/<NAME>.dat

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use serde_json::json;

use slipstream::core::logging;
use slipstream::generation::{ChunkCoord, GenerationConfig, WorldGen};
use slipstream::snapshot::{SimulationSnapshot, SnapshotStore};

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let radius = parse_u32_arg(&args, "--radius").unwrap_or(16);
    let threshold = parse_f64_arg(&args, "--threshold").unwrap_or(0.3);
    let out = parse_str_arg(&args, "--out").map(PathBuf::from);
    let slot = parse_str_arg(&args, "--slot");

    if let Some(jobs) = parse_usize_arg(&args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            eprintln!("Failed to configure thread pool: {}", e);
        }
    }

    let config = GenerationConfig { seed, threshold, ..Default::default() };
    let side = radius * 2 + 1;

    println!("=== Slipstream World Survey ===");
    println!("Seed:      {}", seed);
    println!("Threshold: {}", threshold);
    println!("Chunks:    {} x {} ({} world units each)", side, side, config.chunk_world_size());
    println!();

    let mut world = match WorldGen::new(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Invalid object weights: {}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let generated = world.generate_around(ChunkCoord::new(0, 0), radius);
    let gen_secs = start.elapsed().as_secs_f64();

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut points = 0usize;
    let mut empty = 0usize;
    let r = radius as i32;
    for x in -r..=r {
        for y in -r..=r {
            let Some(chunk) = world.store().get(ChunkCoord::new(x, y)) else {
                continue;
            };
            points += chunk.len();
            if chunk.is_empty() {
                empty += 1;
            }
            for object in world.materialize(&chunk) {
                *kinds.entry(object.id).or_default() += 1;
            }
        }
    }

    println!(
        "Generated {} chunks in {:.2}s ({:.0} chunks/sec)",
        generated,
        gen_secs,
        generated as f64 / gen_secs.max(1e-9)
    );
    println!("Kept points: {} ({} empty chunks)", points, empty);
    for (kind, count) in &kinds {
        let share = *count as f64 / points.max(1) as f64 * 100.0;
        println!("  {:<14} {:>8} ({:.1}%)", kind, count, share);
    }

    if let Some(path) = out {
        let summary = json!({
            "seed": seed,
            "radius": radius,
            "threshold": threshold,
            "chunk_world_size": config.chunk_world_size(),
            "chunks": generated,
            "empty_chunks": empty,
            "points": points,
            "kinds": kinds,
        });
        let written = serde_json::to_string_pretty(&summary)
            .map_err(std::io::Error::other)
            .and_then(|text| std::fs::write(&path, text));
        match written {
            Ok(()) => println!("Summary: {}", path.display()),
            Err(e) => eprintln!("Failed to write {}: {}", path.display(), e),
        }
    }

    if let Some(name) = slot {
        let store = SnapshotStore::new("saves");
        let snapshot = SimulationSnapshot { seed: Some(seed), ..Default::default() };
        match store.save(&name, &snapshot) {
            Ok(()) => println!("Slot '{}' saved; start the server with --slot {}", name, name),
            Err(e) => eprintln!("Failed to save slot '{}': {}", name, e),
        }
    }
}

fn parse_f64_arg(args: &[String], flag: &str) -> Option<f64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
