//! Debug tool: print biome shares, and tile composition of a few chunks, for one or more seeds

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use planet_chunks::ascii::{biome_table, chunk_summary, render_lattice};
use planet_chunks::chunk::ChunkGenerator;
use planet_chunks::config::WorldConfig;
use planet_chunks::planet::PlanetGenerator;

#[derive(Parser, Debug)]
#[command(name = "biome_stats")]
#[command(about = "Print biome distribution statistics")]
struct Args {
    /// Seeds to analyze
    #[arg(short, long, default_values_t = [12345u64])]
    seed: Vec<u64>,

    /// Lattice cells per side
    #[arg(short, long, default_value = "64")]
    resolution: usize,

    /// Chunks sampled along the equator
    #[arg(long, default_value = "4")]
    chunks: i32,

    /// Tiles per chunk side for sampled chunks
    #[arg(long, default_value = "64")]
    chunk_size: usize,

    /// Also print the ASCII map
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("planet_chunks=warn".parse()?))
        .init();

    let args = Args::parse();

    for &seed in &args.seed {
        let mut config = WorldConfig::new(args.resolution, seed);
        config.chunk.chunk_size = args.chunk_size;

        let lattice = Arc::new(PlanetGenerator::new(&config)?.generate());

        println!("=== BIOME STATS ({}x{}) seed={} ===", args.resolution, args.resolution, seed);
        print!("{}", biome_table(&lattice));

        if args.map {
            println!();
            print!("{}", render_lattice(&lattice, 120));
        }

        let generator = ChunkGenerator::new(Arc::clone(&lattice), &config)?;
        println!("Sampled chunks:");
        for i in 0..args.chunks {
            let chunk = generator.generate_chunk(i * 3, 0);
            println!("  {}", chunk_summary(&chunk));
        }
        println!();
    }

    Ok(())
}
