use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use planet_chunks::ascii;
use planet_chunks::chunk::{ChunkCache, ChunkCoord, ChunkGenerator, ChunkWorker, RequestStatus};
use planet_chunks::config::WorldConfig;
use planet_chunks::export;
use planet_chunks::planet::PlanetGenerator;

#[derive(Parser, Debug)]
#[command(name = "planet_chunks")]
#[command(about = "Generate a spherical biome map and stream terrain chunks from it")]
struct Args {
    /// JSON config file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lattice cells per side
    #[arg(short, long)]
    resolution: Option<usize>,

    /// Random seed (uses the config seed, or a random one, if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tiles per chunk side
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum number of cached chunks
    #[arg(long)]
    capacity: Option<usize>,

    /// Chunk X coordinate to generate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    chunk_x: i32,

    /// Chunk Y coordinate to generate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    chunk_y: i32,

    /// Radius in chunks pre-loaded around the chunk
    #[arg(long)]
    radius: Option<u32>,

    /// Print ASCII renderings of the planet and the chunk
    #[arg(long)]
    ascii: bool,

    /// Maximum width of ASCII renderings
    #[arg(long, default_value = "120")]
    ascii_width: usize,

    /// Export the biome map to PNG
    #[arg(long)]
    export_planet: Option<PathBuf>,

    /// Export the chunk to PNG
    #[arg(long)]
    export_chunk: Option<PathBuf>,

    /// Pixels per cell/tile in PNG exports
    #[arg(long, default_value = "1")]
    scale: u32,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("planet_chunks=info".parse()?))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    println!("Generating planet with seed: {}", config.seed);
    println!("Lattice: {}x{}", config.resolution, config.resolution);

    let lattice = Arc::new(PlanetGenerator::new(&config)?.generate());
    println!("Biome distribution:");
    print!("{}", ascii::biome_table(&lattice));

    if args.ascii {
        println!();
        print!("{}", ascii::render_lattice(&lattice, args.ascii_width));
        print!("{}", ascii::biome_legend());
    }

    if let Some(path) = &args.export_planet {
        export::export_planet_png(&lattice, args.scale, path)
            .with_context(|| format!("exporting planet to {}", path.display()))?;
        println!("Planet map saved to {}", path.display());
    }

    // Chunk generation runs in the background while this thread draws progress
    let generator = ChunkGenerator::new(Arc::clone(&lattice), &config)?;
    let cache = Arc::new(ChunkCache::with_capacity(generator, config.chunk.cache_capacity));
    let worker = ChunkWorker::new(Arc::clone(&cache));
    let center = ChunkCoord::new(args.chunk_x, args.chunk_y);

    let mut request = worker.request(center);
    let chunk = loop {
        match request.poll() {
            RequestStatus::Pending { phase, fraction } => {
                print!("\r{:<28} [{}] {:>3.0}%", phase, progress_bar(*fraction, 30), fraction * 100.0);
                std::io::stdout().flush()?;
                thread::sleep(Duration::from_millis(16));
            }
            RequestStatus::Ready(chunk) => break Arc::clone(chunk),
            RequestStatus::Failed(msg) => {
                println!();
                bail!("chunk {} failed: {}", center, msg);
            }
        }
    };
    println!("\r{:<28} [{}] 100%", "Completed", progress_bar(1.0, 30));
    println!("{}", ascii::chunk_summary(&chunk));

    if args.ascii {
        println!();
        print!("{}", ascii::render_chunk(&chunk, args.ascii_width));
        print!("{}", ascii::tile_legend());
    }

    if let Some(path) = &args.export_chunk {
        export::export_chunk_png(&chunk, args.scale, path)
            .with_context(|| format!("exporting chunk to {}", path.display()))?;
        println!("Chunk saved to {}", path.display());
    }

    let radius = config.chunk.load_radius;
    let generated = cache.load_region(center, radius);
    println!("Pre-loaded {} chunks within {} of {}", generated, radius, center);
    for coord in center.region(1) {
        if let Some(neighbor) = cache.peek(coord.x, coord.y) {
            println!("  {}", ascii::chunk_summary(&neighbor));
        }
    }

    let stats = cache.stats();
    info!(cached = stats.cached, generated = stats.generated, "done");
    println!("Cache: {}", stats.summary());
    Ok(())
}

/// Merge the config file (if any) with command-line overrides and validate.
fn build_config(args: &Args) -> Result<WorldConfig> {
    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WorldConfig::default(),
    };

    config.seed = match (args.seed, &args.config) {
        (Some(seed), _) => seed,
        (None, Some(_)) => config.seed,
        (None, None) => rand::random(),
    };
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk.chunk_size = chunk_size;
    }
    if let Some(capacity) = args.capacity {
        config.chunk.cache_capacity = capacity;
    }
    if let Some(radius) = args.radius {
        config.chunk.load_radius = radius;
    }

    config.validate()?;
    Ok(config)
}

fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}
