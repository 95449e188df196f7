//! Chunk-based terrain on top of the planet lattice.
//!
//! Chunks are square tile grids addressed by unbounded integer coordinates. Each
//! one is synthesized from the biome of the lattice cell it maps to, with its edges
//! blended toward the neighboring cells, and memoized by a bounded cache.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use planet_chunks::chunk::{ChunkCache, ChunkGenerator};
//! use planet_chunks::config::WorldConfig;
//!
//! let generator = ChunkGenerator::from_config(&WorldConfig::new(150, 42))?;
//! let cache = Arc::new(ChunkCache::new(generator));
//!
//! let chunk = cache.get_chunk(5, 5)?;
//! println!("{:.1}% water", chunk.water_fraction() * 100.0);
//! ```

mod cache;
mod generator;
mod tile;
mod types;
mod worker;

// Re-export main types
pub use cache::{CacheStats, ChunkCache};
pub use generator::{phase, ChunkGenerator, ChunkSource, NoProgress, ProgressSink};
pub use tile::{TileType, TILE_TYPE_COUNT};
pub use types::{Chunk, ChunkCoord, LatticeCell, NeighborBiomes};
pub use worker::{ChunkRequest, ChunkWorker, RequestStatus, QUEUED_PHASE};
