//! Planet and chunk generation library
//!
//! Builds a spherical biome lattice from seeded fractal noise, then synthesizes
//! detailed tile chunks on demand and caches them. Re-exports modules for use by
//! binaries and tools.

pub mod ascii;
pub mod biomes;
pub mod chunk;
pub mod config;
pub mod error;
pub mod export;
pub mod noise_field;
pub mod planet;
pub mod seeds;
pub mod tilemap;

pub use biomes::{classify, Biome};
pub use chunk::{Chunk, ChunkCache, ChunkCoord, ChunkGenerator, ChunkWorker, TileType};
pub use config::WorldConfig;
pub use error::{ConfigError, GenerationError, WorldError};
pub use planet::{PlanetGenerator, PlanetLattice};
