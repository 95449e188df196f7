//! Chunk generation with neighbor-aware edge blending.
//!
//! A chunk coordinate is mapped onto a planet lattice cell; the cell's biome picks
//! the synthesis rule and its 8 neighbors bias the edges. Every tile samples the
//! terrain noise at its *global* coordinate so adjacent chunks line up without seams.

use std::f64::consts::FRAC_PI_4;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::biomes::Biome;
use crate::config::{SynthesisParams, WorldConfig};
use crate::error::{ConfigError, GenerationError};
use crate::noise_field::{to_unit, NoiseField};
use crate::planet::{PlanetGenerator, PlanetLattice};
use crate::seeds::{tile_unit, NoiseChannel, BLEND_SALT, LAKE_SALT};
use crate::tilemap::NEIGHBOR_OFFSETS;

use super::tile::TileType;
use super::types::{Chunk, ChunkCoord, LatticeCell, NeighborBiomes};

// =============================================================================
// Progress reporting
// =============================================================================

/// Phase names reported while a chunk is synthesized, in order.
pub mod phase {
    pub const PREPARING: &str = "Preparing data";
    pub const ANALYZING: &str = "Analyzing neighbor regions";
    pub const POPULATING: &str = "Populating tiles";
    pub const FINALIZING: &str = "Finalizing";
    pub const COMPLETED: &str = "Completed";
}

const POPULATE_START: f64 = 0.20;
const POPULATE_END: f64 = 0.90;

/// Receives `(phase, fraction)` updates during generation. Fractions never decrease.
pub trait ProgressSink {
    fn report(&mut self, phase: &str, fraction: f64);
}

impl<F: FnMut(&str, f64)> ProgressSink for F {
    fn report(&mut self, phase: &str, fraction: f64) {
        self(phase, fraction)
    }
}

/// Sink that discards every update
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _phase: &str, _fraction: f64) {}
}

// =============================================================================
// Chunk sources
// =============================================================================

/// Anything that can synthesize a chunk for a coordinate.
///
/// The cache is generic over this so tests can count or fail generations.
pub trait ChunkSource: Send + Sync {
    fn generate(
        &self,
        coord: ChunkCoord,
        progress: &mut dyn ProgressSink,
    ) -> Result<Chunk, GenerationError>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for Arc<S> {
    fn generate(
        &self,
        coord: ChunkCoord,
        progress: &mut dyn ProgressSink,
    ) -> Result<Chunk, GenerationError> {
        (**self).generate(coord, progress)
    }
}

/// Synthesizes tile grids from a shared planet lattice.
///
/// Stateless apart from the lattice, the session seed and tuning, so one
/// generator can serve any number of threads.
#[derive(Clone, Debug)]
pub struct ChunkGenerator {
    lattice: Arc<PlanetLattice>,
    seed: u64,
    chunk_size: usize,
    synthesis: SynthesisParams,
    terrain: NoiseField,
}

impl ChunkGenerator {
    /// Create a generator over an existing lattice. The lattice's seed is the
    /// session seed; `config` supplies chunk size and synthesis tuning.
    pub fn new(lattice: Arc<PlanetLattice>, config: &WorldConfig) -> Result<Self, ConfigError> {
        config.chunk.validate()?;
        config.synthesis.validate()?;

        let seed = lattice.seed();
        Ok(Self {
            lattice,
            seed,
            chunk_size: config.chunk.chunk_size,
            synthesis: config.synthesis.clone(),
            terrain: NoiseField::channel(seed, NoiseChannel::Terrain),
        })
    }

    /// Generate the planet for `config` and wrap a chunk generator around it.
    pub fn from_config(config: &WorldConfig) -> Result<Self, ConfigError> {
        let lattice = PlanetGenerator::new(config)?.generate();
        Self::new(Arc::new(lattice), config)
    }

    pub fn lattice(&self) -> &Arc<PlanetLattice> {
        &self.lattice
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Lattice cell for a chunk coordinate.
    ///
    /// Toroidal: chunk (0, 0) lands on the centre cell and both axes wrap modulo
    /// the resolution, so every integer coordinate maps to exactly one cell.
    pub fn map_to_lattice(&self, coord: ChunkCoord) -> LatticeCell {
        let res = self.lattice.resolution() as i64;
        let half = res / 2;
        LatticeCell {
            row: (coord.y as i64 + half).rem_euclid(res) as usize,
            col: (coord.x as i64 + half).rem_euclid(res) as usize,
        }
    }

    /// Global tile coordinate of a tile inside a chunk.
    pub fn global_coord(&self, coord: ChunkCoord, x: usize, y: usize) -> (i64, i64) {
        let size = self.chunk_size as i64;
        (coord.x as i64 * size + x as i64, coord.y as i64 * size + y as i64)
    }

    /// Generate a chunk.
    pub fn generate_chunk(&self, chunk_x: i32, chunk_y: i32) -> Chunk {
        self.generate_chunk_with_progress(ChunkCoord::new(chunk_x, chunk_y), &mut NoProgress)
    }

    /// Generate a chunk, reporting phases to `progress`.
    pub fn generate_chunk_with_progress(
        &self,
        coord: ChunkCoord,
        progress: &mut dyn ProgressSink,
    ) -> Chunk {
        let start = Instant::now();
        progress.report(phase::PREPARING, 0.05);

        let cell = self.map_to_lattice(coord);
        let center = self.lattice.biome_at(cell.row, cell.col);
        let neighbors = NeighborBiomes(self.lattice.neighbor_biomes(cell.row, cell.col));
        progress.report(phase::ANALYZING, 0.15);

        let size = self.chunk_size;
        let centre = (size as f64 - 1.0) / 2.0;
        let max_dist = centre * std::f64::consts::SQRT_2;

        let mut tiles = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let (gx, gy) = self.global_coord(coord, x, y);
                let biome = self.blended_biome(center, &neighbors, x, y, centre, max_dist, gx, gy);
                tiles.push(self.tile_for(biome, &neighbors, gx, gy));
            }
            let fraction = POPULATE_START + (POPULATE_END - POPULATE_START) * (y + 1) as f64 / size as f64;
            progress.report(phase::POPULATING, fraction);
        }

        progress.report(phase::FINALIZING, 0.95);
        let chunk = Chunk::assemble(coord, cell, center, neighbors, self.seed, size, tiles);

        debug!(
            x = coord.x,
            y = coord.y,
            row = cell.row,
            col = cell.col,
            biome = %center,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chunk generated"
        );
        progress.report(phase::COMPLETED, 1.0);
        chunk
    }

    // =========================================================================
    // Edge blending
    // =========================================================================

    /// Biome whose rule synthesizes tile `(x, y)`.
    ///
    /// Past `blend_start` of the centre-to-corner distance, the neighbor in the
    /// tile's octant takes over with a chance that grows toward the edge, capped
    /// at `max_blend`.
    #[allow(clippy::too_many_arguments)]
    fn blended_biome(
        &self,
        center: Biome,
        neighbors: &NeighborBiomes,
        x: usize,
        y: usize,
        centre: f64,
        max_dist: f64,
        gx: i64,
        gy: i64,
    ) -> Biome {
        if max_dist <= 0.0 {
            return center;
        }
        let dx = x as f64 - centre;
        let dy = y as f64 - centre;
        let d = (dx * dx + dy * dy).sqrt() / max_dist;

        let weight = blend_weight(d, self.synthesis.blend_start, self.synthesis.max_blend);
        if weight <= 0.0 {
            return center;
        }

        let neighbor = neighbors.get(octant_neighbor(dx, dy));
        if neighbor != center && tile_unit(self.seed, BLEND_SALT, gx, gy) < weight {
            neighbor
        } else {
            center
        }
    }

    // =========================================================================
    // Per-biome synthesis
    // =========================================================================

    /// Terrain noise at a global tile coordinate, normalized to `[0, 1]`.
    ///
    /// Falls back to 0.5 if the sample fails.
    pub fn terrain_noise(&self, frequency: f64, gx: i64, gy: i64) -> f64 {
        self.terrain_sample(frequency, [gx as f64, gy as f64])
    }

    fn terrain_sample(&self, frequency: f64, point: [f64; 2]) -> f64 {
        let params = self.synthesis.terrain_fractal(frequency);
        match self.terrain.sample2(point, &params) {
            Ok(v) => to_unit(v),
            Err(err) => {
                warn!(x = point[0], y = point[1], "terrain noise failed ({err}), using neutral value");
                0.5
            }
        }
    }

    fn frequency_for(&self, biome: Biome) -> f64 {
        match biome {
            Biome::DeepOcean | Biome::Ocean => self.synthesis.ocean_frequency,
            Biome::Beach => self.synthesis.beach_frequency,
            _ => self.synthesis.land_frequency,
        }
    }

    /// Tile produced by `biome`'s rule at a global coordinate, given the
    /// neighborhood of the chunk being generated.
    pub fn tile_for(&self, biome: Biome, neighbors: &NeighborBiomes, gx: i64, gy: i64) -> TileType {
        let s = &self.synthesis;
        let n = self.terrain_noise(self.frequency_for(biome), gx, gy);

        let lake = if neighbors.has_ocean() {
            s.lake_threshold_coastal
        } else {
            s.lake_threshold_inland
        };
        let is_lake = || tile_unit(self.seed, LAKE_SALT, gx, gy) < lake;

        match biome {
            Biome::DeepOcean | Biome::Ocean => {
                let ratio = match (biome, neighbors.has_land()) {
                    (Biome::DeepOcean, false) => s.deep_ocean_water_ratio,
                    (Biome::DeepOcean, true) => s.deep_ocean_coastal_water_ratio,
                    (_, false) => s.ocean_water_ratio,
                    (_, true) => s.ocean_coastal_water_ratio,
                };
                ocean_tile(n, ratio)
            }
            Biome::Beach => {
                if n < s.beach_water_below {
                    TileType::Water
                } else if n > s.beach_grass_above {
                    TileType::Grass
                } else {
                    TileType::Sand
                }
            }
            _ if is_lake() => TileType::Water,
            Biome::Desert => {
                if n > s.desert_rock_above {
                    TileType::Rock
                } else if n < s.desert_sand_below {
                    TileType::Sand
                } else {
                    TileType::Desert
                }
            }
            Biome::Snow => {
                if n > s.snow_rock_above {
                    TileType::Rock
                } else {
                    TileType::Snow
                }
            }
            Biome::Mountain => {
                if n > s.mountain_snow_above {
                    TileType::Snow
                } else if n < s.mountain_grass_below {
                    TileType::Grass
                } else {
                    TileType::Rock
                }
            }
            Biome::Forest => {
                if n < s.forest_clearing_below {
                    TileType::Grass
                } else {
                    TileType::Forest
                }
            }
            Biome::Grassland => {
                if n > s.grassland_grove_above {
                    TileType::Forest
                } else if n < s.grassland_sand_below {
                    TileType::Sand
                } else {
                    TileType::Grass
                }
            }
        }
    }
}

impl ChunkSource for ChunkGenerator {
    fn generate(
        &self,
        coord: ChunkCoord,
        progress: &mut dyn ProgressSink,
    ) -> Result<Chunk, GenerationError> {
        Ok(self.generate_chunk_with_progress(coord, progress))
    }
}

/// Water below `ratio`, a sand shelf over half the remainder, grass above.
fn ocean_tile(n: f64, ratio: f64) -> TileType {
    if n < ratio {
        TileType::Water
    } else if n < ratio + (1.0 - ratio) / 2.0 {
        TileType::Sand
    } else {
        TileType::Grass
    }
}

/// Chance of adopting the neighbor biome at normalized distance `d` from the centre.
fn blend_weight(d: f64, blend_start: f64, max_blend: f64) -> f64 {
    if d <= blend_start {
        return 0.0;
    }
    ((d - blend_start) / (1.0 - blend_start)).min(max_blend)
}

/// Index into [`NEIGHBOR_OFFSETS`] of the octant containing the offset `(dx, dy)`.
/// `dy` grows southward, matching lattice rows.
fn octant_neighbor(dx: f64, dy: f64) -> usize {
    // Sectors counted clockwise from east in 45° steps
    const SECTOR_OFFSETS: [(i64, i64); 8] =
        [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

    let sector = ((dy.atan2(dx) / FRAC_PI_4).round() as i64).rem_euclid(8) as usize;
    let offset = SECTOR_OFFSETS[sector];
    NEIGHBOR_OFFSETS
        .iter()
        .position(|&o| o == offset)
        .unwrap_or(NeighborBiomes::EAST)
}
