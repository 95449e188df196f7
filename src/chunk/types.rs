//! Core types for chunk generation.

use serde::{Deserialize, Serialize};

use crate::biomes::Biome;

use super::tile::{TileType, TILE_TYPE_COUNT};

/// Integer coordinate of a square terrain patch. Unbounded; mapped onto the planet
/// lattice toroidally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }

    /// Chessboard distance in chunks.
    pub fn chebyshev_distance(self, other: ChunkCoord) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx.max(dy).min(u32::MAX as u64) as u32
    }

    /// Every coordinate within `radius` (chessboard) of `self`, row by row.
    pub fn region(self, radius: u32) -> impl Iterator<Item = ChunkCoord> {
        let r = radius as i32;
        (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| self.offset(dx, dy)))
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Planet lattice cell a chunk was mapped to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LatticeCell {
    pub row: usize,
    pub col: usize,
}

/// Biomes of the 8 lattice cells around a chunk's cell, in NW, N, NE, W, E, SW, S, SE
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NeighborBiomes(pub [Biome; 8]);

impl NeighborBiomes {
    pub const NORTH_WEST: usize = 0;
    pub const NORTH: usize = 1;
    pub const NORTH_EAST: usize = 2;
    pub const WEST: usize = 3;
    pub const EAST: usize = 4;
    pub const SOUTH_WEST: usize = 5;
    pub const SOUTH: usize = 6;
    pub const SOUTH_EAST: usize = 7;

    /// Neighbor biome in one of the 8 directions (see the index constants).
    pub fn get(&self, index: usize) -> Biome {
        self.0[index % 8]
    }

    pub fn iter(&self) -> impl Iterator<Item = Biome> + '_ {
        self.0.iter().copied()
    }

    /// Any neighbor is DeepOcean or Ocean
    pub fn has_ocean(&self) -> bool {
        self.iter().any(Biome::is_ocean)
    }

    /// Any neighbor is a land biome (anything but the ocean family)
    pub fn has_land(&self) -> bool {
        self.iter().any(Biome::is_land)
    }

    /// Check if any neighbors are different from the center biome
    pub fn has_different_neighbor(&self, center: Biome) -> bool {
        self.iter().any(|b| b != center)
    }
}

/// A generated square grid of tiles. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    coord: ChunkCoord,
    cell: LatticeCell,
    size: usize,
    center_biome: Biome,
    neighbors: NeighborBiomes,
    seed: u64,
    /// Tiles in row-major order, `size * size` long
    tiles: Box<[TileType]>,
}

impl Chunk {
    /// Build a chunk from row-major tiles. Returns `None` if `tiles.len() != size²`.
    pub fn from_tiles(
        coord: ChunkCoord,
        cell: LatticeCell,
        center_biome: Biome,
        neighbors: NeighborBiomes,
        seed: u64,
        size: usize,
        tiles: Vec<TileType>,
    ) -> Option<Self> {
        if tiles.len() != size * size {
            return None;
        }
        Some(Self::assemble(coord, cell, center_biome, neighbors, seed, size, tiles))
    }

    /// Build a chunk from tiles the caller has already sized correctly.
    pub(super) fn assemble(
        coord: ChunkCoord,
        cell: LatticeCell,
        center_biome: Biome,
        neighbors: NeighborBiomes,
        seed: u64,
        size: usize,
        tiles: Vec<TileType>,
    ) -> Self {
        debug_assert_eq!(tiles.len(), size * size);
        Self {
            coord,
            cell,
            size,
            center_biome,
            neighbors,
            seed,
            tiles: tiles.into_boxed_slice(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn cell(&self) -> LatticeCell {
        self.cell
    }

    /// Tiles per side
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn center_biome(&self) -> Biome {
        self.center_biome
    }

    pub fn neighbors(&self) -> &NeighborBiomes {
        &self.neighbors
    }

    /// Seed used to generate this chunk
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get tile at (x, y). Panics if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> TileType {
        self.tiles[y * self.size + x]
    }

    pub fn try_get(&self, x: usize, y: usize) -> Option<TileType> {
        if x < self.size && y < self.size {
            Some(self.tiles[y * self.size + x])
        } else {
            None
        }
    }

    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    pub fn row(&self, y: usize) -> &[TileType] {
        &self.tiles[y * self.size..(y + 1) * self.size]
    }

    /// Row-major tile codes (`0..=6`)
    pub fn codes(&self) -> Vec<u8> {
        self.tiles.iter().map(|t| t.code()).collect()
    }

    /// Count of each tile type, indexed by [`TileType::code`].
    pub fn composition(&self) -> [usize; TILE_TYPE_COUNT] {
        let mut counts = [0usize; TILE_TYPE_COUNT];
        for tile in self.tiles.iter() {
            counts[tile.code() as usize] += 1;
        }
        counts
    }

    /// Share of water tiles (0.0 to 1.0)
    pub fn water_fraction(&self) -> f64 {
        if self.tiles.is_empty() {
            return 0.0;
        }
        let water = self.tiles.iter().filter(|t| t.is_water()).count();
        water as f64 / self.tiles.len() as f64
    }

    /// Estimated memory footprint in bytes
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.tiles.len() * std::mem::size_of::<TileType>()
    }
}
