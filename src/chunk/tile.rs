//! Tile types for chunk grids.

use serde::{Deserialize, Serialize};

/// Fine-grained terrain category inside a chunk.
///
/// The discriminant is the tile code exposed to renderers (`0..=6`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    Water = 0,
    #[default]
    Grass = 1,
    Sand = 2,
    Rock = 3,
    Snow = 4,
    Forest = 5,
    Desert = 6,
}

/// Number of tile types
pub const TILE_TYPE_COUNT: usize = 7;

impl TileType {
    pub fn all() -> &'static [TileType] {
        &[
            TileType::Water,
            TileType::Grass,
            TileType::Sand,
            TileType::Rock,
            TileType::Snow,
            TileType::Forest,
            TileType::Desert,
        ]
    }

    /// Small integer code for this tile
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<TileType> {
        TileType::all().get(code as usize).copied()
    }

    /// Legend name
    pub fn name(self) -> &'static str {
        match self {
            TileType::Water => "Water",
            TileType::Grass => "Grass",
            TileType::Sand => "Sand",
            TileType::Rock => "Rock",
            TileType::Snow => "Snow",
            TileType::Forest => "Forest",
            TileType::Desert => "Desert",
        }
    }

    /// Get RGB color for rendering
    pub fn color(self) -> [u8; 3] {
        match self {
            TileType::Water => [0, 100, 200],
            TileType::Grass => [50, 150, 50],
            TileType::Sand => [200, 180, 100],
            TileType::Rock => [120, 120, 120],
            TileType::Snow => [240, 240, 240],
            TileType::Forest => [30, 100, 30],
            TileType::Desert => [200, 160, 80],
        }
    }

    pub fn is_water(self) -> bool {
        self == TileType::Water
    }
}

impl std::fmt::Display for TileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
