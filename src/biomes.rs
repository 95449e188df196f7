//! Planet biome classification.
//!
//! Each lattice cell gets one of eight biomes from its elevation, temperature and
//! humidity through a fixed decision list (first match wins).

use serde::{Deserialize, Serialize};

/// Elevation below which a cell is deep ocean
pub const DEEP_OCEAN_LEVEL: f64 = 0.30;
/// Elevation below which a cell is ocean
pub const SEA_LEVEL: f64 = 0.50;
/// Elevation below which a cell is beach
pub const BEACH_LEVEL: f64 = 0.53;
/// Elevation above which a cell is mountain
pub const MOUNTAIN_LEVEL: f64 = 0.80;

const SNOW_TEMPERATURE: f64 = 0.20;
const DESERT_HUMIDITY: f64 = 0.30;
const DESERT_TEMPERATURE: f64 = 0.60;
const FOREST_HUMIDITY: f64 = 0.60;
const FOREST_TEMPERATURE: f64 = 0.40;

/// Coarse climate/terrain class of a lattice cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    DeepOcean,
    Ocean,
    Beach,
    #[default]
    Grassland,
    Forest,
    Desert,
    Snow,
    Mountain,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        &[
            Biome::DeepOcean,
            Biome::Ocean,
            Biome::Beach,
            Biome::Grassland,
            Biome::Forest,
            Biome::Desert,
            Biome::Snow,
            Biome::Mountain,
        ]
    }

    /// Stable numeric id (0..=7)
    pub fn id(self) -> u8 {
        match self {
            Biome::DeepOcean => 0,
            Biome::Ocean => 1,
            Biome::Beach => 2,
            Biome::Grassland => 3,
            Biome::Forest => 4,
            Biome::Desert => 5,
            Biome::Snow => 6,
            Biome::Mountain => 7,
        }
    }

    pub fn from_id(id: u8) -> Option<Biome> {
        Biome::all().get(id as usize).copied()
    }

    /// Human-readable name for legends
    pub fn name(self) -> &'static str {
        match self {
            Biome::DeepOcean => "Deep Ocean",
            Biome::Ocean => "Ocean",
            Biome::Beach => "Beach",
            Biome::Grassland => "Grassland",
            Biome::Forest => "Forest",
            Biome::Desert => "Desert",
            Biome::Snow => "Snow",
            Biome::Mountain => "Mountain",
        }
    }

    /// Display color (RGB)
    pub fn color(self) -> [u8; 3] {
        match self {
            Biome::DeepOcean => [5, 22, 64],
            Biome::Ocean => [22, 80, 158],
            Biome::Beach => [230, 214, 153],
            Biome::Grassland => [88, 161, 48],
            Biome::Forest => [38, 112, 21],
            Biome::Desert => [219, 186, 112],
            Biome::Snow => [240, 240, 240],
            Biome::Mountain => [110, 110, 110],
        }
    }

    /// Elevation range the classifier assigns to this biome as `(low, high)`.
    ///
    /// Bands are `[low, high)` except the four climate-driven land biomes, which share
    /// `[BEACH_LEVEL, MOUNTAIN_LEVEL]` (inclusive; Mountain starts above 0.80), and
    /// Mountain, which is `(MOUNTAIN_LEVEL, 1.0]`.
    pub fn elevation_band(self) -> (f64, f64) {
        match self {
            Biome::DeepOcean => (0.0, DEEP_OCEAN_LEVEL),
            Biome::Ocean => (DEEP_OCEAN_LEVEL, SEA_LEVEL),
            Biome::Beach => (SEA_LEVEL, BEACH_LEVEL),
            Biome::Grassland | Biome::Forest | Biome::Desert | Biome::Snow => {
                (BEACH_LEVEL, MOUNTAIN_LEVEL)
            }
            Biome::Mountain => (MOUNTAIN_LEVEL, 1.0),
        }
    }

    /// Typical terrain height used when a single representative value is needed.
    pub fn nominal_elevation(self) -> f64 {
        match self {
            Biome::DeepOcean => 0.1,
            Biome::Ocean => 0.2,
            Biome::Beach => 0.4,
            Biome::Grassland => 0.5,
            Biome::Forest => 0.6,
            Biome::Desert => 0.5,
            Biome::Snow => 0.8,
            Biome::Mountain => 0.9,
        }
    }

    /// DeepOcean or Ocean
    pub fn is_ocean(self) -> bool {
        matches!(self, Biome::DeepOcean | Biome::Ocean)
    }

    pub fn is_land(self) -> bool {
        !self.is_ocean()
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized climate values for one lattice cell, each in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateSample {
    pub elevation: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl ClimateSample {
    /// Mid-range values used when noise sampling fails.
    pub const NEUTRAL: ClimateSample = ClimateSample {
        elevation: 0.5,
        temperature: 0.5,
        humidity: 0.5,
    };

    pub fn classify(&self) -> Biome {
        classify(self.elevation, self.temperature, self.humidity)
    }
}

/// Classify a cell. Rules are evaluated in order; the first match wins and the
/// final branch catches everything else, so every input gets exactly one biome.
pub fn classify(elevation: f64, temperature: f64, humidity: f64) -> Biome {
    if elevation < DEEP_OCEAN_LEVEL {
        return Biome::DeepOcean;
    }
    if elevation < SEA_LEVEL {
        return Biome::Ocean;
    }
    if elevation < BEACH_LEVEL {
        return Biome::Beach;
    }
    if elevation > MOUNTAIN_LEVEL {
        return Biome::Mountain;
    }
    if temperature < SNOW_TEMPERATURE {
        return Biome::Snow;
    }
    if humidity < DESERT_HUMIDITY && temperature > DESERT_TEMPERATURE {
        return Biome::Desert;
    }
    if humidity > FOREST_HUMIDITY && temperature > FOREST_TEMPERATURE {
        return Biome::Forest;
    }
    Biome::Grassland
}
