//! World configuration: lattice, noise tuning, chunk layout and synthesis constants.
//!
//! Everything here is immutable for the lifetime of a generated world. Changing any
//! value requires regenerating the planet lattice.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::noise_field::FractalParams;

/// Default lattice resolution (cells per side)
pub const DEFAULT_RESOLUTION: usize = 150;

/// Default chunk edge length in tiles
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default number of chunks kept by the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default preload radius around a viewpoint, in chunks
pub const DEFAULT_LOAD_RADIUS: u32 = 2;

/// Complete world configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Lattice cells per side (latitude rows and longitude columns)
    pub resolution: usize,
    /// Base seed; every noise channel and hash derives from it
    pub seed: u64,
    /// Fractal tuning for the planet-scale channels
    pub noise: FractalParams,
    /// Chunk layout and cache bounds
    pub chunk: ChunkConfig,
    /// Per-biome tile synthesis constants
    pub synthesis: SynthesisParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            seed: 0,
            noise: FractalParams {
                octaves: 6,
                persistence: 0.5,
                lacunarity: 2.0,
                frequency: 2.0,
            },
            chunk: ChunkConfig::default(),
            synthesis: SynthesisParams::default(),
        }
    }
}

impl WorldConfig {
    /// Default configuration with the given seed and resolution.
    pub fn new(resolution: usize, seed: u64) -> Self {
        Self {
            resolution,
            seed,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value that generation depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution < 2 {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        validate_fractal(&self.noise)?;
        self.chunk.validate()?;
        self.synthesis.validate()
    }
}

fn validate_fractal(params: &FractalParams) -> Result<(), ConfigError> {
    if params.octaves == 0 {
        return Err(ConfigError::InvalidNoise { name: "octaves", value: 0.0 });
    }
    if !(params.frequency.is_finite() && params.frequency > 0.0) {
        return Err(ConfigError::InvalidNoise { name: "frequency", value: params.frequency });
    }
    if !(params.lacunarity.is_finite() && params.lacunarity > 0.0) {
        return Err(ConfigError::InvalidNoise { name: "lacunarity", value: params.lacunarity });
    }
    if !(params.persistence > 0.0 && params.persistence <= 1.0) {
        return Err(ConfigError::InvalidNoise { name: "persistence", value: params.persistence });
    }
    Ok(())
}

/// Chunk layout and cache bounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Tiles per chunk side
    pub chunk_size: usize,
    /// Maximum number of chunks held by the cache
    pub cache_capacity: usize,
    /// Radius (in chunks) pre-warmed around a viewpoint
    pub load_radius: u32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            load_radius: DEFAULT_LOAD_RADIUS,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity);
        }
        Ok(())
    }
}

/// Tile synthesis constants.
///
/// Noise thresholds are expressed on the normalized `[0, 1]` scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    // =========================================================================
    // Terrain noise
    // =========================================================================

    /// Octaves for the tile-level terrain layer
    pub terrain_octaves: u32,
    /// Amplitude decay per octave
    pub terrain_persistence: f64,
    /// Frequency multiplier per octave
    pub terrain_lacunarity: f64,
    /// Base frequency for DeepOcean/Ocean chunks
    pub ocean_frequency: f64,
    /// Base frequency for Beach chunks
    pub beach_frequency: f64,
    /// Base frequency for every other land biome
    pub land_frequency: f64,

    // =========================================================================
    // Ocean family
    // =========================================================================

    /// Share of water in a DeepOcean chunk with no land neighbor
    pub deep_ocean_water_ratio: f64,
    /// Share of water in a DeepOcean chunk next to land
    pub deep_ocean_coastal_water_ratio: f64,
    /// Share of water in an Ocean chunk with no land neighbor
    pub ocean_water_ratio: f64,
    /// Share of water in an Ocean chunk next to land
    pub ocean_coastal_water_ratio: f64,

    // =========================================================================
    // Lakes and oases on land
    // =========================================================================

    /// Per-tile water chance when an ocean-family neighbor exists
    pub lake_threshold_coastal: f64,
    /// Per-tile water chance inland
    pub lake_threshold_inland: f64,

    // =========================================================================
    // Land biome thresholds
    // =========================================================================

    pub beach_water_below: f64,
    pub beach_grass_above: f64,
    pub desert_rock_above: f64,
    pub desert_sand_below: f64,
    pub snow_rock_above: f64,
    pub mountain_snow_above: f64,
    pub mountain_grass_below: f64,
    pub forest_clearing_below: f64,
    pub grassland_grove_above: f64,
    pub grassland_sand_below: f64,

    // =========================================================================
    // Neighbor blending
    // =========================================================================

    /// Normalized distance from the chunk centre where blending begins
    pub blend_start: f64,
    /// Maximum chance that an edge tile adopts the neighbor biome
    pub max_blend: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            terrain_octaves: 4,
            terrain_persistence: 0.5,
            terrain_lacunarity: 2.0,
            ocean_frequency: 0.02,
            beach_frequency: 0.05,
            land_frequency: 0.03,

            deep_ocean_water_ratio: 0.95,
            deep_ocean_coastal_water_ratio: 0.85,
            ocean_water_ratio: 0.9,
            ocean_coastal_water_ratio: 0.75,

            lake_threshold_coastal: 0.01,
            lake_threshold_inland: 0.005,

            beach_water_below: 0.35,
            beach_grass_above: 0.70,
            desert_rock_above: 0.72,
            desert_sand_below: 0.30,
            snow_rock_above: 0.70,
            mountain_snow_above: 0.65,
            mountain_grass_below: 0.30,
            forest_clearing_below: 0.35,
            grassland_grove_above: 0.68,
            grassland_sand_below: 0.25,

            blend_start: 0.3,
            max_blend: 0.5,
        }
    }
}

impl SynthesisParams {
    /// Fractal parameters for the terrain layer at a given base frequency.
    pub fn terrain_fractal(&self, frequency: f64) -> FractalParams {
        FractalParams {
            octaves: self.terrain_octaves,
            persistence: self.terrain_persistence,
            lacunarity: self.terrain_lacunarity,
            frequency,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for frequency in [self.ocean_frequency, self.beach_frequency, self.land_frequency] {
            validate_fractal(&self.terrain_fractal(frequency))?;
        }

        let unit_values = [
            ("deep_ocean_water_ratio", self.deep_ocean_water_ratio),
            ("deep_ocean_coastal_water_ratio", self.deep_ocean_coastal_water_ratio),
            ("ocean_water_ratio", self.ocean_water_ratio),
            ("ocean_coastal_water_ratio", self.ocean_coastal_water_ratio),
            ("lake_threshold_coastal", self.lake_threshold_coastal),
            ("lake_threshold_inland", self.lake_threshold_inland),
            ("beach_water_below", self.beach_water_below),
            ("beach_grass_above", self.beach_grass_above),
            ("desert_rock_above", self.desert_rock_above),
            ("desert_sand_below", self.desert_sand_below),
            ("snow_rock_above", self.snow_rock_above),
            ("mountain_snow_above", self.mountain_snow_above),
            ("mountain_grass_below", self.mountain_grass_below),
            ("forest_clearing_below", self.forest_clearing_below),
            ("grassland_grove_above", self.grassland_grove_above),
            ("grassland_sand_below", self.grassland_sand_below),
            ("max_blend", self.max_blend),
        ];
        for (name, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidNoise { name, value });
            }
        }

        if !(0.0..1.0).contains(&self.blend_start) {
            return Err(ConfigError::InvalidNoise { name: "blend_start", value: self.blend_start });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_small_resolution() {
        let config = WorldConfig::new(1, 42);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidResolution(1))));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let mut config = WorldConfig::default();
        config.chunk.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChunkSize)));
    }

    #[test]
    fn test_rejects_bad_persistence() {
        let mut config = WorldConfig::default();
        config.noise.persistence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNoise { name: "persistence", .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json_str(r#"{ "resolution": 32, "seed": 7, "chunk": { "chunk_size": 16 } }"#)
            .unwrap();

        assert_eq!(config.resolution, 32);
        assert_eq!(config.seed, 7);
        assert_eq!(config.chunk.chunk_size, 16);
        assert_eq!(config.chunk.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.noise.octaves, 6);
        assert_eq!(config.synthesis, SynthesisParams::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = WorldConfig::new(64, 99);
        config.synthesis.max_blend = 0.25;

        let json = config.to_json().unwrap();
        let parsed = WorldConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            WorldConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
