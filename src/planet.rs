//! Spherical biome lattice.
//!
//! The planet is sampled on a `resolution × resolution` latitude/longitude lattice.
//! Row `i` maps to latitude `-π/2 + i·π/(resolution−1)` (row 0 is the south pole) and
//! column `j` to longitude `-π + j·2π/(resolution−1)`. For every cell we take the unit
//! direction vector, sample three decorrelated noise channels at that direction and
//! classify a biome. Temperature is biased by latitude so the planet shows climate
//! bands instead of pure noise.
//!
//! Neighbor lookups wrap the column (longitude) and clamp the row (latitude): the
//! two row edges are the poles and are not adjacent to each other.

use std::f64::consts::PI;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::biomes::{Biome, ClimateSample};
use crate::config::WorldConfig;
use crate::error::ConfigError;
use crate::noise_field::{to_unit, FractalParams, NoiseField};
use crate::seeds::NoiseChannel;
use crate::tilemap::Tilemap;

/// Weight of the latitude bias in the final temperature
const LATITUDE_TEMPERATURE_WEIGHT: f64 = 0.7;
/// Weight of the temperature noise channel
const NOISE_TEMPERATURE_WEIGHT: f64 = 0.3;

/// Unit vector from the planet centre through a lattice cell
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Direction {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Direction {
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self {
            x: lat.cos() * lon.cos(),
            y: lat.cos() * lon.sin(),
            z: lat.sin(),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Latitude and longitude (radians) of a lattice cell.
pub fn lat_lon(row: usize, col: usize, resolution: usize) -> (f64, f64) {
    let steps = (resolution - 1) as f64;
    let lat = -PI / 2.0 + row as f64 * PI / steps;
    let lon = -PI + col as f64 * 2.0 * PI / steps;
    (lat, lon)
}

/// Latitude temperature bias: 1.0 at the equator, 0.5 at the poles.
pub fn base_temperature(row: usize, resolution: usize) -> f64 {
    let t = row as f64 / (resolution - 1) as f64 - 0.5;
    1.0 - t * t * 2.0
}

/// The generated planet: direction and biome for every lattice cell.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetLattice {
    resolution: usize,
    seed: u64,
    directions: Tilemap<Direction>,
    biomes: Tilemap<Biome>,
}

impl PlanetLattice {
    /// Build a lattice from precomputed row-major biomes, e.g. a hand-made world.
    /// Returns `None` if `resolution < 2` or the biome count doesn't match.
    pub fn from_biomes(resolution: usize, seed: u64, biomes: Vec<Biome>) -> Option<Self> {
        if resolution < 2 {
            return None;
        }
        let biomes = Tilemap::from_vec(resolution, resolution, biomes)?;
        let directions = (0..resolution * resolution)
            .map(|idx| {
                let (lat, lon) = lat_lon(idx / resolution, idx % resolution, resolution);
                Direction::from_lat_lon(lat, lon)
            })
            .collect();
        Some(Self {
            resolution,
            seed,
            directions: Tilemap::from_vec(resolution, resolution, directions)?,
            biomes,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Biome at `(row, col)`. Cells outside the lattice read as `Grassland`.
    pub fn biome_at(&self, row: usize, col: usize) -> Biome {
        self.biomes.try_get(col, row).copied().unwrap_or_default()
    }

    pub fn direction_at(&self, row: usize, col: usize) -> Option<Direction> {
        self.directions.try_get(col, row).copied()
    }

    /// Apply a signed offset under the lattice edge policy: column wraps modulo the
    /// resolution, row clamps to `[0, resolution - 1]`.
    pub fn neighbor(&self, row: usize, col: usize, d_row: i64, d_col: i64) -> (usize, usize) {
        let (c, r) = self.biomes.offset_clamped(col, row.min(self.resolution - 1), d_col, d_row);
        (r, c)
    }

    /// Biomes of the 8 surrounding cells in NW, N, NE, W, E, SW, S, SE order
    /// ("north" is the row above, i.e. `row - 1`).
    pub fn neighbor_biomes(&self, row: usize, col: usize) -> [Biome; 8] {
        let row = row.min(self.resolution - 1);
        let col = col % self.resolution;
        self.biomes
            .neighbors_8(col, row)
            .map(|(c, r)| *self.biomes.get(c, r))
    }

    pub fn biomes(&self) -> &Tilemap<Biome> {
        &self.biomes
    }

    /// Row-major biome ids, handy for comparing lattices byte for byte.
    pub fn biome_codes(&self) -> Vec<u8> {
        self.biomes.as_slice().iter().map(|b| b.id()).collect()
    }

    /// Number of cells per biome, indexed by [`Biome::id`].
    pub fn biome_counts(&self) -> [usize; 8] {
        let mut counts = [0usize; 8];
        for biome in self.biomes.as_slice() {
            counts[biome.id() as usize] += 1;
        }
        counts
    }
}

/// Builds [`PlanetLattice`]s from a validated configuration.
#[derive(Clone, Debug)]
pub struct PlanetGenerator {
    resolution: usize,
    seed: u64,
    params: FractalParams,
    elevation: NoiseField,
    temperature: NoiseField,
    humidity: NoiseField,
}

impl PlanetGenerator {
    /// Create a generator. Fails if the configuration is invalid.
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            resolution: config.resolution,
            seed: config.seed,
            params: config.noise,
            elevation: NoiseField::channel(config.seed, NoiseChannel::Elevation),
            temperature: NoiseField::channel(config.seed, NoiseChannel::Temperature),
            humidity: NoiseField::channel(config.seed, NoiseChannel::Humidity),
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Direction vector for a lattice cell.
    pub fn direction(&self, row: usize, col: usize) -> Direction {
        let (lat, lon) = lat_lon(row, col, self.resolution);
        Direction::from_lat_lon(lat, lon)
    }

    /// Elevation, temperature and humidity for a lattice cell.
    ///
    /// A channel whose noise sample fails falls back to the neutral mid-range value.
    pub fn climate_at(&self, row: usize, col: usize) -> ClimateSample {
        let point = self.direction(row, col).as_array();

        let elevation = self.sample_unit(&self.elevation, point, row, col);
        let temp_noise = self.sample_unit(&self.temperature, point, row, col);
        let humidity = self.sample_unit(&self.humidity, point, row, col);

        let temperature = base_temperature(row, self.resolution) * LATITUDE_TEMPERATURE_WEIGHT
            + temp_noise * NOISE_TEMPERATURE_WEIGHT;

        ClimateSample {
            elevation,
            temperature,
            humidity,
        }
    }

    fn sample_unit(&self, field: &NoiseField, point: [f64; 3], row: usize, col: usize) -> f64 {
        match field.sample3(point, &self.params) {
            Ok(value) => to_unit(value),
            Err(err) => {
                warn!(row, col, offset = field.seed_offset(), "noise sample failed ({err}), using neutral value");
                ClimateSample::NEUTRAL.elevation
            }
        }
    }

    /// Compute the full lattice. Rows are processed in parallel; every cell depends
    /// only on the seed and its own coordinates.
    pub fn generate(&self) -> PlanetLattice {
        let start = Instant::now();
        info!(seed = self.seed, resolution = self.resolution, "generating planet");

        let res = self.resolution;
        let rows: Vec<Vec<(Direction, Biome)>> = (0..res)
            .into_par_iter()
            .map(|row| {
                (0..res)
                    .map(|col| (self.direction(row, col), self.climate_at(row, col).classify()))
                    .collect()
            })
            .collect();

        let (directions, biomes): (Vec<Direction>, Vec<Biome>) = rows.into_iter().flatten().unzip();

        let lattice = PlanetLattice {
            resolution: res,
            seed: self.seed,
            directions: Tilemap::from_vec(res, res, directions)
                .unwrap_or_else(|| Tilemap::new(res, res)),
            biomes: Tilemap::from_vec(res, res, biomes).unwrap_or_else(|| Tilemap::new(res, res)),
        };

        debug!(counts = ?lattice.biome_counts(), "biome distribution");
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "planet generation complete");
        lattice
    }
}

/// Generate a lattice with default noise tuning.
pub fn generate(resolution: usize, seed: u64) -> Result<PlanetLattice, ConfigError> {
    Ok(PlanetGenerator::new(&WorldConfig::new(resolution, seed))?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::SEA_LEVEL;

    #[test]
    fn test_rejects_resolution_below_two() {
        assert!(matches!(generate(1, 42), Err(ConfigError::InvalidResolution(1))));
        assert!(matches!(generate(0, 42), Err(ConfigError::InvalidResolution(0))));
        assert!(generate(2, 42).is_ok());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(24, 1234).unwrap();
        let b = generate(24, 1234).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.biome_codes(), b.biome_codes());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(32, 1).unwrap();
        let b = generate(32, 2).unwrap();
        assert_ne!(a.biome_codes(), b.biome_codes());
    }

    #[test]
    fn test_directions_are_unit_and_span_poles() {
        let lattice = generate(9, 5).unwrap();
        for row in 0..9 {
            for col in 0..9 {
                let d = lattice.direction_at(row, col).unwrap();
                assert!((d.length() - 1.0).abs() < 1e-9);
            }
        }
        assert!((lattice.direction_at(0, 3).unwrap().z + 1.0).abs() < 1e-12);
        assert!((lattice.direction_at(8, 3).unwrap().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_latitude_bias() {
        assert_eq!(base_temperature(0, 4), 0.5);
        assert_eq!(base_temperature(3, 4), 0.5);
        assert_eq!(base_temperature(2, 5), 1.0);
    }

    /// Rows 1..=6 of `generate(8, 42)`. The pole rows are left out: see
    /// `test_pole_cells_sit_at_sea_level`.
    const SEED_42_INTERIOR: [u8; 48] = [
        1, 1, 4, 3, 1, 4, 1, 1, //
        2, 1, 4, 3, 0, 3, 3, 2, //
        1, 3, 3, 3, 2, 3, 4, 1, //
        3, 3, 2, 1, 4, 3, 4, 3, //
        1, 2, 3, 1, 3, 4, 3, 1, //
        1, 1, 1, 3, 0, 1, 1, 1, //
    ];

    #[test]
    fn test_golden_cells_seed_42() {
        let lattice = generate(4, 42).unwrap();
        assert_eq!(lattice.biome_at(1, 2), Biome::Grassland);
        assert_eq!(lattice.biome_at(2, 1), Biome::Forest);
        assert_eq!(lattice.biome_at(2, 2), Biome::Ocean);
        // Longitude -PI and PI are the same meridian
        assert_eq!(lattice.biome_at(2, 0), lattice.biome_at(2, 3));
    }

    #[test]
    fn test_golden_lattice_seed_42() {
        let codes = generate(8, 42).unwrap().biome_codes();
        assert_eq!(codes.len(), 64);
        assert_eq!(&codes[8..56], &SEED_42_INTERIOR[..]);
    }

    #[test]
    fn test_pole_cells_sit_at_sea_level() {
        // A pole direction scaled by an integer frequency lands on a Perlin lattice
        // point, where every octave is zero up to rounding.
        let generator = PlanetGenerator::new(&WorldConfig::new(4, 42)).unwrap();
        for col in 0..4 {
            let climate = generator.climate_at(0, col);
            assert!((climate.elevation - SEA_LEVEL).abs() < 1e-9);
            // 0.7 * 0.5 plus at most 0.3 of noise
            assert!(climate.temperature >= 0.35 && climate.temperature <= 0.65);
        }

        let lattice = generator.generate();
        assert!(matches!(lattice.biome_at(0, 0), Biome::Ocean | Biome::Beach));
        assert!(matches!(lattice.biome_at(3, 0), Biome::Ocean | Biome::Beach));
    }

    #[test]
    fn test_failed_sample_falls_back_to_neutral() {
        let generator = PlanetGenerator::new(&WorldConfig::new(4, 42)).unwrap();
        let value = generator.sample_unit(&generator.humidity, [f64::NAN, 0.0, 1.0], 0, 0);
        assert_eq!(value, ClimateSample::NEUTRAL.humidity);
    }

    #[test]
    fn test_equator_warmer_than_poles() {
        let generator = PlanetGenerator::new(&WorldConfig::new(33, 77)).unwrap();
        let mean = |row: usize| (0..33).map(|col| generator.climate_at(row, col).temperature).sum::<f64>() / 33.0;
        assert!(mean(16) > mean(0));
        assert!(mean(16) > mean(32));
    }

    #[test]
    fn test_column_wraps() {
        let lattice = generate(8, 3).unwrap();
        assert_eq!(lattice.neighbor(4, 0, 0, -1), (4, 7));
        assert_eq!(lattice.neighbor(4, 7, 0, 1), (4, 0));

        let west = lattice.neighbor_biomes(4, 0)[3];
        assert_eq!(west, lattice.biome_at(4, 7));
        let east = lattice.neighbor_biomes(4, 7)[4];
        assert_eq!(east, lattice.biome_at(4, 0));
    }

    #[test]
    fn test_row_clamps_at_poles() {
        let lattice = generate(8, 3).unwrap();
        assert_eq!(lattice.neighbor(0, 2, -1, 0), (0, 2));
        assert_eq!(lattice.neighbor(7, 2, 1, 0), (7, 2));

        // "North" of the south pole row is the pole row itself
        let north = lattice.neighbor_biomes(0, 2)[1];
        assert_eq!(north, lattice.biome_at(0, 2));
    }

    #[test]
    fn test_out_of_range_lookup_is_grassland() {
        let lattice = generate(4, 9).unwrap();
        assert_eq!(lattice.biome_at(4, 0), Biome::Grassland);
        assert_eq!(lattice.biome_at(0, 100), Biome::Grassland);
        assert!(lattice.direction_at(10, 10).is_none());
    }

    #[test]
    fn test_from_biomes_matches_generated_directions() {
        let generated = generate(6, 21).unwrap();
        let rebuilt = PlanetLattice::from_biomes(6, 21, generated.biomes().as_slice().to_vec()).unwrap();
        assert_eq!(rebuilt, generated);

        assert!(PlanetLattice::from_biomes(1, 0, vec![Biome::Ocean]).is_none());
        assert!(PlanetLattice::from_biomes(3, 0, vec![Biome::Ocean; 8]).is_none());
    }

    #[test]
    fn test_counts_cover_lattice() {
        let lattice = generate(16, 11).unwrap();
        assert_eq!(lattice.biome_counts().iter().sum::<usize>(), 256);
    }
}
