//! Deterministic fractal noise field.
//!
//! A thin layer over [`noise::Perlin`] that sums octaves (fBm), normalizes the
//! result into `[-1, 1]` and guards against non-finite coordinates. The field is a
//! pure function of `(coordinate, base seed, seed offset, tuning)`.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::NoiseError;
use crate::seeds::{channel_seed, NoiseChannel};

/// Fractal (fBm) tuning for one sample call
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Base frequency applied to the input coordinate
    pub frequency: f64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            frequency: 1.0,
        }
    }
}

/// One seeded channel of the noise field.
#[derive(Clone, Debug)]
pub struct NoiseField {
    seed_offset: u32,
    perlin: Perlin,
}

impl NoiseField {
    /// Create the channel obtained by adding `seed_offset` to the base seed.
    pub fn new(base_seed: u64, seed_offset: u32) -> Self {
        Self {
            seed_offset,
            perlin: Perlin::new(channel_seed(base_seed, seed_offset)),
        }
    }

    /// Create the field for a named channel.
    pub fn channel(base_seed: u64, channel: NoiseChannel) -> Self {
        Self::new(base_seed, channel.offset())
    }

    pub fn seed_offset(&self) -> u32 {
        self.seed_offset
    }

    /// Sample the 3D field. Output is in `[-1, 1]`.
    pub fn sample3(&self, coord: [f64; 3], params: &FractalParams) -> Result<f64, NoiseError> {
        check_finite(&coord)?;
        Ok(fbm(&self.perlin, coord, params))
    }

    /// Sample the 2D field. Output is in `[-1, 1]`.
    pub fn sample2(&self, coord: [f64; 2], params: &FractalParams) -> Result<f64, NoiseError> {
        check_finite(&coord)?;
        Ok(fbm(&self.perlin, coord, params))
    }
}

/// One-off 3D sample without keeping a [`NoiseField`] around.
pub fn sample3(
    base_seed: u64,
    seed_offset: u32,
    coord: [f64; 3],
    params: &FractalParams,
) -> Result<f64, NoiseError> {
    NoiseField::new(base_seed, seed_offset).sample3(coord, params)
}

/// One-off 2D sample without keeping a [`NoiseField`] around.
pub fn sample2(
    base_seed: u64,
    seed_offset: u32,
    coord: [f64; 2],
    params: &FractalParams,
) -> Result<f64, NoiseError> {
    NoiseField::new(base_seed, seed_offset).sample2(coord, params)
}

/// Map a raw `[-1, 1]` sample to `[0, 1]`.
#[inline]
pub fn to_unit(value: f64) -> f64 {
    ((value + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn check_finite(coord: &[f64]) -> Result<(), NoiseError> {
    if coord.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(NoiseError::NonFinite(coord.to_vec()))
    }
}

/// Fractal Brownian motion: sum of octaves, normalized by total amplitude.
fn fbm<const N: usize>(perlin: &Perlin, point: [f64; N], params: &FractalParams) -> f64
where
    Perlin: NoiseFn<f64, N>,
{
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = params.frequency;
    let mut max_value = 0.0;

    for _ in 0..params.octaves {
        total += amplitude * perlin.get(point.map(|c| c * frequency));
        max_value += amplitude;
        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    if max_value == 0.0 {
        return 0.0;
    }
    (total / max_value).clamp(-1.0, 1.0)
}
