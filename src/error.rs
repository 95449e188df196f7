//! Error types for planet and chunk generation.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chunk synthesis failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Image export failed
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Configuration errors. These are fatal at generator construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lattice resolution must be at least 2, got {0}")]
    InvalidResolution(usize),

    #[error("chunk size must be positive")]
    InvalidChunkSize,

    #[error("cache capacity must be positive")]
    InvalidCacheCapacity,

    /// Noise tuning outside its usable range
    #[error("invalid noise parameter `{name}`: {value}")]
    InvalidNoise {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the noise field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoiseError {
    #[error("noise coordinate is not finite: {0:?}")]
    NonFinite(Vec<f64>),
}

/// Errors raised while producing a chunk.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The chunk source reported a failure
    #[error("chunk ({x}, {y}) failed to generate: {reason}")]
    Failed {
        /// Chunk X coordinate
        x: i32,
        /// Chunk Y coordinate
        y: i32,
        /// Source-provided reason
        reason: String,
    },

    /// The chunk source panicked
    #[error("chunk ({x}, {y}) generator panicked: {message}")]
    Panicked {
        /// Chunk X coordinate
        x: i32,
        /// Chunk Y coordinate
        y: i32,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The background worker went away before reporting a result
    #[error("chunk worker disconnected before completion")]
    Disconnected,
}

/// Errors raised when writing images.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("nothing to export: {0}")]
    Empty(&'static str),

    #[error("image of {side} cells at scale {scale} exceeds the maximum image size")]
    TooLarge { side: usize, scale: u32 },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = WorldError> = std::result::Result<T, E>;
