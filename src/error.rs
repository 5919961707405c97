//! Error types for chain construction, configuration and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning raw input sequences into frequency components.
#[derive(Debug, Error, PartialEq)]
pub enum ChainError {
    /// The frequency, amplitude and phase sequences differ in length.
    #[error(
        "input length mismatch: {frequencies} frequencies, {amplitudes} amplitudes, {phases} phases"
    )]
    LengthMismatch {
        frequencies: usize,
        amplitudes: usize,
        phases: usize,
    },

    /// A negative amplitude was given while the policy rejects them.
    #[error("negative amplitude {amplitude} at component {index}")]
    NegativeAmplitude { index: usize, amplitude: f64 },

    /// A NaN or infinite value was given.
    #[error("non-finite {field} at component {index}")]
    NonFinite { index: usize, field: &'static str },

    /// The summed amplitudes up to this component no longer fit in an f64.
    #[error("chain overflows at component {index}")]
    Overflow { index: usize },
}

/// Errors raised by drawing surfaces.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write figure: {0}")]
    Io(#[from] std::io::Error),

    /// The plotting back end refused a drawing operation.
    #[error("plotting back end error: {0}")]
    Backend(String),

    #[error("invalid {axis} axis range [{min}, {max}]")]
    InvalidAxisRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    /// A draw call carried a NaN or infinite coordinate or radius.
    #[error("non-finite {what} in draw call")]
    NonFinite { what: &'static str },

    #[error("failed to format figure: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("failed to encode figure data: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RenderError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
