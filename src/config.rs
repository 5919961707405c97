//! Figure and input configuration, read from an optional TOML file.
//!
//! ```toml
//! amplitude_policy = "clamp"
//! time = 0.5
//!
//! [figure]
//! output = "circles.svg"
//! auto_limits = true
//!
//! [[components]]
//! frequency = 1
//! amplitude = 10
//! phase = 0
//! ```
//!
//! Components may instead be given as three parallel arrays,
//! `frequencies`, `amplitudes` and `phases`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::epicycle::{self, AmplitudePolicy, FrequencyComponent};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Pixel size of the PNG/SVG output and of the HTML canvas.
    pub width: u32,
    pub height: u32,
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    /// Derive the axis limits from the chain instead of the ranges above.
    pub auto_limits: bool,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub output: PathBuf,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            x_range: [-20.0, 20.0],
            y_range: [-20.0, 20.0],
            auto_limits: false,
            title: "Frequency Circles as Vectors".to_string(),
            x_label: "Real Part".to_string(),
            y_label: "Imaginary Part".to_string(),
            output: PathBuf::from("frequency_circles.html"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub amplitude_policy: AmplitudePolicy,
    /// Advance every phase by `frequency * time` before drawing.
    pub time: f64,
    pub figure: FigureConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<FrequencyComponent>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitudes: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<f64>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let parallel = self.frequencies.is_some() || self.amplitudes.is_some() || self.phases.is_some();
        if parallel && self.components.is_some() {
            return Err(ConfigError::Invalid(
                "give either [[components]] or frequencies/amplitudes/phases, not both".to_string(),
            ));
        }
        if self.figure.width == 0 || self.figure.height == 0 {
            return Err(ConfigError::Invalid("figure size must be non-zero".to_string()));
        }
        if !self.time.is_finite() {
            return Err(ConfigError::Invalid("time must be finite".to_string()));
        }
        Ok(())
    }

    /// The validated components to draw, falling back to the built-in five.
    pub fn components(&self) -> Result<Vec<FrequencyComponent>, ConfigError> {
        if let Some(components) = &self.components {
            return Ok(epicycle::validate_components(
                components.clone(),
                self.amplitude_policy,
            )?);
        }

        match (&self.frequencies, &self.amplitudes, &self.phases) {
            (None, None, None) => Ok(epicycle::validate_components(
                epicycle::default_components(),
                self.amplitude_policy,
            )?),
            (f, a, p) => {
                let empty = Vec::new();
                Ok(epicycle::components_from_parallel(
                    f.as_ref().unwrap_or(&empty),
                    a.as_ref().unwrap_or(&empty),
                    p.as_ref().unwrap_or(&empty),
                    self.amplitude_policy,
                )?)
            }
        }
    }
}
