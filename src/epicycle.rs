use clap::ValueEnum;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChainError;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x, y }
    }
}

impl From<Complex<f64>> for Point2D {
    fn from(c: Complex<f64>) -> Point2D {
        Point2D { x: c.re, y: c.im }
    }
}

impl From<Point2D> for Complex<f64> {
    fn from(p: Point2D) -> Complex<f64> {
        Complex { re: p.x, im: p.y }
    }
}

/// One rotating vector of the chain: its speed, length and starting angle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyComponent {
    pub frequency: f64,
    pub amplitude: f64,
    /// Radians.
    pub phase: f64,
}

impl FrequencyComponent {
    pub fn new(frequency: f64, amplitude: f64, phase: f64) -> FrequencyComponent {
        FrequencyComponent {
            frequency,
            amplitude,
            phase,
        }
    }

    pub fn new_from_complex(frequency: f64, c: Complex<f64>) -> FrequencyComponent {
        let (amplitude, phase) = c.to_polar();
        FrequencyComponent {
            frequency,
            amplitude,
            phase,
        }
    }

    /// The vector this component contributes once it has turned for `time`.
    pub fn phasor_at(&self, time: f64) -> Complex<f64> {
        Complex::from_polar(self.amplitude, self.phase + self.frequency * time)
    }
}

/// The five components drawn when no configuration is given.
pub fn default_components() -> Vec<FrequencyComponent> {
    use std::f64::consts::PI;

    let frequencies = [1.0, 2.0, 3.0, 4.0, 5.0];
    let amplitudes = [10.0, 8.0, 6.0, 4.0, 2.0];
    let phases = [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0, PI];
    frequencies
        .iter()
        .zip(amplitudes.iter())
        .zip(phases.iter())
        .map(|((&f, &a), &p)| FrequencyComponent::new(f, a, p))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSegment {
    pub center: Point2D,
    pub radius: f64,
    pub endpoint: Point2D,
}

/// Lay the components out head to tail, starting at the origin.
pub fn build_chain(components: &[FrequencyComponent]) -> Vec<ChainSegment> {
    build_chain_at(components, 0.0)
}

/// Same as [`build_chain`], with every phase advanced by `frequency * time`.
pub fn build_chain_at(components: &[FrequencyComponent], time: f64) -> Vec<ChainSegment> {
    let chain = components.iter().fold(
        Vec::with_capacity(components.len()),
        |mut chain: Vec<ChainSegment>, component| {
            let center = chain.last().map_or(Point2D::ORIGIN, |s| s.endpoint);
            let endpoint = Complex::from(center) + component.phasor_at(time);
            chain.push(ChainSegment {
                center,
                radius: component.amplitude,
                endpoint: endpoint.into(),
            });
            chain
        },
    );
    debug!(segments = chain.len(), time, "built epicycle chain");
    chain
}

/// Where the last vector ends. The origin for an empty chain.
pub fn tip(chain: &[ChainSegment]) -> Point2D {
    chain.last().map_or(Point2D::ORIGIN, |s| s.endpoint)
}

/// Half-width of the smallest origin-centered square holding every circle.
pub fn extent(chain: &[ChainSegment]) -> f64 {
    chain
        .iter()
        .map(|s| {
            let r = s.radius.abs();
            (s.center.x.abs() + r).max(s.center.y.abs() + r)
        })
        .fold(0.0, f64::max)
}

/// What to do with a component whose amplitude is negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AmplitudePolicy {
    #[default]
    Reject,
    /// Replace with zero.
    Clamp,
    /// Keep as is; the vector points against its phase.
    Allow,
}

/// Zip three parallel sequences into components.
pub fn components_from_parallel(
    frequencies: &[f64],
    amplitudes: &[f64],
    phases: &[f64],
    policy: AmplitudePolicy,
) -> Result<Vec<FrequencyComponent>, ChainError> {
    if frequencies.len() != amplitudes.len() || amplitudes.len() != phases.len() {
        return Err(ChainError::LengthMismatch {
            frequencies: frequencies.len(),
            amplitudes: amplitudes.len(),
            phases: phases.len(),
        });
    }

    let components = frequencies
        .iter()
        .zip(amplitudes)
        .zip(phases)
        .map(|((&f, &a), &p)| FrequencyComponent::new(f, a, p))
        .collect();
    validate_components(components, policy)
}

pub fn validate_components(
    components: Vec<FrequencyComponent>,
    policy: AmplitudePolicy,
) -> Result<Vec<FrequencyComponent>, ChainError> {
    // Every endpoint coordinate is bounded by the running sum of |amplitude|.
    let mut reach = 0.0_f64;
    components
        .into_iter()
        .enumerate()
        .map(|(index, mut c)| {
            for (field, value) in [
                ("frequency", c.frequency),
                ("amplitude", c.amplitude),
                ("phase", c.phase),
            ] {
                if !value.is_finite() {
                    return Err(ChainError::NonFinite { index, field });
                }
            }

            if c.amplitude < 0.0 {
                match policy {
                    AmplitudePolicy::Reject => {
                        return Err(ChainError::NegativeAmplitude {
                            index,
                            amplitude: c.amplitude,
                        });
                    }
                    AmplitudePolicy::Clamp => {
                        warn!(index, amplitude = c.amplitude, "clamping negative amplitude to zero");
                        c.amplitude = 0.0;
                    }
                    AmplitudePolicy::Allow => {}
                }
            }

            reach += c.amplitude.abs();
            if !reach.is_finite() {
                return Err(ChainError::Overflow { index });
            }
            Ok(c)
        })
        .collect()
}
