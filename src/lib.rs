//! Draw an ordered set of frequency/amplitude/phase triples as a chain of
//! circles and vectors (epicycles).
//!
//! [`epicycle::build_chain`] lays the components out head to tail; a
//! [`visualizer::Surface`] draws the result.

pub mod config;
pub mod epicycle;
pub mod error;
pub mod visualizer;
