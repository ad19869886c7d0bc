//! Domain types and pure computations of the hydroponics nutrient pipeline.
//!
//! Everything in here is free of I/O: readings get validated, normalized,
//! fed to a predictor and the results checked against threshold tables.

pub mod error;
mod normalizer;
mod prediction;
mod predictor;
mod reading;
mod threshold;

pub use normalizer::*;
pub use prediction::*;
pub use predictor::*;
pub use reading::*;
pub use threshold::*;

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
