pub mod astrometry;
pub mod catalog;
pub mod constants;
pub mod conversion;
pub mod geometry;
pub mod photometry;
pub mod run_config;
pub mod srd;
pub mod statistics;
pub mod validate_errors;

pub use astrometry::{calc_am1, calc_am2, calc_am3, calc_amx, AmxParams, AstrometricResult};
pub use catalog::{GroupView, GroupedObservationTable};
pub use photometry::{calc_pa1, calc_pa2, Pa1Result, Pa2Result};
pub use validate_errors::ValidateError;
