//! # Constants and type definitions for validate_drp
//!
//! This module centralizes the **unit conversion factors**, **statistical constants**, and
//! **common type aliases** used by the repeatability metrics.
//!
//! ## Overview
//!
//! - Angle conversions (degrees, arcminutes, arcseconds, milliarcseconds ↔ radians)
//! - Photometric scaling (magnitudes → millimagnitudes)
//! - The normal-distribution quantile used to rescale an interquartile range
//! - Identifiers for objects, visits and detectors
//! - Default selection parameters for the astrometric metrics

use smallvec::SmallVec;

use crate::catalog::MeasurementRecord;

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for wrapping right ascension
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcminutes → radians
pub const RADMIN: f64 = std::f64::consts::PI / 10_800.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648_000.0;

/// Milliarcseconds per radian
pub const MAS_PER_RAD: f64 = 648_000_000.0 / std::f64::consts::PI;

/// Millimagnitudes per magnitude
pub const MMAG_PER_MAG: f64 = 1000.0;

// -------------------------------------------------------------------------------------------------
// Statistical constants
// -------------------------------------------------------------------------------------------------

/// Φ⁻¹(0.75), the upper quartile of the standard normal distribution.
///
/// The interquartile range of a Gaussian is `2 Φ⁻¹(0.75) σ ≈ 1.349 σ`.
pub const NORMAL_Q75: f64 = 0.674_489_750_196_081_7;

// -------------------------------------------------------------------------------------------------
// Astrometric selection defaults
// -------------------------------------------------------------------------------------------------

/// Default `[bright, faint)` magnitude range used to select stars for AMx
pub const DEFAULT_MAG_RANGE: (Magnitude, Magnitude) = (17.0, 21.5);

/// Default annulus width around the fiducial separation D (arcmin)
pub const DEFAULT_ANNULUS_WIDTH: ArcMin = 2.0;

/// Name of the PSF magnitude field in source catalogs
pub const PSF_MAG_FIELD: &str = "base_PsfFlux_mag";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcminutes
pub type ArcMin = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in milliarcseconds
pub type MilliArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Astronomical magnitude
pub type Magnitude = f64;
/// Magnitude difference in millimagnitudes
pub type MilliMag = f64;

/// Identifier of a matched astronomical object (one per object group)
pub type ObjectId = u64;
/// Identifier of a visit (exposure)
pub type VisitId = u64;
/// Identifier of a detector (CCD or moral equivalent) within a visit
pub type DetectorId = u32;

/// A small, inline-optimized container for the per-visit records of a single object.
pub type Records = SmallVec<[MeasurementRecord; 6]>;
