//! # Science Requirements Document (LPM-17) repeatability table
//!
//! Design, minimum and stretch values of the photometric (PA1, PF1, PA2) and astrometric
//! (AMx, AFx, ADx) repeatability requirements, following LPM-17 as of 2011-07-06.
//!
//! Photometry
//! -----------------
//! ```text
//! Quantity            Design  Minimum  Stretch
//! PA1 (millimag)           5        8        3
//! PF1 (%)                 10       20        5
//! PA2 (millimag)          15       15       10
//! ```
//!
//! Astrometry
//! -----------------
//! The rms of the astrometric distance distribution for stellar pairs separated by D arcmin
//! shall not exceed AMx milliarcsec (median over a large number of sources). No more than
//! AFx % of the sample may deviate by more than ADx milliarcsec from the median. The three
//! separations D = 5, 20, 200 arcmin match the size of a sensor, a raft, and the camera.
//!
//! ```text
//! Quantity            Design  Minimum  Stretch
//! AM1 (milliarcsec)       10       20        5
//! AF1 (%)                 10       20        5
//! AD1 (milliarcsec)       20       40       10
//! AM2 (milliarcsec)       10       20        5
//! AF2 (%)                 10       20        5
//! AD2 (milliarcsec)       20       40       10
//! AM3 (milliarcsec)       15       30       10
//! AF3 (%)                 10       20        5
//! AD3 (milliarcsec)       30       50       20
//! ```
use std::fmt;

use crate::constants::ArcMin;

/// Requirement level of the SRD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrdLevel {
    Design,
    Minimum,
    Stretch,
}

impl SrdLevel {
    pub const ALL: [SrdLevel; 3] = [SrdLevel::Minimum, SrdLevel::Design, SrdLevel::Stretch];
}

impl fmt::Display for SrdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrdLevel::Design => write!(f, "design"),
            SrdLevel::Minimum => write!(f, "minimum"),
            SrdLevel::Stretch => write!(f, "stretch"),
        }
    }
}

/// The three values of one SRD quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirement {
    pub design: f64,
    pub minimum: f64,
    pub stretch: f64,
}

impl Requirement {
    pub const fn new(design: f64, minimum: f64, stretch: f64) -> Self {
        Requirement {
            design,
            minimum,
            stretch,
        }
    }

    #[inline]
    pub fn threshold(&self, level: SrdLevel) -> f64 {
        match level {
            SrdLevel::Design => self.design,
            SrdLevel::Minimum => self.minimum,
            SrdLevel::Stretch => self.stretch,
        }
    }
}

/// Median RMS of bright-star magnitude repeatability (millimag)
pub const PA1: Requirement = Requirement::new(5.0, 8.0, 3.0);
/// Fraction of differences allowed beyond PA2 (%)
pub const PF1: Requirement = Requirement::new(10.0, 20.0, 5.0);
/// Outlier limit for magnitude differences (millimag)
pub const PA2: Requirement = Requirement::new(15.0, 15.0, 10.0);

pub const AM1: Requirement = Requirement::new(10.0, 20.0, 5.0);
pub const AF1: Requirement = Requirement::new(10.0, 20.0, 5.0);
pub const AD1: Requirement = Requirement::new(20.0, 40.0, 10.0);

pub const AM2: Requirement = Requirement::new(10.0, 20.0, 5.0);
pub const AF2: Requirement = Requirement::new(10.0, 20.0, 5.0);
pub const AD2: Requirement = Requirement::new(20.0, 40.0, 10.0);

pub const AM3: Requirement = Requirement::new(15.0, 30.0, 10.0);
pub const AF3: Requirement = Requirement::new(10.0, 20.0, 5.0);
pub const AD3: Requirement = Requirement::new(30.0, 50.0, 20.0);

/// Characteristic separations of AM1, AM2, AM3 (arcmin)
pub const D1: ArcMin = 5.0;
pub const D2: ArcMin = 20.0;
pub const D3: ArcMin = 200.0;

/// One of the three SRD astrometric repeatability metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmMetric {
    Am1,
    Am2,
    Am3,
}

impl AmMetric {
    /// The `x` in AMx
    pub fn index(self) -> u8 {
        match self {
            AmMetric::Am1 => 1,
            AmMetric::Am2 => 2,
            AmMetric::Am3 => 3,
        }
    }

    /// Fiducial separation D (arcmin)
    pub fn separation(self) -> ArcMin {
        match self {
            AmMetric::Am1 => D1,
            AmMetric::Am2 => D2,
            AmMetric::Am3 => D3,
        }
    }

    pub fn am(self) -> Requirement {
        match self {
            AmMetric::Am1 => AM1,
            AmMetric::Am2 => AM2,
            AmMetric::Am3 => AM3,
        }
    }

    pub fn af(self) -> Requirement {
        match self {
            AmMetric::Am1 => AF1,
            AmMetric::Am2 => AF2,
            AmMetric::Am3 => AF3,
        }
    }

    pub fn ad(self) -> Requirement {
        match self {
            AmMetric::Am1 => AD1,
            AmMetric::Am2 => AD2,
            AmMetric::Am3 => AD3,
        }
    }
}

impl fmt::Display for AmMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AM{}", self.index())
    }
}
