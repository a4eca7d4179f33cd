//! # Photometric repeatability: PA1 and PA2
//!
//! The SRD characterizes photometric repeatability by the median RMS of repeated magnitude
//! measurements of non-variable bright stars (PA1), and by the magnitude deviation that no
//! more than PF1 % of the measurements may exceed (PA2).
//!
//! Procedure
//! -----------------
//! 1. For each object group, keep the finite magnitudes of the requested field.
//! 2. Groups with fewer than two finite magnitudes cannot provide a pair and are skipped.
//! 3. Each remaining group contributes one random pair difference, in millimag and divided
//!    by √2 ([`random_pair_rms_millimag`]), and its mean magnitude.
//! 4. PA1 is summarised by the RMS and the scaled IQR of the differences
//!    ([`compute_widths`]); PA2 by the 80th, 90th and 95th percentiles of `|diff|`, i.e. the
//!    thresholds exceeded by 20 %, 10 % and 5 % of the stars.
//!
//! The random pair draw makes each run a sample; seed the generator for reproducible values.
//!
//! Example
//! -----------------
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use validate_drp::catalog::batch_reader::MeasurementBatch;
//! use validate_drp::catalog::{GroupView, GroupedObservationTable};
//! use validate_drp::photometry::{calc_pa1, Pa2Result};
//!
//! let object = [1_u64, 1, 2, 2];
//! let visit = [10_u64, 20, 10, 20];
//! let batch = MeasurementBatch::from_degrees_owned(
//!     &object, &visit, &[10.0, 10.0, 11.0, 11.0], &[0.0; 4], &[20.0, 20.01, 19.0, 18.98],
//! );
//! let table = GroupedObservationTable::new_from_batch(&batch, "base_PsfFlux_mag")?;
//! let mag_key = table.schema().find("base_PsfFlux_mag")?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let pa1 = calc_pa1(&table, mag_key, &mut rng)?;
//! let pa2 = Pa2Result::from_diffs(&pa1.diffs)?;
//! println!("{pa1}\n{pa2:#}");
//! assert_eq!(pa1.diffs.len(), 2);
//! # Ok::<(), validate_drp::ValidateError>(())
//! ```
use std::fmt;

use rand::Rng;
use tracing::{debug, info};

use crate::{
    catalog::{FieldKey, GroupView},
    constants::{Magnitude, MilliMag, ObjectId},
    srd::{self, Requirement, SrdLevel},
    statistics::{compute_widths, mean, percentiles, random_pair_rms_millimag, WidthEstimate},
    validate_errors::ValidateError,
};

/// Photometric repeatability of a set of stars.
///
/// Fields
/// -----------------
/// * `objects` – the objects that contributed a difference, in group order.
/// * `diffs` – one random pair difference per object (millimag, RMS-normalised).
/// * `means` – mean of the finite magnitudes of each object.
/// * `widths` – RMS and scaled IQR of `diffs` (millimag).
/// * `skipped` – number of groups with fewer than two finite magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pa1Result {
    pub objects: Vec<ObjectId>,
    pub diffs: Vec<MilliMag>,
    pub means: Vec<Magnitude>,
    pub widths: WidthEstimate,
    pub skipped: usize,
}

impl Pa1Result {
    #[inline]
    pub fn rms(&self) -> MilliMag {
        self.widths.rms
    }

    #[inline]
    pub fn iqr(&self) -> MilliMag {
        self.widths.iqr
    }

    /// PA2 thresholds computed from the same random differences.
    pub fn outlier_thresholds(&self) -> Result<Pa2Result, ValidateError> {
        Pa2Result::from_diffs(&self.diffs)
    }

    /// Whether the RMS satisfies the SRD PA1 requirement at `level`.
    pub fn meets(&self, level: SrdLevel) -> bool {
        self.rms() <= srd::PA1.threshold(level)
    }
}

impl fmt::Display for Pa1Result {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "PA1 - photometric repeatability")?;
            writeln!(f, "-------------------------------")?;
            writeln!(f, "stars   : {}", self.diffs.len())?;
            writeln!(f, "skipped : {}", self.skipped)?;
            writeln!(f, "rms     : {:.3} mmag", self.rms())?;
            write!(f, "iqr     : {:.3} mmag", self.iqr())
        } else {
            write!(
                f,
                "PA1: rms={:.3} mmag, iqr={:.3} mmag ({} stars)",
                self.rms(),
                self.iqr(),
                self.diffs.len()
            )
        }
    }
}

/// Photometric outlier thresholds.
///
/// Each threshold is the magnitude deviation (millimag) exceeded by at most the matching
/// `pf1` percentage of the stars:
/// * `minimum` – 80th percentile of `|diff|` (PF1 = 20 %),
/// * `design` – 90th percentile (PF1 = 10 %),
/// * `stretch` – 95th percentile (PF1 = 5 %).
///
/// Since the percentiles increase, `minimum <= design <= stretch`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pa2Result {
    pub minimum: MilliMag,
    pub design: MilliMag,
    pub stretch: MilliMag,
    pub pf1: Requirement,
}

impl Pa2Result {
    /// Compute the thresholds from a set of PA1 differences.
    ///
    /// Return
    /// ------
    /// * [`ValidateError::NoData`] if `diffs` is empty
    pub fn from_diffs(diffs: &[MilliMag]) -> Result<Self, ValidateError> {
        if diffs.is_empty() {
            return Err(ValidateError::NoData("PA2"));
        }
        let pf1 = srd::PF1;
        let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
        let [minimum, design, stretch] = percentiles(
            &abs_diffs,
            [
                100.0 - pf1.minimum,
                100.0 - pf1.design,
                100.0 - pf1.stretch,
            ],
        );
        Ok(Pa2Result {
            minimum,
            design,
            stretch,
            pf1,
        })
    }

    pub fn threshold(&self, level: SrdLevel) -> MilliMag {
        match level {
            SrdLevel::Design => self.design,
            SrdLevel::Minimum => self.minimum,
            SrdLevel::Stretch => self.stretch,
        }
    }

    /// Whether the threshold at `level` is within the SRD PA2 limit for that level.
    pub fn meets(&self, level: SrdLevel) -> bool {
        self.threshold(level) <= srd::PA2.threshold(level)
    }
}

impl fmt::Display for Pa2Result {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "PA2 - photometric outlier thresholds")?;
            writeln!(f, "------------------------------------")?;
            for (i, level) in SrdLevel::ALL.iter().enumerate() {
                write!(
                    f,
                    "{:<8}: PF1={:>2}% of diffs exceed PA2 = {:.2} mmag (target PA2 < {} mmag)",
                    level,
                    self.pf1.threshold(*level),
                    self.threshold(*level),
                    srd::PA2.threshold(*level)
                )?;
                if i + 1 < SrdLevel::ALL.len() {
                    writeln!(f)?;
                }
            }
            Ok(())
        } else {
            write!(
                f,
                "PA2: minimum={:.2}, design={:.2}, stretch={:.2} mmag",
                self.minimum, self.design, self.stretch
            )
        }
    }
}

/// Per-group random differences shared by PA1 and PA2.
struct GroupDiffs {
    objects: Vec<ObjectId>,
    diffs: Vec<MilliMag>,
    means: Vec<Magnitude>,
    skipped: usize,
}

fn random_group_diffs(
    view: &impl GroupView,
    mag_key: FieldKey,
    rng: &mut impl Rng,
) -> Result<GroupDiffs, ValidateError> {
    let mut out = GroupDiffs {
        objects: Vec::with_capacity(view.len()),
        diffs: Vec::with_capacity(view.len()),
        means: Vec::with_capacity(view.len()),
        skipped: 0,
    };

    for group in view.groups() {
        let mags: Vec<f64> = group
            .records()
            .iter()
            .map(|r| view.field_value(r, mag_key))
            .filter(|m| m.is_finite())
            .collect();

        match random_pair_rms_millimag(&mags, rng) {
            Ok(diff) => {
                out.objects.push(group.object);
                out.diffs.push(diff);
                out.means.push(mean(&mags));
            }
            Err(ValidateError::NotEnoughMeasurements(n)) => {
                debug!(object = group.object, finite = n, "not enough magnitudes for a pair");
                out.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Photometric repeatability (PA1) of the stars of a grouped catalog.
///
/// Arguments
/// ---------
/// * `view`: the grouped catalog
/// * `mag_key`: the magnitude field, e.g. `schema.find("base_PsfFlux_mag")?`
/// * `rng`: random source for the pair draws
///
/// Return
/// ------
/// * The per-star differences and mean magnitudes, with the RMS and scaled IQR of the
///   differences (millimag).
/// * [`ValidateError::NoData`] if no group has two finite magnitudes.
///
/// See also
/// ------------
/// * [`calc_pa2`] – Outlier thresholds of the same kind of differences.
/// * [`random_pair_rms_millimag`] – Per-star difference.
pub fn calc_pa1(
    view: &impl GroupView,
    mag_key: FieldKey,
    rng: &mut impl Rng,
) -> Result<Pa1Result, ValidateError> {
    let GroupDiffs {
        objects,
        diffs,
        means,
        skipped,
    } = random_group_diffs(view, mag_key, rng)?;

    if diffs.is_empty() {
        return Err(ValidateError::NoData("PA1"));
    }
    if let Some(stats) = view.measurement_count_stats() {
        debug!(%stats, "measurements per object");
    }

    let widths = compute_widths(&diffs);
    info!(
        stars = diffs.len(),
        skipped,
        rms = widths.rms,
        iqr = widths.iqr,
        "PA1 computed"
    );

    Ok(Pa1Result {
        objects,
        diffs,
        means,
        widths,
        skipped,
    })
}

/// Photometric outlier thresholds (PA2) of the stars of a grouped catalog.
///
/// A fresh set of random pair differences is drawn, as in [`calc_pa1`]. To derive PA2 from
/// the very same draw as an existing PA1 result, use [`Pa1Result::outlier_thresholds`].
///
/// Return
/// ------
/// * The minimum/design/stretch thresholds (millimag) with their PF1 fractions.
/// * [`ValidateError::NoData`] if no group has two finite magnitudes.
pub fn calc_pa2(
    view: &impl GroupView,
    mag_key: FieldKey,
    rng: &mut impl Rng,
) -> Result<Pa2Result, ValidateError> {
    let group_diffs = random_group_diffs(view, mag_key, rng)?;
    let pa2 = Pa2Result::from_diffs(&group_diffs.diffs)?;
    info!(
        minimum = pa2.minimum,
        design = pa2.design,
        stretch = pa2.stretch,
        "PA2 computed"
    );
    Ok(pa2)
}
