//! # Robust statistics for repeatability estimation
//!
//! Randomized pair sampling and width estimators shared by the photometric and astrometric
//! metrics.
//!
//! Random pair sampling
//! -----------------
//! A group of `N ≥ 2` measurements of the same star yields one difference between two
//! distinct measurements, picked uniformly at random ([`random_pair_difference`]). Using a
//! single pair per star avoids the combinatorial blow-up and the correlations of an all-pairs
//! scheme. The caller owns the random source: every sampling function takes an explicit
//! `&mut impl Rng`, so runs are reproducible under a seeded generator (e.g. `StdRng`).
//!
//! Width estimators
//! -----------------
//! [`compute_widths`] returns both the RMS and the scaled interquartile range of a sample.
//! For Gaussian data the two agree; the IQR is less sensitive to outliers such as variable
//! stars, the RMS keeps the contribution of realistic scatter sources like bad zero points.
//!
//! Percentiles
//! -----------------
//! [`percentile`] interpolates linearly between closest ranks, the usual convention of
//! numerical array libraries: for sorted `x` of length `n`, `q ∈ [0, 100]`,
//! `pos = q/100 × (n − 1)` and the result is `x[⌊pos⌋] + (pos − ⌊pos⌋)(x[⌈pos⌉] − x[⌊pos⌋])`.
use rand::{seq::SliceRandom, Rng};
use smallvec::SmallVec;

use crate::{
    constants::{MilliMag, MMAG_PER_MAG, NORMAL_Q75},
    validate_errors::ValidateError,
};

/// Two estimates of the spread of a distribution, in the units of the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthEstimate {
    /// Root mean square, `sqrt(mean(x²))`
    pub rms: f64,
    /// Interquartile range scaled to match the RMS for Gaussian data
    pub iqr: f64,
}

/// Difference between two distinct, randomly selected elements of `values`.
///
/// A copy of the input is partially shuffled and the difference of its first two elements is
/// returned. Each unordered pair is equally likely and both orderings occur, so the sign of the
/// result is random. Drawing without replacement stays correct for two elements.
///
/// Arguments
/// ---------
/// * `values`: the measurements of one object
/// * `rng`: the random source
///
/// Return
/// ------
/// * `values[i] - values[j]` for a random `i != j`
/// * [`ValidateError::NotEnoughMeasurements`] if `values` has fewer than two elements
pub fn random_pair_difference(values: &[f64], rng: &mut impl Rng) -> Result<f64, ValidateError> {
    if values.len() < 2 {
        return Err(ValidateError::NotEnoughMeasurements(values.len()));
    }
    let mut copy: SmallVec<[f64; 8]> = SmallVec::from_slice(values);
    let (picked, _) = copy.partial_shuffle(rng, 2);
    Ok(picked[0] - picked[1])
}

/// Random pair difference in millimagnitudes, normalised to an RMS about the mean.
///
/// The pairwise difference of two independent draws with equal variance σ² has variance
/// 2σ², hence the `1/√2` factor.
///
/// Return
/// ------
/// * `1000/√2 × random_pair_difference(values)`
pub fn random_pair_rms_millimag(
    values: &[f64],
    rng: &mut impl Rng,
) -> Result<MilliMag, ValidateError> {
    Ok(MMAG_PER_MAG / std::f64::consts::SQRT_2 * random_pair_difference(values, rng)?)
}

/// Copy of the finite entries of a slice.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean, NaN on empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Root mean square `sqrt(mean(x²))`, NaN on empty input.
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted
}

fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Percentile `q ∈ [0, 100]` with linear interpolation, NaN on empty input.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    percentile_of_sorted(&sorted(values), q)
}

/// Several percentiles from a single sort.
pub fn percentiles<const N: usize>(values: &[f64], qs: [f64; N]) -> [f64; N] {
    let sorted = sorted(values);
    qs.map(|q| percentile_of_sorted(&sorted, q))
}

/// Median, NaN on empty input.
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// RMS and scaled interquartile range of a sample.
///
/// `iqr = (P75 − P25) / (2 Φ⁻¹(0.75))`, where `2 Φ⁻¹(0.75) ≈ 1.349` is the IQR of a unit
/// Gaussian.
///
/// Arguments
/// ---------
/// * `diffs`: the sample (e.g. one random pair difference per star)
///
/// Return
/// ------
/// * The two estimates. Both are NaN for an empty sample: callers are expected to check for
///   missing data before interpreting them.
pub fn compute_widths(diffs: &[f64]) -> WidthEstimate {
    let [p75, p25] = percentiles(diffs, [75.0, 25.0]);
    WidthEstimate {
        rms: rms(diffs),
        iqr: (p75 - p25) / (2.0 * NORMAL_Q75),
    }
}
