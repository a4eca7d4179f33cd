//! Result of an astrometric repeatability run.
//!
//! An [`AstrometricResult`] holds one RMS sample per accepted object pair, in
//! milliarcseconds, together with the selection that produced it: the fiducial separation
//! `D`, the annulus bounds and the magnitude range.
//!
//! Summaries
//! -----------------
//! * [`AstrometricResult::median_mas`] – the AMx value itself (median over the pairs).
//! * [`AstrometricResult::outlier_fraction`] – fraction of the samples deviating from the
//!   median by more than ADx, to be compared with AFx.
//! * [`AstrometricResult::meets`] / [`AstrometricResult::outliers_meet`] – SRD checks for
//!   the AM1/AM2/AM3 labelled results.
use std::fmt;

use crate::{
    constants::{ArcMin, Magnitude, MilliArcSec},
    srd::{AmMetric, SrdLevel},
    statistics::median,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AstrometricResult {
    /// SRD label, `None` for a custom separation
    pub metric: Option<AmMetric>,
    /// RMS of the shared-visit distances of each accepted pair (mas)
    pub values_mas: Vec<MilliArcSec>,
    /// Fiducial separation D (arcmin)
    pub d: ArcMin,
    /// `[lo, hi)` separation band (arcmin)
    pub annulus: (ArcMin, ArcMin),
    /// `[bright, faint)` magnitude selection
    pub mag_range: (Magnitude, Magnitude),
    /// Objects kept by the magnitude selection and having a mean position
    pub n_objects: usize,
    /// Pairs inside the annulus without any shared visit
    pub skipped_pairs: usize,
}

impl AstrometricResult {
    pub fn len(&self) -> usize {
        self.values_mas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_mas.is_empty()
    }

    /// Median of the pair samples (mas), NaN when there is none.
    pub fn median_mas(&self) -> MilliArcSec {
        median(&self.values_mas)
    }

    /// Fraction of samples deviating from the median by more than `adx_mas`.
    ///
    /// Arguments
    /// ---------
    /// * `adx_mas`: the deviation limit (mas), e.g. `srd::AD1.design`
    ///
    /// Return
    /// ------
    /// * A fraction in `[0, 1]`, NaN when there is no sample.
    pub fn outlier_fraction(&self, adx_mas: MilliArcSec) -> f64 {
        if self.values_mas.is_empty() {
            return f64::NAN;
        }
        let med = self.median_mas();
        let outliers = self
            .values_mas
            .iter()
            .filter(|v| (*v - med).abs() > adx_mas)
            .count();
        outliers as f64 / self.values_mas.len() as f64
    }

    /// Whether the median satisfies the AMx requirement at `level`.
    ///
    /// `None` for an unlabelled result or an empty one.
    pub fn meets(&self, level: SrdLevel) -> Option<bool> {
        let metric = self.metric?;
        if self.is_empty() {
            return None;
        }
        Some(self.median_mas() <= metric.am().threshold(level))
    }

    /// Whether at most AFx % of the samples deviate by more than ADx at `level`.
    pub fn outliers_meet(&self, level: SrdLevel) -> Option<bool> {
        let metric = self.metric?;
        if self.is_empty() {
            return None;
        }
        let fraction = self.outlier_fraction(metric.ad().threshold(level));
        Some(100.0 * fraction <= metric.af().threshold(level))
    }

    fn label(&self) -> String {
        match self.metric {
            Some(m) => m.to_string(),
            None => "AMx".to_string(),
        }
    }
}

impl fmt::Display for AstrometricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "{} - astrometric repeatability", self.label())?;
            writeln!(f, "----------------------------------")?;
            writeln!(f, "D          : {} arcmin", self.d)?;
            writeln!(
                f,
                "annulus    : [{}, {}) arcmin",
                self.annulus.0, self.annulus.1
            )?;
            writeln!(
                f,
                "magnitudes : [{}, {})",
                self.mag_range.0, self.mag_range.1
            )?;
            writeln!(f, "objects    : {}", self.n_objects)?;
            writeln!(f, "pairs      : {}", self.len())?;
            writeln!(f, "skipped    : {}", self.skipped_pairs)?;
            write!(f, "median     : {:.3} mas", self.median_mas())
        } else {
            write!(
                f,
                "{}: median={:.3} mas over {} pairs (D={} arcmin)",
                self.label(),
                self.median_mas(),
                self.len(),
                self.d
            )
        }
    }
}

#[cfg(test)]
mod astrometric_result_test {
    use super::*;

    fn result(metric: Option<AmMetric>, values: Vec<f64>) -> AstrometricResult {
        AstrometricResult {
            metric,
            values_mas: values,
            d: 5.0,
            annulus: (4.0, 6.0),
            mag_range: (17.0, 21.5),
            n_objects: 10,
            skipped_pairs: 0,
        }
    }

    #[test]
    fn test_median_and_outliers() {
        let res = result(Some(AmMetric::Am1), vec![4.0, 5.0, 6.0, 50.0, 5.5]);
        assert_eq!(res.median_mas(), 5.5);
        assert_eq!(res.outlier_fraction(20.0), 0.2);
        assert_eq!(res.outlier_fraction(100.0), 0.0);
        assert_eq!(res.meets(SrdLevel::Design), Some(true));
        assert_eq!(res.meets(SrdLevel::Stretch), Some(false));
        // 20 % beyond AD1 = 20 mas, AF1 design allows 10 %
        assert_eq!(res.outliers_meet(SrdLevel::Design), Some(false));
        assert_eq!(res.outliers_meet(SrdLevel::Minimum), Some(true));
    }

    #[test]
    fn test_empty_and_unlabelled() {
        let empty = result(Some(AmMetric::Am2), vec![]);
        assert!(empty.median_mas().is_nan());
        assert!(empty.outlier_fraction(10.0).is_nan());
        assert_eq!(empty.meets(SrdLevel::Design), None);

        let custom = result(None, vec![1.0]);
        assert_eq!(custom.meets(SrdLevel::Design), None);
        assert_eq!(
            custom.to_string(),
            "AMx: median=1.000 mas over 1 pairs (D=5 arcmin)"
        );
        assert_eq!(format!("{custom:#}").lines().count(), 9);
    }
}
