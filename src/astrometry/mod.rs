//! # Astrometric repeatability: AMx, AM1, AM2, AM3
//!
//! The SRD characterizes astrometric repeatability by the RMS of the distance between two
//! stars separated by about `D` arcmin, measured repeatedly over many visits. `AM1`, `AM2`
//! and `AM3` fix `D` to 5, 20 and 200 arcmin (the scale of a sensor, a raft and the camera).
//!
//! Procedure
//! -----------------
//! 1. Keep the object groups whose **median finite magnitude** lies in `[bright, faint)`.
//! 2. Compute the spherical mean position of each kept group; groups without a finite
//!    position are dropped.
//! 3. Build the annulus `[D − w/2, D + w/2)` arcmin around the fiducial separation.
//! 4. For each unordered pair of kept objects whose mean separation lies in the annulus,
//!    compute the distance between the two objects in every visit where both were measured
//!    ([`pairwise_visit_distances`]). The RMS of those distances is one sample. Pairs without
//!    a shared visit are skipped and counted.
//! 5. Convert the samples to milliarcseconds.
//!
//! An empty sample list is a valid result: a small field may hold no pair at `D = 200`.
//!
//! Parameters
//! -----------------
//! [`AmxParams`] is configured through [`AmxParams::builder`], which validates the annulus and
//! the magnitude range. [`calc_am1`], [`calc_am2`], [`calc_am3`] use the SRD separations, a
//! 2 arcmin wide annulus and the default magnitude range.
//!
//! Progress UI (feature: `progress`)
//! -----------------
//! With the `progress` feature, [`calc_amx`] renders an `indicatif` progress bar over the
//! outer object loop, with the smoothed time per object.
//!
//! Example
//! -----------------
//! ```rust
//! use validate_drp::astrometry::{calc_amx, AmxParams};
//! use validate_drp::catalog::batch_reader::MeasurementBatch;
//! use validate_drp::catalog::{GroupView, GroupedObservationTable};
//!
//! let object = [1_u64, 1, 2, 2];
//! let visit = [10_u64, 20, 10, 20];
//! let ra = [150.0, 150.0, 150.0, 150.0];
//! let dec = [2.0, 2.0, 2.0 + 10.0 / 60.0, 2.0 + 10.0 / 60.0];
//! let mag = [19.0, 19.01, 20.0, 20.02];
//! let batch = MeasurementBatch::from_degrees_owned(&object, &visit, &ra, &dec, &mag);
//! let table = GroupedObservationTable::new_from_batch(&batch, "base_PsfFlux_mag")?;
//! let mag_key = table.schema().find("base_PsfFlux_mag")?;
//!
//! let params = AmxParams::builder().d_arcmin(10.0).width_arcmin(2.0).build()?;
//! let amx = calc_amx(&table, mag_key, &params)?;
//! println!("{amx:#}");
//! assert_eq!(amx.len(), 1);
//! # Ok::<(), validate_drp::ValidateError>(())
//! ```
pub mod astrometric_result;
#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

use std::cmp::Ordering::{Equal, Greater, Less};

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::{
    catalog::{FieldKey, GroupView},
    constants::{ArcMin, Magnitude, ObjectId, Radian, DEFAULT_ANNULUS_WIDTH, DEFAULT_MAG_RANGE},
    conversion::{arcmin_to_rad, rad_to_mas},
    geometry::{mean_position, pairwise_visit_distances, spherical_distance, VisitPosition},
    srd::AmMetric,
    statistics::{finite_values, median, rms},
    validate_errors::ValidateError,
};

pub use astrometric_result::AstrometricResult;

#[cfg(feature = "progress")]
use progress_bar::ObjectProgress;

/// Selection parameters of an AMx run.
///
/// Fields
/// -----------------
/// * `d_arcmin` – fiducial separation D (arcmin).
/// * `width_arcmin` – full width of the separation annulus (arcmin).
/// * `mag_range` – `[bright, faint)` range for the median magnitude of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmxParams {
    pub d_arcmin: ArcMin,
    pub width_arcmin: ArcMin,
    pub mag_range: (Magnitude, Magnitude),
}

impl AmxParams {
    /// Create a new [`AmxParamsBuilder`], starting from the AM1 separation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use validate_drp::astrometry::AmxParams;
    ///
    /// let params = AmxParams::builder()
    ///     .d_arcmin(20.0)
    ///     .width_arcmin(4.0)
    ///     .mag_range(16.0, 22.0)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.annulus_arcmin(), (18.0, 22.0));
    /// ```
    pub fn builder() -> AmxParamsBuilder {
        AmxParamsBuilder::new()
    }

    /// Parameters of one of the SRD metrics.
    pub fn for_metric(metric: AmMetric) -> Self {
        AmxParams {
            d_arcmin: metric.separation(),
            ..AmxParams::default()
        }
    }

    /// `(D − w/2, D + w/2)` in arcmin.
    pub fn annulus_arcmin(&self) -> (ArcMin, ArcMin) {
        let half = self.width_arcmin / 2.0;
        (self.d_arcmin - half, self.d_arcmin + half)
    }

    /// Check the consistency of the parameters.
    ///
    /// Validation rules
    /// -----------------
    /// * `width_arcmin > 0` and `D − width/2 ≥ 0`, both finite,
    ///   otherwise [`ValidateError::InvalidAnnulus`].
    /// * `bright < faint`, both finite, otherwise [`ValidateError::InvalidMagRange`].
    pub fn validate(&self) -> Result<(), ValidateError> {
        let (lo, hi) = self.annulus_arcmin();
        let width_ok = self.width_arcmin.partial_cmp(&0.0) == Some(Greater);
        let lo_ok = matches!(lo.partial_cmp(&0.0), Some(Greater) | Some(Equal));
        if !width_ok || !lo_ok || !hi.is_finite() {
            return Err(ValidateError::InvalidAnnulus {
                d: self.d_arcmin,
                width: self.width_arcmin,
            });
        }

        let (bright, faint) = self.mag_range;
        if !bright.is_finite() || bright.partial_cmp(&faint) != Some(Less) || !faint.is_finite() {
            return Err(ValidateError::InvalidMagRange(bright, faint));
        }
        Ok(())
    }
}

impl Default for AmxParams {
    fn default() -> Self {
        AmxParams {
            d_arcmin: AmMetric::Am1.separation(),
            width_arcmin: DEFAULT_ANNULUS_WIDTH,
            mag_range: DEFAULT_MAG_RANGE,
        }
    }
}

/// Builder for [`AmxParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct AmxParamsBuilder {
    params: AmxParams,
}

impl AmxParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: AmxParams::default(),
        }
    }

    pub fn d_arcmin(mut self, v: ArcMin) -> Self {
        self.params.d_arcmin = v;
        self
    }
    pub fn width_arcmin(mut self, v: ArcMin) -> Self {
        self.params.width_arcmin = v;
        self
    }
    pub fn mag_range(mut self, bright: Magnitude, faint: Magnitude) -> Self {
        self.params.mag_range = (bright, faint);
        self
    }

    /// Finalize the builder, see [`AmxParams::validate`] for the rules.
    pub fn build(self) -> Result<AmxParams, ValidateError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// An object kept for pairing.
struct Star {
    object: ObjectId,
    ra: Radian,
    dec: Radian,
    positions: SmallVec<[VisitPosition; 6]>,
}

fn select_stars(
    view: &impl GroupView,
    mag_key: FieldKey,
    (bright, faint): (Magnitude, Magnitude),
) -> Vec<Star> {
    view.groups()
        .iter()
        .filter_map(|group| {
            let mags: SmallVec<[f64; 6]> = group
                .records()
                .iter()
                .map(|r| view.field_value(r, mag_key))
                .collect();
            let med = median(&finite_values(&mags));
            if !(bright <= med && med < faint) {
                return None;
            }

            let positions = group.visit_positions();
            let Some((ra, dec)) = mean_position(&positions) else {
                debug!(object = group.object, "no finite position, object dropped");
                return None;
            };
            Some(Star {
                object: group.object,
                ra,
                dec,
                positions,
            })
        })
        .collect()
}

/// Astrometric repeatability for a fiducial separation D.
///
/// Arguments
/// ---------
/// * `view`: the grouped catalog
/// * `mag_key`: the magnitude field used for the selection
/// * `params`: separation, annulus width and magnitude range
///
/// Return
/// ------
/// * An [`AstrometricResult`] with one RMS sample (mas) per pair of selected objects whose
///   mean separation lies in `[D − w/2, D + w/2)`. The result is unlabelled
///   (`metric = None`); the SRD variants are [`calc_am1`], [`calc_am2`], [`calc_am3`].
/// * [`ValidateError::InvalidAnnulus`] or [`ValidateError::InvalidMagRange`] if `params` does
///   not validate.
///
/// Complexity
/// ----------
/// * O(n²) separations for `n` selected objects, plus O(k²) per accepted pair of objects with
///   `k` visits each.
pub fn calc_amx(
    view: &impl GroupView,
    mag_key: FieldKey,
    params: &AmxParams,
) -> Result<AstrometricResult, ValidateError> {
    params.validate()?;

    let stars = select_stars(view, mag_key, params.mag_range);
    let annulus = params.annulus_arcmin();
    let (lo, hi) = (arcmin_to_rad(annulus.0), arcmin_to_rad(annulus.1));

    let mut values_mas = Vec::new();
    let mut skipped_pairs = 0_usize;

    #[cfg(feature = "progress")]
    let mut progress = ObjectProgress::new(stars.len());

    for (i, s1) in stars.iter().enumerate() {
        for s2 in &stars[i + 1..] {
            let sep = spherical_distance(s1.ra, s1.dec, s2.ra, s2.dec);
            if !(lo <= sep && sep < hi) {
                continue;
            }

            let distances = pairwise_visit_distances(&s1.positions, &s2.positions);
            let distances = finite_values(&distances);
            if distances.is_empty() {
                debug!(
                    object1 = s1.object,
                    object2 = s2.object,
                    "no shared visit between the two objects"
                );
                skipped_pairs += 1;
                continue;
            }
            values_mas.push(rad_to_mas(rms(&distances)));
        }

        #[cfg(feature = "progress")]
        progress.tick(values_mas.len());
    }

    #[cfg(feature = "progress")]
    progress.finish();

    let result = AstrometricResult {
        metric: None,
        values_mas,
        d: params.d_arcmin,
        annulus,
        mag_range: params.mag_range,
        n_objects: stars.len(),
        skipped_pairs,
    };
    info!(
        d_arcmin = result.d,
        objects = result.n_objects,
        pairs = result.len(),
        skipped_pairs,
        median_mas = result.median_mas(),
        "AMx computed"
    );
    Ok(result)
}

/// One of the SRD astrometric metrics, with a custom magnitude range.
pub fn calc_am(
    view: &impl GroupView,
    mag_key: FieldKey,
    metric: AmMetric,
    mag_range: (Magnitude, Magnitude),
) -> Result<AstrometricResult, ValidateError> {
    let params = AmxParams {
        mag_range,
        ..AmxParams::for_metric(metric)
    };
    let mut result = calc_amx(view, mag_key, &params)?;
    result.metric = Some(metric);
    Ok(result)
}

/// AM1: D = 5 arcmin, 2 arcmin annulus, default magnitude range.
pub fn calc_am1(
    view: &impl GroupView,
    mag_key: FieldKey,
) -> Result<AstrometricResult, ValidateError> {
    calc_am(view, mag_key, AmMetric::Am1, DEFAULT_MAG_RANGE)
}

/// AM2: D = 20 arcmin, 2 arcmin annulus, default magnitude range.
pub fn calc_am2(
    view: &impl GroupView,
    mag_key: FieldKey,
) -> Result<AstrometricResult, ValidateError> {
    calc_am(view, mag_key, AmMetric::Am2, DEFAULT_MAG_RANGE)
}

/// AM3: D = 200 arcmin, 2 arcmin annulus, default magnitude range.
pub fn calc_am3(
    view: &impl GroupView,
    mag_key: FieldKey,
) -> Result<AstrometricResult, ValidateError> {
    calc_am(view, mag_key, AmMetric::Am3, DEFAULT_MAG_RANGE)
}

#[cfg(test)]
mod astrometry_test {
    use super::*;
    use crate::catalog::{GroupedObservationTable, MeasurementRecord, ObjectGroup, Schema};
    use crate::conversion::mas_to_rad;
    use approx::assert_relative_eq;

    /// One object observed in `visits` at a fixed position (degrees).
    fn star(object: u64, ra_deg: f64, dec_deg: f64, mag: f64, visits: &[u64]) -> ObjectGroup {
        ObjectGroup::from_records(
            object,
            visits.iter().map(|&v| {
                MeasurementRecord::new(v, v, ra_deg.to_radians(), dec_deg.to_radians(), [mag])
            }),
        )
    }

    fn table(groups: Vec<ObjectGroup>) -> (GroupedObservationTable, FieldKey) {
        let schema = Schema::new(["base_PsfFlux_mag"]);
        let key = schema.find("base_PsfFlux_mag").unwrap();
        let mut table = GroupedObservationTable::new(schema);
        for g in groups {
            table.push_group(g).unwrap();
        }
        (table, key)
    }

    #[test]
    fn test_builder_validation() {
        let params = AmxParams::builder().build().unwrap();
        assert_eq!(params, AmxParams::default());
        assert_eq!(params.annulus_arcmin(), (4.0, 6.0));

        assert_eq!(
            AmxParams::builder().width_arcmin(0.0).build(),
            Err(ValidateError::InvalidAnnulus { d: 5.0, width: 0.0 })
        );
        assert_eq!(
            AmxParams::builder().d_arcmin(1.0).width_arcmin(3.0).build(),
            Err(ValidateError::InvalidAnnulus { d: 1.0, width: 3.0 })
        );
        assert!(AmxParams::builder().d_arcmin(1.0).width_arcmin(2.0).build().is_ok());
        assert!(AmxParams::builder().width_arcmin(f64::NAN).build().is_err());
        assert_eq!(
            AmxParams::builder().mag_range(21.0, 17.0).build(),
            Err(ValidateError::InvalidMagRange(21.0, 17.0))
        );
        assert!(AmxParams::builder().mag_range(17.0, 17.0).build().is_err());
        assert!(AmxParams::builder()
            .mag_range(f64::NEG_INFINITY, 20.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_pair_in_annulus() {
        let visits = [1, 2, 3];
        let (table, key) = table(vec![
            star(1, 30.0, 0.0, 19.0, &visits),
            star(2, 30.0, 5.0 / 60.0, 19.5, &visits),
        ]);

        let res = calc_am1(&table, key).unwrap();
        assert_eq!(res.metric, Some(AmMetric::Am1));
        assert_eq!(res.n_objects, 2);
        assert_eq!(res.len(), 1);
        // fixed positions: the per-visit distance is the separation itself
        assert_relative_eq!(res.values_mas[0], 5.0 * 60.0 * 1000.0, max_relative = 1e-9);

        let am2 = calc_am2(&table, key).unwrap();
        assert!(am2.is_empty());
        assert!(am2.median_mas().is_nan());
    }

    #[test]
    fn test_annulus_bounds() {
        let visits = [1, 2];
        let (table, key) = table(vec![
            star(1, 0.0, 0.0, 19.0, &visits),
            star(2, 0.0, 7.0 / 60.0, 19.0, &visits),
            star(3, 0.0, 4.5 / 60.0, 19.0, &visits),
        ]);
        let res = calc_am1(&table, key).unwrap();
        // only (1, 3) at 4.5 arcmin: (1, 2) is 7 arcmin and (2, 3) 2.5 arcmin apart
        assert_eq!(res.len(), 1);
        assert_relative_eq!(res.values_mas[0], 4.5 * 60_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_magnitude_selection() {
        let visits = [1, 2];
        let (table, key) = table(vec![
            star(1, 0.0, 0.0, 19.0, &visits),
            star(2, 0.0, 5.0 / 60.0, 21.5, &visits),
            star(3, 5.0 / 60.0, 0.0, 16.9, &visits),
            star(4, 0.0, -5.0 / 60.0, f64::NAN, &visits),
        ]);
        let res = calc_am1(&table, key).unwrap();
        assert_eq!(res.n_objects, 1);
        assert!(res.is_empty());

        let wide = calc_am(&table, key, AmMetric::Am1, (16.0, 22.0)).unwrap();
        assert_eq!(wide.n_objects, 3);
        assert_eq!(wide.mag_range, (16.0, 22.0));
    }

    #[test]
    fn test_no_shared_visit_is_skipped() {
        let (table, key) = table(vec![
            star(1, 0.0, 0.0, 19.0, &[1, 2]),
            star(2, 0.0, 5.0 / 60.0, 19.0, &[3, 4]),
        ]);
        let res = calc_am1(&table, key).unwrap();
        assert!(res.is_empty());
        assert_eq!(res.skipped_pairs, 1);
    }

    #[test]
    fn test_rms_of_shared_visits() {
        let d0 = 5.0 / 60.0;
        let jitter = mas_to_rad(30.0).to_degrees();
        let obj1 = star(1, 0.0, 0.0, 19.0, &[1, 2]);
        let obj2 = ObjectGroup::from_records(
            2,
            [
                MeasurementRecord::new(10, 1, 0.0, (d0 + jitter).to_radians(), [19.0]),
                MeasurementRecord::new(11, 2, 0.0, (d0 - jitter).to_radians(), [19.0]),
            ],
        );
        let (table, key) = table(vec![obj1, obj2]);
        let res = calc_amx(&table, key, &AmxParams::default()).unwrap();
        assert_eq!(res.metric, None);
        assert_eq!(res.len(), 1);

        let (a, b) = (d0 * 3.6e6 + 30.0, d0 * 3.6e6 - 30.0);
        let expected = ((a * a + b * b) / 2.0).sqrt();
        assert_relative_eq!(res.values_mas[0], expected, max_relative = 1e-9);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let (table, key) = table(vec![]);
        let params = AmxParams {
            d_arcmin: 5.0,
            width_arcmin: -1.0,
            mag_range: DEFAULT_MAG_RANGE,
        };
        assert!(matches!(
            calc_amx(&table, key, &params),
            Err(ValidateError::InvalidAnnulus { .. })
        ));
        let empty = calc_am3(&table, key).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.annulus, (199.0, 201.0));
    }
}
