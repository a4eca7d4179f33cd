//! # Spherical geometry primitives
//!
//! Angular distances and mean positions on the unit sphere. All angles are in **radians**.
//!
//! * [`spherical_distance`] – great-circle distance with the haversine formula. The law of
//!   cosines loses precision for the milliarcsecond-scale separations that dominate
//!   repeatability measurements, the haversine form does not.
//! * [`pairwise_visit_distances`] – distances between two objects, visit by visit.
//! * [`mean_position`] – spherical average of a set of positions (sum of unit vectors,
//!   then normalised). A plain arithmetic mean of RA breaks across the 0/2π wrap and near
//!   the poles.
use itertools::iproduct;
use nalgebra::Vector3;

use crate::{
    constants::{Radian, VisitId},
    conversion::wrap_ra,
};

/// Position of an object as measured in one visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitPosition {
    pub visit: VisitId,
    pub ra: Radian,
    pub dec: Radian,
}

impl VisitPosition {
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.ra.is_finite() && self.dec.is_finite()
    }
}

/// Great-circle distance between two points on the unit sphere.
///
/// Arguments
/// ---------
/// * `ra1`, `dec1`: first point (radians)
/// * `ra2`, `dec2`: second point (radians)
///
/// Return
/// ------
/// * The angular distance in radians, in `[0, π]`. NaN if any input is NaN.
#[inline]
pub fn spherical_distance(ra1: Radian, dec1: Radian, ra2: Radian, dec2: Radian) -> Radian {
    let half_dra = (ra1 - ra2) / 2.0;
    let half_ddec = (dec1 - dec2) / 2.0;
    let a = half_ddec.sin().powi(2) + dec1.cos() * dec2.cos() * half_dra.sin().powi(2);
    // rounding can push `a` a hair above 1 for antipodal points; `clamp` keeps NaN
    2.0 * a.sqrt().clamp(0.0, 1.0).asin()
}

/// Distance between two objects in every visit where both were measured.
///
/// For each pair of positions sharing the same visit id, the spherical distance between the
/// two objects is computed. Pairs where any coordinate is non-finite are skipped.
///
/// Arguments
/// ---------
/// * `obj1`: per-visit positions of the first object
/// * `obj2`: per-visit positions of the second object
///
/// Return
/// ------
/// * The distances (radians), in the order of `obj1` then `obj2`. An empty vector means the
///   two objects share no usable visit.
pub fn pairwise_visit_distances(obj1: &[VisitPosition], obj2: &[VisitPosition]) -> Vec<Radian> {
    iproduct!(obj1.iter(), obj2.iter())
        .filter(|(p1, p2)| p1.visit == p2.visit && p1.is_finite() && p2.is_finite())
        .map(|(p1, p2)| spherical_distance(p1.ra, p1.dec, p2.ra, p2.dec))
        .collect()
}

#[inline]
fn radec_to_unit(ra: Radian, dec: Radian) -> Vector3<f64> {
    let cos_dec = dec.cos();
    Vector3::new(cos_dec * ra.cos(), cos_dec * ra.sin(), dec.sin())
}

/// Spherical mean of a set of positions.
///
/// Each finite position is turned into a unit vector, the vectors are summed and the sum is
/// converted back to equatorial coordinates.
///
/// Arguments
/// ---------
/// * `positions`: the per-visit positions of one object
///
/// Return
/// ------
/// * `Some((mean_ra, mean_dec))` with `mean_ra ∈ [0, 2π)`,
/// * `None` if no position is finite or if the unit vectors cancel out.
pub fn mean_position<'a, I>(positions: I) -> Option<(Radian, Radian)>
where
    I: IntoIterator<Item = &'a VisitPosition>,
{
    let sum = positions
        .into_iter()
        .filter(|p| p.is_finite())
        .map(|p| radec_to_unit(p.ra, p.dec))
        .fold(Vector3::zeros(), |acc, v| acc + v);

    let norm = sum.norm();
    if norm < f64::EPSILON {
        return None;
    }
    let unit = sum / norm;
    let ra = wrap_ra(unit.y.atan2(unit.x));
    let dec = unit.z.atan2(unit.x.hypot(unit.y));
    Some((ra, dec))
}
