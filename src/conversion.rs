use crate::constants::{ArcMin, ArcSec, Degree, MilliArcSec, Radian, MAS_PER_RAD, RADMIN, RADSEC};

/// Convert an angle from arcminutes to radians
///
/// Arguments
/// ---------
/// * `arcmin`: angle in arcminutes
///
/// Return
/// ------
/// * The angle in radians
#[inline]
pub fn arcmin_to_rad(arcmin: ArcMin) -> Radian {
    arcmin * RADMIN
}

/// Convert an angle from arcseconds to radians
#[inline]
pub fn arcsec_to_rad(arcsec: ArcSec) -> Radian {
    arcsec * RADSEC
}

/// Convert an angle from radians to milliarcseconds
///
/// Arguments
/// ---------
/// * `rad`: angle in radians
///
/// Return
/// ------
/// * The angle in milliarcseconds
#[inline]
pub fn rad_to_mas(rad: Radian) -> MilliArcSec {
    rad * MAS_PER_RAD
}

/// Convert an angle from milliarcseconds to radians
#[inline]
pub fn mas_to_rad(mas: MilliArcSec) -> Radian {
    mas / MAS_PER_RAD
}

/// Wrap a right ascension into `[0, 2π)`.
///
/// Degrees in, degrees out variants are not provided: every internal angle is in radians.
#[inline]
pub fn wrap_ra(ra: Radian) -> Radian {
    ra.rem_euclid(crate::constants::DPI)
}

/// Convert a `(ra, dec)` pair from degrees to radians
#[inline]
pub(crate) fn radec_deg_to_rad(ra: Degree, dec: Degree) -> (Radian, Radian) {
    (ra.to_radians(), dec.to_radians())
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arcmin_to_rad() {
        assert_relative_eq!(arcmin_to_rad(60.0), 1.0_f64.to_radians(), epsilon = 1e-15);
        assert_relative_eq!(arcmin_to_rad(5.0), 0.001454441043328608, epsilon = 1e-15);
        assert_eq!(arcmin_to_rad(0.0), 0.0);
    }

    #[test]
    fn test_rad_to_mas() {
        assert_relative_eq!(rad_to_mas(1.0_f64.to_radians()), 3.6e6, epsilon = 1e-6);
        assert_relative_eq!(rad_to_mas(arcsec_to_rad(1.0)), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(mas_to_rad(rad_to_mas(0.123)), 0.123, epsilon = 1e-15);
    }

    #[test]
    fn test_wrap_ra() {
        assert_relative_eq!(wrap_ra(-0.1), crate::constants::DPI - 0.1, epsilon = 1e-15);
        assert_relative_eq!(wrap_ra(crate::constants::DPI + 0.2), 0.2, epsilon = 1e-15);
        assert_eq!(wrap_ra(1.0), 1.0);
    }

    #[test]
    fn test_radec_deg_to_rad() {
        let (ra, dec) = radec_deg_to_rad(180.0, -90.0);
        assert_relative_eq!(ra, std::f64::consts::PI);
        assert_relative_eq!(dec, -std::f64::consts::FRAC_PI_2);
    }
}
