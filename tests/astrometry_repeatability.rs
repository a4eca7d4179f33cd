mod common;

use approx::assert_relative_eq;
use common::GridField;
use rand::{rngs::StdRng, SeedableRng};
use validate_drp::astrometry::{calc_am1, calc_am2, calc_amx, AmxParams};
use validate_drp::catalog::batch_reader::MeasurementBatch;
use validate_drp::catalog::{GroupView, GroupedObservationTable};
use validate_drp::constants::PSF_MAG_FIELD;
use validate_drp::conversion::mas_to_rad;
use validate_drp::srd::{AmMetric, SrdLevel};

#[test]
fn test_two_objects_constant_offset() {
    // two objects 5 mas apart in declination, on the same two visits, no noise
    let offset = mas_to_rad(5.0);
    let (ra, dec) = (1.2, -0.4);
    let object = [1_u64, 1, 2, 2];
    let visit = [100_u64, 200, 100, 200];
    let ras = [ra, ra, ra, ra];
    let decs = [dec, dec, dec + offset, dec + offset];
    let mags = [19.0, 19.0, 20.0, 20.0];
    let batch = MeasurementBatch::from_radians_borrowed(&object, &visit, &ras, &decs, &mags);
    let table = GroupedObservationTable::new_from_batch(&batch, PSF_MAG_FIELD).unwrap();
    let key = table.schema().find(PSF_MAG_FIELD).unwrap();

    let d_arcmin = 5.0 / 60_000.0;
    let params = AmxParams::builder()
        .d_arcmin(d_arcmin)
        .width_arcmin(d_arcmin)
        .build()
        .unwrap();
    let res = calc_amx(&table, key, &params).unwrap();

    assert_eq!(res.len(), 1);
    assert_relative_eq!(res.values_mas[0], 5.0, max_relative = 1e-6);
    assert_eq!(res.skipped_pairs, 0);
}

#[test]
fn test_am1_on_grid() {
    let mut rng = StdRng::seed_from_u64(42);
    let (table, key) = GridField {
        pos_sigma_mas: 10.0,
        ..GridField::default()
    }
    .build(&mut rng);

    let am1 = calc_am1(&table, key).unwrap();
    assert_eq!(am1.metric, Some(AmMetric::Am1));
    assert_eq!(am1.n_objects, 16);
    // 4x4 grid: 12 east-west and 12 north-south neighbours at 5 arcmin
    assert_eq!(am1.len(), 24);
    for v in &am1.values_mas {
        assert_relative_eq!(*v, 300_000.0, max_relative = 1e-3);
    }
    assert_eq!(am1.meets(SrdLevel::Design), Some(false));

    // grid separations are 5·sqrt(a² + b²) arcmin, none within [19, 21)
    let am2 = calc_am2(&table, key).unwrap();
    assert!(am2.is_empty());
    assert_eq!(am2.n_objects, 16);
    assert_eq!(am2.skipped_pairs, 0);
}

#[test]
fn test_magnitude_range_excludes_faint_grid() {
    let mut rng = StdRng::seed_from_u64(1);
    let (table, key) = GridField {
        mag: 22.0,
        ..GridField::default()
    }
    .build(&mut rng);

    let am1 = calc_am1(&table, key).unwrap();
    assert_eq!(am1.n_objects, 0);
    assert!(am1.is_empty());
    assert!(am1.median_mas().is_nan());
    assert_eq!(am1.meets(SrdLevel::Minimum), None);

    let params = AmxParams::builder().mag_range(20.0, 23.0).build().unwrap();
    let wide = calc_amx(&table, key, &params).unwrap();
    assert_eq!(wide.len(), 24);
}
