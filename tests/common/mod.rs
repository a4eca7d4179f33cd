use rand::Rng;
use rand_distr::{Distribution, Normal};
use validate_drp::catalog::{FieldKey, GroupView, GroupedObservationTable, MeasurementRecord, Schema};
use validate_drp::constants::PSF_MAG_FIELD;
use validate_drp::conversion::{arcmin_to_rad, mas_to_rad};

/// A square grid of non-variable stars observed in every visit.
pub struct GridField {
    pub n_side: usize,
    pub spacing_arcmin: f64,
    pub ra0_deg: f64,
    pub dec0_deg: f64,
    pub visits: Vec<u64>,
    pub mag: f64,
    pub mag_sigma: f64,
    pub pos_sigma_mas: f64,
}

impl Default for GridField {
    fn default() -> Self {
        GridField {
            n_side: 4,
            spacing_arcmin: 5.0,
            ra0_deg: 10.0,
            dec0_deg: 0.0,
            visits: vec![1, 2, 3, 4, 5],
            mag: 19.0,
            mag_sigma: 0.0,
            pos_sigma_mas: 0.0,
        }
    }
}

fn noise(sigma: f64, rng: &mut impl Rng) -> f64 {
    if sigma > 0.0 {
        Normal::new(0.0, sigma).unwrap().sample(rng)
    } else {
        0.0
    }
}

impl GridField {
    /// Build the table; star `i * n_side + j` sits `j` spacings east and `i` spacings north
    /// of the origin.
    pub fn build(&self, rng: &mut impl Rng) -> (GroupedObservationTable, FieldKey) {
        let schema = Schema::new([PSF_MAG_FIELD]);
        let key = schema.find(PSF_MAG_FIELD).unwrap();
        let mut table = GroupedObservationTable::new(schema);

        let step = arcmin_to_rad(self.spacing_arcmin);
        let mut source_id = 0;
        for i in 0..self.n_side {
            for j in 0..self.n_side {
                let object = (i * self.n_side + j) as u64;
                let dec = self.dec0_deg.to_radians() + i as f64 * step;
                let ra = self.ra0_deg.to_radians() + j as f64 * step / dec.cos();

                for &visit in &self.visits {
                    let mag = self.mag + noise(self.mag_sigma, rng);
                    let d_dec = mas_to_rad(noise(self.pos_sigma_mas, rng));
                    let d_ra = mas_to_rad(noise(self.pos_sigma_mas, rng)) / dec.cos();
                    let record =
                        MeasurementRecord::new(source_id, visit, ra + d_ra, dec + d_dec, [mag]);
                    table.push_record(object, record).unwrap();
                    source_id += 1;
                }
            }
        }
        assert_eq!(table.len(), self.n_side * self.n_side);
        (table, key)
    }
}
