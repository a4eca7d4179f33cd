//! # Columnar ingestion of matched measurements
//!
//! This module provides the [`MeasurementBatch`] type, which carries already-matched
//! measurements as parallel columns (object id, visit, RA, DEC, magnitude) and expands them
//! into a [`GroupedObservationTable`] with a single magnitude field.
//!
//! ## Units & Conventions
//! -----------------
//! - **Angles:** right ascension and declination in **radians**.
//!   If your upstream data are in **degrees**, use [`MeasurementBatch::from_degrees_owned`]
//!   to convert once at construction.
//! - **Magnitudes:** any magnitude system; non-finite values are kept as-is and filtered by the
//!   metrics.
//!
//! ## Invariants
//! -----------------
//! - `object_id.len() == visit.len() == ra.len() == dec.len() == mag.len()`, checked by
//!   [`MeasurementBatch::check_lengths`] before ingestion.
//!
//! ## Example
//! -----------------
//! ```rust
//! use validate_drp::catalog::batch_reader::MeasurementBatch;
//! use validate_drp::catalog::{GroupView, GroupedObservationTable};
//!
//! let object = vec![0_u64, 0, 1, 1];
//! let visit = vec![100_u64, 200, 100, 200];
//! let ra_deg = vec![210.01, 210.01, 211.00, 211.00];
//! let dec_deg = vec![-5.00, -5.00, -4.00, -4.00];
//! let mag = vec![19.2, 19.21, 20.5, 20.48];
//!
//! let batch = MeasurementBatch::from_degrees_owned(&object, &visit, &ra_deg, &dec_deg, &mag);
//! let table = GroupedObservationTable::new_from_batch(&batch, "base_PsfFlux_mag").unwrap();
//! assert_eq!(table.len(), 2);
//! ```
use std::borrow::Cow;

use crate::{
    constants::{Degree, Magnitude, ObjectId, Radian, VisitId},
    conversion::radec_deg_to_rad,
    validate_errors::ValidateError,
};

use super::{GroupView, GroupedObservationTable, MeasurementRecord, Schema};

/// Batch of matched measurements (angles in **radians**).
///
/// Fields
/// -----------------
/// * `object_id` — Object each row was matched to.
/// * `visit` — Visit each row was measured in.
/// * `ra` — Right ascension values (**radians**).
/// * `dec` — Declination values (**radians**).
/// * `mag` — One magnitude per row.
#[derive(Debug, Clone)]
pub struct MeasurementBatch<'a> {
    pub object_id: Cow<'a, [ObjectId]>,
    pub visit: Cow<'a, [VisitId]>,
    pub ra: Cow<'a, [Radian]>,
    pub dec: Cow<'a, [Radian]>,
    pub mag: Cow<'a, [Magnitude]>,
}

impl<'a> MeasurementBatch<'a> {
    /// Construct a batch by **borrowing** slices that are already in radians.
    ///
    /// No allocation and no unit conversion are performed.
    pub fn from_radians_borrowed(
        object_id: &'a [ObjectId],
        visit: &'a [VisitId],
        ra_rad: &'a [Radian],
        dec_rad: &'a [Radian],
        mag: &'a [Magnitude],
    ) -> Self {
        Self {
            object_id: Cow::Borrowed(object_id),
            visit: Cow::Borrowed(visit),
            ra: Cow::Borrowed(ra_rad),
            dec: Cow::Borrowed(dec_rad),
            mag: Cow::Borrowed(mag),
        }
    }

    /// Construct a batch from **degrees**, converting to **radians** and owning the buffers.
    ///
    /// Arguments
    /// -----------------
    /// * `object_id` — Object identifiers (borrowed).
    /// * `visit` — Visit identifiers (borrowed).
    /// * `ra_deg` — Right ascension in **degrees**; converted to radians.
    /// * `dec_deg` — Declination in **degrees**; converted to radians.
    /// * `mag` — Magnitudes (copied).
    ///
    /// Complexity
    /// ----------
    /// * O(n) for the degree→radian conversion.
    pub fn from_degrees_owned(
        object_id: &'a [ObjectId],
        visit: &'a [VisitId],
        ra_deg: &[Degree],
        dec_deg: &[Degree],
        mag: &[Magnitude],
    ) -> Self {
        let (ra, dec): (Vec<Radian>, Vec<Radian>) = ra_deg
            .iter()
            .zip(dec_deg)
            .map(|(&ra, &dec)| radec_deg_to_rad(ra, dec))
            .unzip();

        Self {
            object_id: Cow::Borrowed(object_id),
            visit: Cow::Borrowed(visit),
            ra: Cow::Owned(ra),
            dec: Cow::Owned(dec),
            mag: Cow::Owned(mag.to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        self.object_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_id.is_empty()
    }

    /// Check that every column has the same length.
    pub fn check_lengths(&self) -> Result<(), ValidateError> {
        let n = self.object_id.len();
        let columns = [
            ("visit", self.visit.len()),
            ("ra", self.ra.len()),
            ("dec", self.dec.len()),
            ("mag", self.mag.len()),
        ];
        for (name, len) in columns {
            if len != n {
                return Err(ValidateError::BatchLengthMismatch(format!(
                    "object_id has {n} rows, {name} has {len}"
                )));
            }
        }
        Ok(())
    }
}

impl GroupedObservationTable {
    /// Build a new table from a batch, naming its single magnitude field `mag_field`.
    ///
    /// Return
    /// ----------
    /// * The table, groups ordered by first appearance of each object id.
    /// * [`ValidateError::BatchLengthMismatch`] if the batch columns are not aligned.
    pub fn new_from_batch(
        batch: &MeasurementBatch<'_>,
        mag_field: &str,
    ) -> Result<Self, ValidateError> {
        let mut table = GroupedObservationTable::new(Schema::new([mag_field]));
        table.add_from_batch(batch)?;
        Ok(table)
    }

    /// Append a batch to a table whose schema has exactly one (magnitude) field.
    ///
    /// Source ids continue from the current number of measurements in the table.
    pub fn add_from_batch(&mut self, batch: &MeasurementBatch<'_>) -> Result<(), ValidateError> {
        batch.check_lengths()?;
        if self.schema().len() != 1 {
            return Err(ValidateError::FieldCountMismatch {
                expected: self.schema().len(),
                found: 1,
            });
        }

        let first_id = self.total_measurements() as u64;
        let rows = batch
            .object_id
            .iter()
            .zip(batch.visit.iter())
            .zip(batch.ra.iter().zip(batch.dec.iter()))
            .zip(batch.mag.iter());

        for (row, (((&object, &visit), (&ra, &dec)), &mag)) in rows.enumerate() {
            let record = MeasurementRecord::new(first_id + row as u64, visit, ra, dec, [mag]);
            self.push_record(object, record)?;
        }
        Ok(())
    }
}
