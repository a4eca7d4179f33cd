//! # Catalog model: schema, records, object groups
//!
//! In-memory representation of a **multi-visit matched catalog**: every astronomical object
//! observed across several visits owns one [`ObjectGroup`] holding its per-visit
//! [`MeasurementRecord`]s. The whole catalog is a [`GroupedObservationTable`].
//!
//! The repeatability metrics do not depend on the concrete table type: they consume anything
//! implementing the [`GroupView`] trait, which exposes the group sequence, the [`Schema`], and
//! field-keyed value extraction.
//!
//! Data Model
//! -----------------
//! * [`Schema`] – ordered list of named scalar fields carried by every record
//!   (e.g. `base_PsfFlux_mag`). Field names are resolved **once** into a [`FieldKey`].
//! * [`MeasurementRecord`] – one visit's measurement of one object: source id, visit, RA/DEC
//!   (**radians**), schema-indexed values and quality flags.
//! * [`ObjectGroup`] – all records of one object, stored inline for small groups.
//! * [`GroupedObservationTable`] – ordered groups + schema, with an `ahash` index from
//!   [`ObjectId`] to group position. Insertion order is preserved so that seeded runs are
//!   reproducible.
//!
//! Invariants
//! -----------------
//! * Every record in a table carries exactly `schema.len()` field values.
//! * An [`ObjectId`] owns at most one group (groups never overlap).
//!
//! Construction
//! -----------------
//! Groups are normally produced by an upstream multi-visit matcher. This crate provides:
//! * [`GroupedObservationTable::push_group`] / [`GroupedObservationTable::push_record`] for
//!   record-by-record construction,
//! * [`batch_reader::MeasurementBatch`] for columnar ingestion of already-matched rows.
//!
//! Example
//! -----------------
//! ```rust
//! use validate_drp::catalog::{GroupView, GroupedObservationTable, MeasurementRecord, Schema};
//!
//! let schema = Schema::new(["base_PsfFlux_mag"]);
//! let mag_key = schema.find("base_PsfFlux_mag")?;
//!
//! let mut table = GroupedObservationTable::new(schema);
//! table.push_record(7, MeasurementRecord::new(1, 100, 0.5, 0.1, [20.0]))?;
//! table.push_record(7, MeasurementRecord::new(2, 200, 0.5, 0.1, [20.1]))?;
//!
//! let means = table.aggregate(mag_key, |mags| mags.iter().sum::<f64>() / mags.len() as f64);
//! assert_eq!(means.len(), 1);
//! # Ok::<(), validate_drp::ValidateError>(())
//! ```
pub mod batch_reader;
pub mod count_stats;

use std::collections::HashMap;

use ahash::RandomState;
use smallvec::SmallVec;

use crate::{
    constants::{ObjectId, Radian, Records, VisitId},
    geometry::VisitPosition,
    validate_errors::ValidateError,
};
use count_stats::MeasurementCountStats;

/// Ordered list of the named scalar fields carried by each record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    names: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a field name into a [`FieldKey`].
    ///
    /// Arguments
    /// ---------
    /// * `name`: the field name, e.g. `"base_PsfFlux_mag"`
    ///
    /// Return
    /// ------
    /// * The key of the field, or [`ValidateError::UnknownField`] if the schema has no such
    ///   field. An unknown field means the catalog does not have the expected layout, so callers
    ///   should treat this error as fatal.
    pub fn find(&self, name: &str) -> Result<FieldKey, ValidateError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(FieldKey)
            .ok_or_else(|| ValidateError::UnknownField(name.to_string()))
    }

    pub fn name(&self, key: FieldKey) -> Option<&str> {
        self.names.get(key.0).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Handle on a schema field, obtained from [`Schema::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey(usize);

impl FieldKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One visit's measurement of one object.
///
/// # Fields
///
/// * `id` - Source identifier in the per-visit catalog
/// * `visit` - The visit in which the source was measured
/// * `ra` - Right ascension in Radians
/// * `dec` - Declination in Radians
/// * `flags` - Bit set of quality flags, meaning defined by the producer
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub id: u64,
    pub visit: VisitId,
    pub ra: Radian,
    pub dec: Radian,
    pub flags: u32,
    fields: SmallVec<[f64; 4]>,
}

impl MeasurementRecord {
    /// Create a new record with no quality flag set
    ///
    /// Arguments
    /// ---------
    /// * `id`: source identifier
    /// * `visit`: visit identifier
    /// * `ra`: right ascension (radians)
    /// * `dec`: declination (radians)
    /// * `fields`: the field values, in schema order
    pub fn new(
        id: u64,
        visit: VisitId,
        ra: Radian,
        dec: Radian,
        fields: impl IntoIterator<Item = f64>,
    ) -> Self {
        MeasurementRecord {
            id,
            visit,
            ra,
            dec,
            flags: 0,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Value of a schema field, NaN if the key does not belong to this record's schema.
    #[inline]
    pub fn get(&self, key: FieldKey) -> f64 {
        self.fields.get(key.0).copied().unwrap_or(f64::NAN)
    }

    pub fn fields(&self) -> &[f64] {
        &self.fields
    }

    #[inline]
    pub fn has_flags(&self, mask: u32) -> bool {
        self.flags & mask == mask
    }

    #[inline]
    pub fn position(&self) -> VisitPosition {
        VisitPosition {
            visit: self.visit,
            ra: self.ra,
            dec: self.dec,
        }
    }
}

/// All the per-visit records matched to one astronomical object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGroup {
    pub object: ObjectId,
    records: Records,
}

impl ObjectGroup {
    pub fn new(object: ObjectId) -> Self {
        ObjectGroup {
            object,
            records: SmallVec::new(),
        }
    }

    pub fn from_records(object: ObjectId, records: impl IntoIterator<Item = MeasurementRecord>) -> Self {
        ObjectGroup {
            object,
            records: records.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one field across all visits, non-finite entries included.
    pub fn values(&self, key: FieldKey) -> SmallVec<[f64; 6]> {
        self.records.iter().map(|r| r.get(key)).collect()
    }

    /// Values of one field across all visits, keeping only the finite ones.
    pub fn finite_values(&self, key: FieldKey) -> SmallVec<[f64; 6]> {
        self.records
            .iter()
            .map(|r| r.get(key))
            .filter(|v| v.is_finite())
            .collect()
    }

    pub fn visit_positions(&self) -> SmallVec<[VisitPosition; 6]> {
        self.records.iter().map(MeasurementRecord::position).collect()
    }

    pub(crate) fn push(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }
}

/// Read access to a grouped multi-visit catalog.
///
/// Implementors expose the ordered sequence of [`ObjectGroup`]s and the [`Schema`] their
/// records conform to. Aggregation and selection helpers are provided on top of these two
/// accessors.
///
/// See also
/// ------------
/// * [`calc_pa1`](crate::photometry::calc_pa1) – Photometric repeatability over a view.
/// * [`calc_amx`](crate::astrometry::calc_amx) – Astrometric repeatability over a view.
pub trait GroupView {
    fn schema(&self) -> &Schema;

    fn groups(&self) -> &[ObjectGroup];

    /// Extract a field value from a record of this view.
    #[inline]
    fn field_value(&self, record: &MeasurementRecord, key: FieldKey) -> f64 {
        record.get(key)
    }

    fn len(&self) -> usize {
        self.groups().len()
    }

    fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }

    /// Apply a reduction to the values of one field, group by group.
    ///
    /// Arguments
    /// ---------
    /// * `key`: the field to extract from each record
    /// * `reducer`: called once per group with the field values of its records (in record order)
    ///
    /// Return
    /// ------
    /// * One reduced value per group, in group order
    fn aggregate<T, F>(&self, key: FieldKey, mut reducer: F) -> Vec<T>
    where
        F: FnMut(&[f64]) -> T,
    {
        self.groups()
            .iter()
            .map(|group| {
                let values: SmallVec<[f64; 6]> = group
                    .records()
                    .iter()
                    .map(|r| self.field_value(r, key))
                    .collect();
                reducer(&values)
            })
            .collect()
    }

    /// Keep the groups matching a group-level predicate, in order.
    fn select<P>(&self, mut predicate: P) -> Vec<&ObjectGroup>
    where
        P: FnMut(&ObjectGroup) -> bool,
    {
        self.groups().iter().filter(|g| predicate(g)).collect()
    }

    /// Total number of records across all groups.
    fn total_measurements(&self) -> usize {
        self.groups().iter().map(ObjectGroup::len).sum()
    }

    /// Distribution of the number of records per group, `None` for an empty view.
    fn measurement_count_stats(&self) -> Option<MeasurementCountStats> {
        MeasurementCountStats::from_groups(self.groups())
    }
}

/// Ordered collection of object groups sharing one schema.
#[derive(Debug, Clone, Default)]
pub struct GroupedObservationTable {
    schema: Schema,
    groups: Vec<ObjectGroup>,
    index: HashMap<ObjectId, usize, RandomState>,
}

impl GroupedObservationTable {
    pub fn new(schema: Schema) -> Self {
        GroupedObservationTable {
            schema,
            groups: Vec::new(),
            index: HashMap::default(),
        }
    }

    fn check_fields(&self, record: &MeasurementRecord) -> Result<(), ValidateError> {
        if record.fields.len() != self.schema.len() {
            return Err(ValidateError::FieldCountMismatch {
                expected: self.schema.len(),
                found: record.fields.len(),
            });
        }
        Ok(())
    }

    /// Append a complete group.
    ///
    /// Return
    /// ------
    /// * [`ValidateError::DuplicateObject`] if the object already has a group,
    /// * [`ValidateError::FieldCountMismatch`] if a record does not match the schema.
    pub fn push_group(&mut self, group: ObjectGroup) -> Result<(), ValidateError> {
        if self.index.contains_key(&group.object) {
            return Err(ValidateError::DuplicateObject(group.object));
        }
        for record in group.records() {
            self.check_fields(record)?;
        }
        self.index.insert(group.object, self.groups.len());
        self.groups.push(group);
        Ok(())
    }

    /// Append one record to the group of `object`, creating the group on first use.
    pub fn push_record(
        &mut self,
        object: ObjectId,
        record: MeasurementRecord,
    ) -> Result<(), ValidateError> {
        self.check_fields(&record)?;
        let next = self.groups.len();
        let idx = *self.index.entry(object).or_insert(next);
        if idx == next {
            self.groups.push(ObjectGroup::new(object));
        }
        self.groups[idx].push(record);
        Ok(())
    }

    pub fn get(&self, object: ObjectId) -> Option<&ObjectGroup> {
        self.index.get(&object).map(|&i| &self.groups[i])
    }
}

impl GroupView for GroupedObservationTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn groups(&self) -> &[ObjectGroup] {
        &self.groups
    }
}
