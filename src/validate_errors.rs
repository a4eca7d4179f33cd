use thiserror::Error;

use crate::constants::{ArcMin, Magnitude, ObjectId};

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Unknown field in catalog schema: {0}")]
    UnknownField(String),

    #[error("Record carries {found} field values but the schema defines {expected}")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("Measurement batch columns have mismatched lengths: {0}")]
    BatchLengthMismatch(String),

    #[error("Object {0} already has a group in this table")]
    DuplicateObject(ObjectId),

    #[error("At least two measurements are needed to draw a pair, got {0}")]
    NotEnoughMeasurements(usize),

    #[error("No usable object group to compute {0}")]
    NoData(&'static str),

    #[error("Invalid magnitude range: [{0}, {1})")]
    InvalidMagRange(Magnitude, Magnitude),

    #[error("Invalid annulus: D = {d} arcmin, width = {width} arcmin")]
    InvalidAnnulus { d: ArcMin, width: ArcMin },

    #[error("Missing key in run configuration: {0}")]
    MissingConfigKey(String),

    #[error("Unable to parse run configuration: {0}")]
    ConfigParse(#[from] serde_yml::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for ValidateError {
    fn eq(&self, other: &Self) -> bool {
        use ValidateError::*;
        match (self, other) {
            (UnknownField(a), UnknownField(b)) => a == b,
            (
                FieldCountMismatch {
                    expected: e1,
                    found: f1,
                },
                FieldCountMismatch {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (BatchLengthMismatch(a), BatchLengthMismatch(b)) => a == b,
            (DuplicateObject(a), DuplicateObject(b)) => a == b,
            (NotEnoughMeasurements(a), NotEnoughMeasurements(b)) => a == b,
            (NoData(a), NoData(b)) => a == b,
            (InvalidMagRange(a1, a2), InvalidMagRange(b1, b2)) => a1 == b1 && a2 == b2,
            (InvalidAnnulus { d: d1, width: w1 }, InvalidAnnulus { d: d2, width: w2 }) => {
                d1 == d2 && w1 == w2
            }
            (MissingConfigKey(a), MissingConfigKey(b)) => a == b,

            // Not comparable: same variant is enough
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
