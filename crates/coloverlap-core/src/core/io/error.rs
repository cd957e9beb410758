use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MolIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("SDF parse error on line {line}: {kind}")]
    Parse { line: usize, kind: SdfParseErrorKind },
    #[error("Batch size must be at least 1 (got {0})")]
    InvalidBatchSize(usize),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SdfParseErrorKind {
    #[error("Record ended before its {0} block was complete")]
    TruncatedRecord(&'static str),
    #[error("Invalid {field} in counts line (value: '{value}')")]
    InvalidCount { field: &'static str, value: String },
    #[error("V3000 connection tables are not supported")]
    V3000Unsupported,
    #[error("Invalid {axis} coordinate (value: '{value}')")]
    InvalidCoordinate { axis: char, value: String },
    #[error("Unrecognized element symbol '{0}'")]
    InvalidElement(String),
    #[error("Invalid bond field '{value}'")]
    InvalidBondField { value: String },
    #[error("Bond references atom {index} but the record declares {atom_count} atoms")]
    BondOutOfRange { index: usize, atom_count: usize },
    #[error("Unsupported bond order {0}")]
    UnsupportedBondOrder(u8),
    #[error("Malformed charge property line")]
    InvalidChargeLine,
}
