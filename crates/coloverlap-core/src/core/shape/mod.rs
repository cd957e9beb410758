//! Gaussian shape model and the default rigid shape aligner.

pub mod alignment;
pub mod gaussian;
