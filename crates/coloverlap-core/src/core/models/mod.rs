//! # Core Models Module
//!
//! Data structures shared by the readers, the scoring engines and the
//! result reducer.
//!
//! - [`atom`] - Elements and atoms of small molecules
//! - [`molecule`] - Connection tables with one or more 3-D conformers
//! - [`color`] - Color (pharmacophore) feature types, color atoms and the
//!   reference color-atom metadata that must stay stable across a run
//! - [`alignment`] - The outcome of a rigid shape overlay
//! - [`report`] - The masked result table handed to persistence

pub mod alignment;
pub mod atom;
pub mod color;
pub mod molecule;
pub mod report;
