//! # Color Module
//!
//! Pharmacophoric "color" features and their Gaussian overlap.
//!
//! - [`forcefield`] - Rule-based perception of donors, acceptors, ions,
//!   hydrophobes and ring centroids
//! - [`overlap`] - The default per-reference-color-atom overlap engine
//! - [`grouping`] - Unification of ragged score vectors into a masked array

pub mod forcefield;
pub mod grouping;
pub mod overlap;
