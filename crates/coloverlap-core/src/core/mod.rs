//! # Core Module
//!
//! Stateless building blocks for color-overlap scoring.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, molecules, conformers,
//!   color atoms and the final report
//! - **File I/O** ([`io`]) - Lazy SDF reading, candidate batching and result sinks
//! - **Engine Seams** ([`scoring`]) - The alignment and overlap engine traits
//! - **Shape** ([`shape`]) - Gaussian volumes and the default rigid aligner
//! - **Color** ([`color`]) - Feature perception, color overlap and masked grouping
//! - **Utilities** ([`utils`]) - Geometry helpers and the comparison tolerance

pub mod color;
pub mod io;
pub mod models;
pub mod scoring;
pub mod shape;
pub mod utils;
