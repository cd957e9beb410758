//! Reading candidate and reference molecules, and persisting results.
//!
//! - [`sdf`] - Lazy V2000 SD file record parser
//! - [`reader`] - Restartable molecule and batch streams over SD files
//! - [`traits`] - The [`traits::BatchSource`] seam consumed by the workflow
//! - [`sink`] - Result persistence

pub mod error;
pub mod reader;
pub mod sdf;
pub mod sink;
pub mod traits;
