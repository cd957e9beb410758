//! # coloverlap Core Library
//!
//! Per-reference-color-atom overlap scoring of candidate molecules against a
//! set of reference molecules.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless models (`Molecule`, `ColorAtom`,
//!   `OverlapReport`), the SDF reader and batching, the alignment and overlap
//!   engine traits with their default Gaussian implementations, and the
//!   masked grouping routine.
//!
//! - **[`engine`]: The Logic Core.** Dispatches candidate batches to the
//!   alignment-score worker, either sequentially or over a worker pool, and
//!   reduces ragged per-reference results into one rectangular masked table
//!   while enforcing that reference color atoms never change mid-run.
//!
//! - **[`workflows`]: The Public API.** Runs a complete scoring job, from
//!   reading molecules to persisting the report.

pub mod core;
pub mod engine;
pub mod workflows;
