//! # Engine Module
//!
//! Orchestration of a scoring run: batches of candidates are dispatched to
//! the alignment-score worker, and the per-reference results are folded and
//! reduced into one masked report.
//!
//! - **Configuration** ([`config`]) - Run parameters and execution-context identifiers
//! - **Dispatch** ([`dispatch`]) - Ordered sequential or worker-pool batch mapping
//! - **Tasks** ([`tasks`]) - The per-batch alignment-score worker
//! - **Reduction** ([`reducer`]) - Per-reference folding, transpose and grouping
//! - **State** ([`state`]) - Batch and per-reference results
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - The run's error taxonomy

pub mod config;
pub mod dispatch;
pub mod error;
pub mod progress;
pub mod reducer;
pub mod state;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;
