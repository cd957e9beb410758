//! Units of work mapped over candidate batches by the dispatcher.

pub mod score_batch;
