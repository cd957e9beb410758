//! Numeric helpers shared by the shape and color engines.

pub mod geometry;
