//! # Workflows Module
//!
//! End-to-end entry points that tie the readers, engines, dispatcher and
//! reducer together.
//!
//! - **Color Overlaps** ([`color_overlaps`]) - Per-reference-color-atom overlap
//!   scoring of candidate molecules against a set of references

pub mod color_overlaps;
