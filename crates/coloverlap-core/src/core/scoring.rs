use crate::core::models::alignment::AlignmentResult;
use crate::core::models::color::ColorAtomOverlaps;
use crate::core::models::molecule::Molecule;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Molecule '{0}' has no conformers")]
    NoConformers(String),
    #[error("Molecule '{0}' has no atoms contributing to its shape")]
    EmptyShape(String),
    #[error("No reference has been set on the engine")]
    ReferenceNotSet,
    #[error("Conformer {index} of '{title}' is not usable: {reason}")]
    InvalidConformer {
        title: String,
        index: usize,
        reason: String,
    },
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },
    #[error("{0}")]
    Engine(String),
}

/// Rigid-body alignment of candidates onto one reference.
///
/// An engine is built from its options, given a reference once, and then
/// queried for any number of candidates. Implementations must not keep
/// per-candidate state between calls.
pub trait AlignmentEngine: Sized {
    type Options: Clone + Send + Sync;

    fn with_options(options: &Self::Options) -> Result<Self, ScoringError>;

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError>;

    fn best_overlay(&self, fit: &Molecule) -> Result<AlignmentResult, ScoringError>;

    /// The reference and candidate conformers selected by `result`, with the
    /// candidate moved into the reference frame. Each returned molecule
    /// carries exactly one conformer.
    fn aligned_conformers(
        &self,
        reference: &Molecule,
        fit: &Molecule,
        result: &AlignmentResult,
    ) -> Result<(Molecule, Molecule), ScoringError>;
}

/// Per-color-atom overlap between a reference conformer and aligned
/// candidate conformers.
pub trait OverlapEngine: Sized {
    type Options: Clone + Send + Sync;

    fn with_options(options: &Self::Options) -> Result<Self, ScoringError>;

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError>;

    /// One score per reference color atom, in the order of the returned
    /// metadata.
    fn ref_color_atom_overlaps(&self, fit: &Molecule) -> Result<ColorAtomOverlaps, ScoringError>;
}
