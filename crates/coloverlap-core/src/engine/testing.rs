//! Scripted engines for exercising the pipeline without real chemistry.

use crate::core::models::alignment::AlignmentResult;
use crate::core::models::atom::{Atom, Element};
use crate::core::models::color::{ColorAtom, ColorAtomMetadata, ColorAtomOverlaps, ColorType};
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::scoring::{AlignmentEngine, OverlapEngine, ScoringError};
use nalgebra::Point3;

/// A molecule whose `i`-th atom sits at `(values[i], i, 0)`.
pub fn molecule(title: &str, values: &[f64]) -> Molecule {
    let atoms = values.iter().map(|_| Atom::new(Element::C)).collect();
    let coords = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Point3::new(v, i as f64, 0.0))
        .collect();
    Molecule::new(title, atoms, vec![]).with_conformers(vec![Conformer::new(coords)])
}

/// Leaves every candidate where it is.
pub struct IdentityAligner;

impl AlignmentEngine for IdentityAligner {
    type Options = ();

    fn with_options(_: &()) -> Result<Self, ScoringError> {
        Ok(Self)
    }

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError> {
        if reference.num_conformers() == 0 {
            return Err(ScoringError::NoConformers(reference.title.clone()));
        }
        Ok(())
    }

    fn best_overlay(&self, fit: &Molecule) -> Result<AlignmentResult, ScoringError> {
        if fit.title == "unalignable" {
            return Err(ScoringError::Engine("cannot align".to_string()));
        }
        Ok(AlignmentResult::identity(0, 0))
    }

    fn aligned_conformers(
        &self,
        reference: &Molecule,
        fit: &Molecule,
        result: &AlignmentResult,
    ) -> Result<(Molecule, Molecule), ScoringError> {
        let missing = |m: &Molecule| ScoringError::NoConformers(m.title.clone());
        Ok((
            reference
                .single_conformer(result.ref_conformer)
                .ok_or_else(|| missing(reference))?,
            fit.single_conformer(result.fit_conformer)
                .ok_or_else(|| missing(fit))?,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedOptions {
    /// Candidates with this title report a shifted first reference color atom.
    pub perturb_for: Option<String>,
    /// Candidates with this title report one score too few.
    pub truncate_for: Option<String>,
}

/// Every reference atom is a donor color atom; the score against reference
/// color atom `j` is the x coordinate of the candidate's atom `j`.
pub struct ScriptedOverlap {
    options: ScriptedOptions,
    reference: Option<ColorAtomMetadata>,
}

impl OverlapEngine for ScriptedOverlap {
    type Options = ScriptedOptions;

    fn with_options(options: &ScriptedOptions) -> Result<Self, ScoringError> {
        Ok(Self {
            options: options.clone(),
            reference: None,
        })
    }

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError> {
        let conformer = reference
            .conformer(0)
            .ok_or_else(|| ScoringError::NoConformers(reference.title.clone()))?;
        let atoms: Vec<ColorAtom> = conformer
            .coords
            .iter()
            .map(|p| ColorAtom::new(ColorType::Donor, *p))
            .collect();
        self.reference = Some(ColorAtomMetadata::from_atoms(&atoms));
        Ok(())
    }

    fn ref_color_atom_overlaps(&self, fit: &Molecule) -> Result<ColorAtomOverlaps, ScoringError> {
        let mut metadata = self.reference.clone().ok_or(ScoringError::ReferenceNotSet)?;
        let coords = &fit
            .conformer(0)
            .ok_or_else(|| ScoringError::NoConformers(fit.title.clone()))?
            .coords;
        let mut overlaps: Vec<f64> = (0..metadata.len())
            .map(|j| coords.get(j).map_or(0.0, |p| p.x))
            .collect();

        if self.options.perturb_for.as_deref() == Some(fit.title.as_str()) {
            if let Some(first) = metadata.coords.first_mut() {
                first[0] += 0.5;
            }
        }
        if self.options.truncate_for.as_deref() == Some(fit.title.as_str()) {
            overlaps.pop();
        }
        Ok(ColorAtomOverlaps {
            overlaps,
            ref_color_atoms: metadata,
        })
    }
}
