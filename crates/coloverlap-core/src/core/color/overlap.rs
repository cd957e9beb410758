use super::forcefield::perceive_color_atoms;
use crate::core::models::color::{ColorAtom, ColorAtomMetadata, ColorAtomOverlaps, ColorType};
use crate::core::models::molecule::Molecule;
use crate::core::scoring::{OverlapEngine, ScoringError};
use crate::core::shape::gaussian::gaussian_alpha;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ColorOptions {
    /// Radius of every color Gaussian, in Angstroms.
    pub color_radius: f64,
    pub color_weight: f64,
    /// Restricts perception to these types; `None` keeps all six.
    pub enabled_types: Option<Vec<ColorType>>,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            color_radius: 1.0,
            color_weight: 1.0,
            enabled_types: None,
        }
    }
}

impl ColorOptions {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !(self.color_radius.is_finite() && self.color_radius > 0.0) {
            return Err(ScoringError::InvalidOption {
                name: "color-radius",
                reason: format!("must be a positive number, got {}", self.color_radius),
            });
        }
        if !self.color_weight.is_finite() {
            return Err(ScoringError::InvalidOption {
                name: "color-weight",
                reason: format!("must be finite, got {}", self.color_weight),
            });
        }
        Ok(())
    }

    fn is_enabled(&self, color_type: ColorType) -> bool {
        self.enabled_types
            .as_ref()
            .is_none_or(|types| types.contains(&color_type))
    }
}

/// Overlap volume of two equal color Gaussians `dist_sq` apart.
#[inline]
pub fn color_pair_overlap(alpha: f64, weight: f64, dist_sq: f64) -> f64 {
    weight * weight * (PI / (2.0 * alpha)).powf(1.5) * (-alpha * dist_sq / 2.0).exp()
}

/// Gaussian color overlap against each reference color atom.
///
/// The score of a reference color atom is the summed overlap with every
/// candidate color atom of the same type. Both molecules contribute their
/// first conformer.
pub struct ColorOverlap {
    options: ColorOptions,
    alpha: f64,
    reference: Option<(Vec<ColorAtom>, ColorAtomMetadata)>,
}

impl ColorOverlap {
    fn color_atoms(&self, molecule: &Molecule) -> Result<Vec<ColorAtom>, ScoringError> {
        let conformer = molecule
            .conformer(0)
            .ok_or_else(|| ScoringError::NoConformers(molecule.title.clone()))?;
        if conformer.coords.len() != molecule.num_atoms() {
            return Err(ScoringError::InvalidConformer {
                title: molecule.title.clone(),
                index: 0,
                reason: format!(
                    "{} coordinates for {} atoms",
                    conformer.coords.len(),
                    molecule.num_atoms()
                ),
            });
        }
        Ok(perceive_color_atoms(molecule, conformer)
            .into_iter()
            .filter(|c| self.options.is_enabled(c.color_type))
            .collect())
    }
}

impl OverlapEngine for ColorOverlap {
    type Options = ColorOptions;

    fn with_options(options: &ColorOptions) -> Result<Self, ScoringError> {
        options.validate()?;
        Ok(Self {
            alpha: gaussian_alpha(options.color_radius),
            options: options.clone(),
            reference: None,
        })
    }

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError> {
        let atoms = self.color_atoms(reference)?;
        let metadata = ColorAtomMetadata::from_atoms(&atoms);
        self.reference = Some((atoms, metadata));
        Ok(())
    }

    fn ref_color_atom_overlaps(&self, fit: &Molecule) -> Result<ColorAtomOverlaps, ScoringError> {
        let (ref_atoms, metadata) = self.reference.as_ref().ok_or(ScoringError::ReferenceNotSet)?;
        let fit_atoms = self.color_atoms(fit)?;

        let overlaps: Vec<f64> = ref_atoms
            .iter()
            .map(|r| {
                fit_atoms
                    .iter()
                    .filter(|f| f.color_type == r.color_type)
                    .map(|f| {
                        color_pair_overlap(
                            self.alpha,
                            self.options.color_weight,
                            (r.position - f.position).norm_squared(),
                        )
                    })
                    .sum::<f64>()
            })
            .collect();

        Ok(ColorAtomOverlaps {
            overlaps,
            ref_color_atoms: metadata.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, Element};
    use crate::core::models::molecule::{Bond, BondOrder, Conformer};
    use nalgebra::Point3;

    fn ethanol(offset: f64) -> Molecule {
        Molecule::new(
            "ethanol",
            vec![
                Atom::new(Element::C),
                Atom::new(Element::C),
                Atom::new(Element::O),
            ],
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(1, 2, BondOrder::Single),
            ],
        )
        .with_conformers(vec![Conformer::new(vec![
            Point3::new(offset, 0.0, 0.0),
            Point3::new(offset + 1.5, 0.0, 0.0),
            Point3::new(offset + 2.2, 1.2, 0.0),
        ])])
    }

    fn engine(options: ColorOptions) -> ColorOverlap {
        ColorOverlap::with_options(&options).unwrap()
    }

    #[test]
    fn identical_pose_scores_the_same_type_peak() {
        let mut overlap = engine(ColorOptions::default());
        overlap.set_reference(&ethanol(0.0)).unwrap();
        let result = overlap.ref_color_atom_overlaps(&ethanol(0.0)).unwrap();

        assert_eq!(
            result.ref_color_atoms.type_names,
            vec!["hydrophobe", "donor", "acceptor"]
        );
        assert_eq!(result.ref_color_atoms.types, vec![6, 1, 2]);
        let alpha = gaussian_alpha(1.0);
        let peak = color_pair_overlap(alpha, 1.0, 0.0);
        for score in &result.overlaps {
            assert!((score - peak).abs() < 1e-12);
        }
    }

    #[test]
    fn scores_fall_off_with_displacement() {
        let mut overlap = engine(ColorOptions::default());
        overlap.set_reference(&ethanol(0.0)).unwrap();
        let near = overlap.ref_color_atom_overlaps(&ethanol(0.2)).unwrap();
        let far = overlap.ref_color_atom_overlaps(&ethanol(3.0)).unwrap();
        for (n, f) in near.overlaps.iter().zip(&far.overlaps) {
            assert!(n > f);
        }
        assert_eq!(near.ref_color_atoms, far.ref_color_atoms);
    }

    #[test]
    fn enabled_types_filter_reference_color_atoms() {
        let mut overlap = engine(ColorOptions {
            enabled_types: Some(vec![ColorType::Hydrophobe]),
            ..ColorOptions::default()
        });
        overlap.set_reference(&ethanol(0.0)).unwrap();
        let result = overlap.ref_color_atom_overlaps(&ethanol(0.0)).unwrap();
        assert_eq!(result.overlaps.len(), 1);
        assert_eq!(result.ref_color_atoms.coords, vec![[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn reference_must_be_set_first() {
        let overlap = engine(ColorOptions::default());
        assert_eq!(
            overlap.ref_color_atom_overlaps(&ethanol(0.0)).unwrap_err(),
            ScoringError::ReferenceNotSet
        );
    }

    #[test]
    fn options_deserialize_from_kebab_case() {
        let options: ColorOptions =
            serde_json::from_str(r#"{"color-radius": 1.5, "enabled-types": ["donor", "rings"]}"#)
                .unwrap();
        assert_eq!(options.color_radius, 1.5);
        assert_eq!(options.color_weight, 1.0);
        assert_eq!(
            options.enabled_types,
            Some(vec![ColorType::Donor, ColorType::Ring])
        );
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let options = ColorOptions {
            color_radius: -1.0,
            ..ColorOptions::default()
        };
        assert!(matches!(
            ColorOverlap::with_options(&options),
            Err(ScoringError::InvalidOption { name: "color-radius", .. })
        ));
    }
}
