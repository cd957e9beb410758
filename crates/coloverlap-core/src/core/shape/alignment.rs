use super::gaussian::{GaussianShape, shape_tanimoto};
use crate::core::models::alignment::AlignmentResult;
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::scoring::{AlignmentEngine, ScoringError};
use crate::core::utils::geometry::{axis_flips, centroid, principal_axes, rotation_from_axis_angle};
use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ShapeOptions {
    /// Include hydrogens in the Gaussian shape.
    pub use_hydrogens: bool,
    pub max_iterations: usize,
    /// Degrees.
    pub initial_rotation_step: f64,
    /// Angstroms.
    pub initial_translation_step: f64,
    /// Refinement stops once the rotation step falls below this (degrees).
    pub min_step: f64,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            use_hydrogens: false,
            max_iterations: 200,
            initial_rotation_step: 20.0,
            initial_translation_step: 1.0,
            min_step: 0.5,
        }
    }
}

impl ShapeOptions {
    pub fn validate(&self) -> Result<(), ScoringError> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ScoringError::InvalidOption {
                    name,
                    reason: format!("must be a positive number, got {}", value),
                })
            }
        };
        positive("initial-rotation-step", self.initial_rotation_step)?;
        positive("initial-translation-step", self.initial_translation_step)?;
        positive("min-step", self.min_step)
    }
}

/// Rigid pose of a fit conformer: rotate about its own centroid, then place
/// the centroid at `translation`.
#[derive(Debug, Clone, Copy)]
struct Pose {
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
}

impl Pose {
    fn isometry(&self, fit_center: &Point3<f64>) -> Isometry3<f64> {
        let shift = self.translation - self.rotation * fit_center.coords;
        Isometry3::from_parts(
            Translation3::from(shift),
            UnitQuaternion::from_rotation_matrix(&self.rotation),
        )
    }
}

struct ShapeFrame {
    shape: GaussianShape,
    self_overlap: f64,
    center: Point3<f64>,
    axes: Rotation3<f64>,
}

impl ShapeFrame {
    fn build(
        molecule: &Molecule,
        index: usize,
        conformer: &Conformer,
        use_hydrogens: bool,
    ) -> Result<Self, ScoringError> {
        if conformer.coords.len() != molecule.num_atoms() {
            return Err(ScoringError::InvalidConformer {
                title: molecule.title.clone(),
                index,
                reason: format!(
                    "{} coordinates for {} atoms",
                    conformer.coords.len(),
                    molecule.num_atoms()
                ),
            });
        }
        let shape = GaussianShape::from_conformer(molecule, conformer, use_hydrogens)
            .ok_or_else(|| ScoringError::EmptyShape(molecule.title.clone()))?;
        let center = centroid(shape.centers())
            .ok_or_else(|| ScoringError::EmptyShape(molecule.title.clone()))?;
        let axes = principal_axes(shape.centers(), &center);
        Ok(Self {
            self_overlap: shape.self_overlap(),
            shape,
            center,
            axes,
        })
    }
}

/// Shape-based rigid aligner.
///
/// Each fit conformer is started from its principal-axes superposition onto
/// the reference (four axis-sign variants) and refined by a pattern search
/// over rotations about and translations along the three Cartesian axes.
/// The reference's first conformer is always the target.
pub struct ShapeAligner {
    options: ShapeOptions,
    reference: Option<ShapeFrame>,
}

impl ShapeAligner {
    fn score(&self, reference: &ShapeFrame, fit: &ShapeFrame, pose: &Pose) -> (f64, f64) {
        let overlap = reference.shape.overlap(&fit.shape, &pose.isometry(&fit.center));
        let tanimoto = shape_tanimoto(overlap, reference.self_overlap, fit.self_overlap);
        (overlap, tanimoto)
    }

    fn refine(&self, reference: &ShapeFrame, fit: &ShapeFrame, start: Pose) -> (Pose, f64, f64) {
        let mut pose = start;
        let (mut overlap, mut tanimoto) = self.score(reference, fit, &pose);
        let mut rotation_step = self.options.initial_rotation_step;
        let mut translation_step = self.options.initial_translation_step;

        for _ in 0..self.options.max_iterations {
            if rotation_step < self.options.min_step {
                break;
            }

            let mut best_move: Option<(Pose, f64, f64)> = None;
            for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
                for sign in [1.0, -1.0] {
                    let rotated = Pose {
                        rotation: rotation_from_axis_angle(&axis, sign * rotation_step)
                            * pose.rotation,
                        translation: pose.translation,
                    };
                    let shifted = Pose {
                        rotation: pose.rotation,
                        translation: pose.translation + axis * (sign * translation_step),
                    };
                    for candidate in [rotated, shifted] {
                        let (o, t) = self.score(reference, fit, &candidate);
                        let current_best = best_move.as_ref().map_or(tanimoto, |(_, _, bt)| *bt);
                        if t > current_best {
                            best_move = Some((candidate, o, t));
                        }
                    }
                }
            }

            match best_move {
                Some((next, o, t)) => {
                    pose = next;
                    overlap = o;
                    tanimoto = t;
                }
                None => {
                    rotation_step *= 0.5;
                    translation_step *= 0.5;
                }
            }
        }
        (pose, overlap, tanimoto)
    }

    fn extract_conformer(molecule: &Molecule, index: usize) -> Result<Molecule, ScoringError> {
        molecule
            .single_conformer(index)
            .ok_or_else(|| ScoringError::InvalidConformer {
                title: molecule.title.clone(),
                index,
                reason: format!("molecule has {} conformers", molecule.num_conformers()),
            })
    }
}

impl AlignmentEngine for ShapeAligner {
    type Options = ShapeOptions;

    fn with_options(options: &ShapeOptions) -> Result<Self, ScoringError> {
        options.validate()?;
        Ok(Self {
            options: options.clone(),
            reference: None,
        })
    }

    fn set_reference(&mut self, reference: &Molecule) -> Result<(), ScoringError> {
        let conformer = reference
            .conformer(0)
            .ok_or_else(|| ScoringError::NoConformers(reference.title.clone()))?;
        self.reference = Some(ShapeFrame::build(
            reference,
            0,
            conformer,
            self.options.use_hydrogens,
        )?);
        Ok(())
    }

    fn best_overlay(&self, fit: &Molecule) -> Result<AlignmentResult, ScoringError> {
        let reference = self.reference.as_ref().ok_or(ScoringError::ReferenceNotSet)?;
        if fit.num_conformers() == 0 {
            return Err(ScoringError::NoConformers(fit.title.clone()));
        }

        let mut best: Option<AlignmentResult> = None;
        for (index, conformer) in fit.conformers().iter().enumerate() {
            let frame = ShapeFrame::build(fit, index, conformer, self.options.use_hydrogens)?;
            for flip in axis_flips() {
                let start = Pose {
                    rotation: reference.axes * flip * frame.axes.inverse(),
                    translation: reference.center.coords,
                };
                let (pose, overlap, tanimoto) = self.refine(reference, &frame, start);
                trace!(
                    fit = %fit.title,
                    conformer = index,
                    tanimoto,
                    "Refined shape overlay start."
                );
                if best.as_ref().is_none_or(|b| tanimoto > b.shape_tanimoto) {
                    best = Some(AlignmentResult {
                        ref_conformer: 0,
                        fit_conformer: index,
                        transform: pose.isometry(&frame.center),
                        shape_overlap: overlap,
                        shape_tanimoto: tanimoto,
                    });
                }
            }
        }
        best.ok_or_else(|| ScoringError::NoConformers(fit.title.clone()))
    }

    fn aligned_conformers(
        &self,
        reference: &Molecule,
        fit: &Molecule,
        result: &AlignmentResult,
    ) -> Result<(Molecule, Molecule), ScoringError> {
        let ref_conf = Self::extract_conformer(reference, result.ref_conformer)?;
        let mut fit_conf = Self::extract_conformer(fit, result.fit_conformer)?;
        fit_conf.transform(&result.transform);
        Ok((ref_conf, fit_conf))
    }
}
