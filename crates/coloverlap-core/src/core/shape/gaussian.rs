use crate::core::models::molecule::{Conformer, Molecule};
use nalgebra::{Isometry3, Point3};
use std::f64::consts::PI;

/// Height of each atomic Gaussian (Grant & Pickup).
pub const GAUSSIAN_AMPLITUDE: f64 = 2.7;

/// Pairs whose exponent exceeds this contribute less than `exp(-25)` of the
/// pair's peak and are skipped.
const EXPONENT_CUTOFF: f64 = 25.0;

/// Gaussian decay constant that gives an atom of vdW radius `radius` the
/// volume of its hard sphere.
#[inline]
pub fn gaussian_alpha(radius: f64) -> f64 {
    let volume_ratio = 3.0 * GAUSSIAN_AMPLITUDE / (4.0 * PI * radius.powi(3));
    PI * volume_ratio.powf(2.0 / 3.0)
}

/// Overlap volume of two atomic Gaussians whose centers are `dist_sq` apart.
#[inline]
pub fn pair_overlap(alpha_a: f64, alpha_b: f64, dist_sq: f64) -> f64 {
    let sum = alpha_a + alpha_b;
    let exponent = alpha_a * alpha_b / sum * dist_sq;
    if exponent > EXPONENT_CUTOFF {
        return 0.0;
    }
    GAUSSIAN_AMPLITUDE * GAUSSIAN_AMPLITUDE * (PI / sum).powf(1.5) * (-exponent).exp()
}

/// First-order Gaussian volume model of one conformer.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianShape {
    centers: Vec<Point3<f64>>,
    alphas: Vec<f64>,
}

impl GaussianShape {
    /// Builds the shape of `conformer` from its heavy atoms, or from every
    /// atom when `use_hydrogens` is set or the molecule has no heavy atoms.
    ///
    /// Returns `None` when no atom is left to describe the shape.
    pub fn from_conformer(
        molecule: &Molecule,
        conformer: &Conformer,
        use_hydrogens: bool,
    ) -> Option<Self> {
        let heavy_only =
            !use_hydrogens && molecule.atoms().iter().any(|a| !a.element.is_hydrogen());

        let (centers, alphas): (Vec<_>, Vec<_>) = molecule
            .atoms()
            .iter()
            .zip(&conformer.coords)
            .filter(|(atom, _)| !heavy_only || !atom.element.is_hydrogen())
            .map(|(atom, p)| (*p, gaussian_alpha(atom.element.vdw_radius())))
            .unzip();

        if centers.is_empty() {
            None
        } else {
            Some(Self { centers, alphas })
        }
    }

    pub fn centers(&self) -> &[Point3<f64>] {
        &self.centers
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn self_overlap(&self) -> f64 {
        Self::overlap_points(&self.centers, &self.alphas, &self.centers, &self.alphas)
    }

    /// Overlap with `other` after moving `other` by `transform`.
    pub fn overlap(&self, other: &GaussianShape, transform: &Isometry3<f64>) -> f64 {
        let moved: Vec<Point3<f64>> = other.centers.iter().map(|p| transform * p).collect();
        Self::overlap_points(&self.centers, &self.alphas, &moved, &other.alphas)
    }

    fn overlap_points(
        centers_a: &[Point3<f64>],
        alphas_a: &[f64],
        centers_b: &[Point3<f64>],
        alphas_b: &[f64],
    ) -> f64 {
        let mut total = 0.0;
        for (pa, &aa) in centers_a.iter().zip(alphas_a) {
            for (pb, &ab) in centers_b.iter().zip(alphas_b) {
                total += pair_overlap(aa, ab, (pa - pb).norm_squared());
            }
        }
        total
    }
}

/// Shape Tanimoto `O_AB / (O_AA + O_BB - O_AB)`; zero for degenerate input.
#[inline]
pub fn shape_tanimoto(overlap: f64, self_a: f64, self_b: f64) -> f64 {
    let union = self_a + self_b - overlap;
    if union <= 0.0 { 0.0 } else { overlap / union }
}
