use nalgebra::Isometry3;

/// Best rigid overlay of a candidate onto a reference.
///
/// `transform` maps the candidate conformer `fit_conformer` into the frame of
/// the reference conformer `ref_conformer`, which itself is never moved.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub ref_conformer: usize,
    pub fit_conformer: usize,
    pub transform: Isometry3<f64>,
    /// Gaussian volume shared by the two overlaid shapes.
    pub shape_overlap: f64,
    pub shape_tanimoto: f64,
}

impl AlignmentResult {
    pub fn identity(ref_conformer: usize, fit_conformer: usize) -> Self {
        Self {
            ref_conformer,
            fit_conformer,
            transform: Isometry3::identity(),
            shape_overlap: 0.0,
            shape_tanimoto: 0.0,
        }
    }
}
