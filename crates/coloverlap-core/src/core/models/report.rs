use ndarray::{Array3, s};
use serde::Serialize;

/// The persisted bundle: scores on a (candidate, reference, color atom) grid
/// plus the per-reference color-atom identity.
///
/// `color_atom_overlaps` holds the fill value wherever `mask` is `true`.
/// The three `ref_color_*` lists are indexed by reference and are ragged:
/// entry `j` has as many elements as reference `j` has color atoms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapReport {
    pub color_atom_overlaps: Array3<f64>,
    pub mask: Array3<bool>,
    pub ref_color_coords: Vec<Vec<[f64; 3]>>,
    pub ref_color_types: Vec<Vec<i32>>,
    pub ref_color_type_names: Vec<Vec<String>>,
    pub ref_titles: Vec<String>,
    pub fit_titles: Vec<String>,
}

impl OverlapReport {
    pub fn num_candidates(&self) -> usize {
        self.color_atom_overlaps.shape()[0]
    }

    pub fn num_references(&self) -> usize {
        self.color_atom_overlaps.shape()[1]
    }

    pub fn color_axis_len(&self) -> usize {
        self.color_atom_overlaps.shape()[2]
    }

    /// Unmasked scores of candidate `fit` against reference `reference`.
    pub fn valid_scores(&self, fit: usize, reference: usize) -> Vec<f64> {
        let data = self.color_atom_overlaps.slice(s![fit, reference, ..]);
        let mask = self.mask.slice(s![fit, reference, ..]);
        data.iter()
            .zip(mask.iter())
            .filter(|(_, masked)| !**masked)
            .map(|(value, _)| *value)
            .collect()
    }
}
