use crate::core::color::grouping::group_ref_color_atom_overlaps;
use crate::core::models::color::ColorAtomMetadata;
use crate::core::models::report::OverlapReport;
use crate::core::utils::geometry::GeometryTolerance;
use crate::engine::error::EngineError;
use crate::engine::state::{BatchResult, ReferenceResult};
use ndarray::Array2;
use tracing::{debug, instrument};

/// Folds the batch results of one reference, in batch order.
pub struct ReferenceAccumulator {
    title: String,
    tolerance: GeometryTolerance,
    overlaps: Vec<Vec<f64>>,
    fit_titles: Vec<String>,
    metadata: Option<ColorAtomMetadata>,
    batches: usize,
}

impl ReferenceAccumulator {
    pub fn new(title: impl Into<String>, tolerance: GeometryTolerance) -> Self {
        Self {
            title: title.into(),
            tolerance,
            overlaps: Vec::new(),
            fit_titles: Vec::new(),
            metadata: None,
            batches: 0,
        }
    }

    /// Appends one batch. The first batch carrying metadata fixes the
    /// reference's color atoms; later batches must agree with it.
    pub fn push(&mut self, batch: BatchResult) -> Result<(), EngineError> {
        let index = self.batches;
        self.batches += 1;

        if batch.overlaps.len() != batch.fit_titles.len() {
            return Err(EngineError::Shape(format!(
                "batch {} of reference '{}' has {} score vectors for {} candidates",
                index,
                self.title,
                batch.overlaps.len(),
                batch.fit_titles.len()
            )));
        }

        if let Some(observed) = batch.ref_color_atoms {
            if let Some(expected) = &self.metadata {
                expected
                    .check_consistent(&observed, &self.tolerance)
                    .map_err(|source| EngineError::Consistency {
                        reference: self.title.clone(),
                        context: format!("batch {}", index),
                        source,
                    })?;
            } else {
                self.metadata = Some(observed);
            }
        }

        self.overlaps.extend(batch.overlaps);
        self.fit_titles.extend(batch.fit_titles);
        Ok(())
    }

    pub fn finish(self) -> ReferenceResult {
        ReferenceResult {
            title: self.title,
            overlaps: self.overlaps,
            ref_color_atoms: self.metadata.unwrap_or_default(),
            fit_titles: self.fit_titles,
        }
    }
}

/// Builds the candidate-major masked report from per-reference results.
///
/// Every reference must have seen the same number of candidates and every
/// score vector must be as long as its reference's color-atom list.
#[instrument(skip_all, name = "reduce_results", fields(references = references.len()))]
pub fn reduce(references: Vec<ReferenceResult>, fill_value: f64) -> Result<OverlapReport, EngineError> {
    let Some(first) = references.first() else {
        return Err(EngineError::EmptyReferenceSet);
    };
    let n_fit = first.num_candidates();
    if let Some(odd) = references.iter().find(|r| r.num_candidates() != n_fit) {
        return Err(EngineError::Shape(format!(
            "reference '{}' saw {} candidates but reference '{}' saw {}",
            first.title,
            n_fit,
            odd.title,
            odd.num_candidates()
        )));
    }
    let n_ref = references.len();
    let fit_titles = first.fit_titles.clone();

    let mut ref_titles = Vec::with_capacity(n_ref);
    let mut ref_color_coords = Vec::with_capacity(n_ref);
    let mut ref_color_types = Vec::with_capacity(n_ref);
    let mut ref_color_type_names = Vec::with_capacity(n_ref);
    let mut cells = Vec::with_capacity(n_ref * n_fit);
    for reference in references {
        ref_titles.push(reference.title);
        ref_color_coords.push(reference.ref_color_atoms.coords);
        ref_color_types.push(reference.ref_color_atoms.types);
        ref_color_type_names.push(reference.ref_color_atoms.type_names);
        cells.extend(reference.overlaps);
    }

    let by_reference = Array2::from_shape_vec((n_ref, n_fit), cells)
        .map_err(|e| EngineError::Shape(e.to_string()))?;
    let by_candidate = by_reference.reversed_axes();

    for ((i, j), cell) in by_candidate.indexed_iter() {
        let expected = ref_color_types[j].len();
        if cell.len() != expected {
            return Err(EngineError::Shape(format!(
                "candidate {} has {} scores against reference '{}', which has {} color atoms",
                i,
                cell.len(),
                ref_titles[j],
                expected
            )));
        }
    }

    let grouped = group_ref_color_atom_overlaps(&by_candidate, fill_value);
    debug!(shape = ?grouped.shape(), "Grouped color atom overlaps.");

    Ok(OverlapReport {
        color_atom_overlaps: grouped.data,
        mask: grouped.mask,
        ref_color_coords,
        ref_color_types,
        ref_color_type_names,
        ref_titles,
        fit_titles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::color::{ColorAtom, ColorType, MetadataMismatch};
    use nalgebra::Point3;
    use ndarray::{array, s};

    fn metadata(n: usize) -> ColorAtomMetadata {
        let atoms: Vec<ColorAtom> = (0..n)
            .map(|i| ColorAtom::new(ColorType::Acceptor, Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        ColorAtomMetadata::from_atoms(&atoms)
    }

    fn batch(scores: Vec<Vec<f64>>, meta: Option<ColorAtomMetadata>) -> BatchResult {
        BatchResult {
            fit_titles: (0..scores.len()).map(|i| format!("fit{}", i)).collect(),
            overlaps: scores,
            ref_color_atoms: meta,
        }
    }

    fn reference(title: &str, scores: Vec<Vec<f64>>, n_colors: usize) -> ReferenceResult {
        ReferenceResult {
            title: title.to_string(),
            fit_titles: (0..scores.len()).map(|i| format!("fit{}", i)).collect(),
            overlaps: scores,
            ref_color_atoms: metadata(n_colors),
        }
    }

    #[test]
    fn accumulator_flattens_batches_in_order_and_skips_empty_ones() {
        let mut acc = ReferenceAccumulator::new("ref", GeometryTolerance::default());
        acc.push(batch(vec![], None)).unwrap();
        acc.push(batch(vec![vec![1.0], vec![2.0]], Some(metadata(1)))).unwrap();
        acc.push(batch(vec![vec![3.0]], Some(metadata(1)))).unwrap();
        let result = acc.finish();
        assert_eq!(result.overlaps, vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(result.ref_color_atoms, metadata(1));
    }

    #[test]
    fn accumulator_rejects_metadata_that_changes_between_batches() {
        let mut acc = ReferenceAccumulator::new("ref", GeometryTolerance::default());
        acc.push(batch(vec![vec![1.0, 1.0]], Some(metadata(2)))).unwrap();
        let mut moved = metadata(2);
        moved.coords[1][1] = 0.25;
        let err = acc.push(batch(vec![vec![1.0, 1.0]], Some(moved))).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Consistency {
                source: MetadataMismatch::Coordinates { index: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn reference_without_candidates_has_empty_metadata() {
        let acc = ReferenceAccumulator::new("ref", GeometryTolerance::default());
        let result = acc.finish();
        assert_eq!(result.num_candidates(), 0);
        assert!(result.ref_color_atoms.is_empty());
    }

    #[test]
    fn reduce_rejects_an_empty_reference_set() {
        assert!(matches!(
            reduce(vec![], f64::NAN),
            Err(EngineError::EmptyReferenceSet)
        ));
    }

    #[test]
    fn reduce_rejects_differing_candidate_counts() {
        let a = reference("a", vec![vec![1.0]; 10], 1);
        let b = reference("b", vec![vec![1.0]; 9], 1);
        assert!(matches!(reduce(vec![a, b], f64::NAN), Err(EngineError::Shape(_))));
    }

    #[test]
    fn reduce_rejects_cells_that_disagree_with_the_color_count() {
        let a = reference("a", vec![vec![1.0, 2.0], vec![1.0]], 2);
        assert!(matches!(reduce(vec![a], f64::NAN), Err(EngineError::Shape(_))));
    }

    #[test]
    fn reduce_transposes_to_candidate_major_and_masks_short_references() {
        let a = reference("a", vec![vec![0.5, 0.7], vec![0.1, 0.9]], 2);
        let b = reference("b", vec![vec![3.0], vec![4.0]], 1);
        let report = reduce(vec![a, b], -1.0).unwrap();

        assert_eq!(report.color_atom_overlaps.dim(), (2, 2, 2));
        assert_eq!(
            report.color_atom_overlaps.slice(s![.., 0, ..]),
            array![[0.5, 0.7], [0.1, 0.9]]
        );
        assert_eq!(report.color_atom_overlaps.slice(s![1, 1, ..]), array![4.0, -1.0]);
        assert_eq!(report.mask.slice(s![.., 1, ..]), array![[false, true], [false, true]]);
        assert_eq!(report.ref_titles, vec!["a", "b"]);
        assert_eq!(report.ref_color_types, vec![vec![2, 2], vec![2]]);
        assert_eq!(report.fit_titles, vec!["fit0", "fit1"]);
        assert_eq!(report.valid_scores(1, 1), vec![4.0]);
    }

    #[test]
    fn reduce_accepts_references_without_candidates() {
        let a = reference("a", vec![], 0);
        let b = reference("b", vec![], 0);
        let report = reduce(vec![a, b], f64::NAN).unwrap();
        assert_eq!(report.color_atom_overlaps.dim(), (0, 2, 0));
        assert!(report.fit_titles.is_empty());
    }
}
