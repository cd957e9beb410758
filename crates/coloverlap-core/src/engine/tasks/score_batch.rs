use crate::core::models::color::{ColorAtomMetadata, MetadataMismatch};
use crate::core::models::molecule::Molecule;
use crate::core::scoring::{AlignmentEngine, OverlapEngine, ScoringError};
use crate::core::utils::geometry::GeometryTolerance;
use crate::engine::error::EngineError;
use crate::engine::state::BatchResult;
use tracing::{debug, instrument};

/// Aligns every candidate of `batch` onto `reference` and scores its overlap
/// with each reference color atom.
///
/// Engines are built fresh for this call from the given options. The
/// reference color atoms reported for the first candidate become the batch's
/// metadata and every later candidate must reproduce them under `tolerance`.
#[instrument(skip_all, name = "score_batch_task", fields(reference = %reference.title, candidates = batch.len()))]
pub fn run<A, O>(
    batch: &[Molecule],
    reference: &Molecule,
    alignment_options: &A::Options,
    overlap_options: &O::Options,
    tolerance: &GeometryTolerance,
) -> Result<BatchResult, EngineError>
where
    A: AlignmentEngine,
    O: OverlapEngine,
{
    if batch.is_empty() {
        return Ok(BatchResult::empty());
    }

    let mut aligner =
        A::with_options(alignment_options).map_err(EngineError::scoring("alignment engine setup"))?;
    aligner.set_reference(reference).map_err(EngineError::scoring(format!(
        "reference '{}'",
        reference.title
    )))?;
    let mut overlap_engine =
        O::with_options(overlap_options).map_err(EngineError::scoring("overlap engine setup"))?;

    let mut result = BatchResult {
        overlaps: Vec::with_capacity(batch.len()),
        ref_color_atoms: None,
        fit_titles: Vec::with_capacity(batch.len()),
    };

    for fit in batch {
        let context = || format!("candidate '{}' against reference '{}'", fit.title, reference.title);
        let fail = |source: ScoringError| EngineError::Scoring {
            context: context(),
            source,
        };

        let alignment = aligner.best_overlay(fit).map_err(fail)?;
        let (ref_conf, fit_conf) = aligner
            .aligned_conformers(reference, fit, &alignment)
            .map_err(fail)?;
        overlap_engine.set_reference(&ref_conf).map_err(fail)?;
        let scored = overlap_engine
            .ref_color_atom_overlaps(&fit_conf)
            .map_err(fail)?;

        if scored.overlaps.len() != scored.ref_color_atoms.len() {
            return Err(EngineError::Shape(format!(
                "{} produced {} scores for {} reference color atoms",
                context(),
                scored.overlaps.len(),
                scored.ref_color_atoms.len()
            )));
        }
        check_or_capture(&mut result.ref_color_atoms, scored.ref_color_atoms, tolerance)
            .map_err(|source| EngineError::Consistency {
                reference: reference.title.clone(),
                context: format!("candidate '{}'", fit.title),
                source,
            })?;

        debug!(
            fit = %fit.title,
            fit_conformer = alignment.fit_conformer,
            shape_tanimoto = alignment.shape_tanimoto,
            "Scored candidate."
        );
        result.overlaps.push(scored.overlaps);
        result.fit_titles.push(fit.title.clone());
    }

    Ok(result)
}

fn check_or_capture(
    captured: &mut Option<ColorAtomMetadata>,
    observed: ColorAtomMetadata,
    tolerance: &GeometryTolerance,
) -> Result<(), MetadataMismatch> {
    match captured {
        Some(expected) => expected.check_consistent(&observed, tolerance),
        None => {
            *captured = Some(observed);
            Ok(())
        }
    }
}
