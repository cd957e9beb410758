use crate::core::color::overlap::ColorOverlap;
use crate::core::io::error::MolIoError;
use crate::core::io::reader::MolReader;
use crate::core::io::sink::ResultSink;
use crate::core::io::traits::BatchSource;
use crate::core::models::molecule::Molecule;
use crate::core::models::report::OverlapReport;
use crate::core::scoring::{AlignmentEngine, OverlapEngine};
use crate::core::shape::alignment::ShapeAligner;
use crate::engine::config::OverlapConfig;
use crate::engine::dispatch::{BatchExecutor, Dispatcher};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reducer::{self, ReferenceAccumulator};
use crate::engine::state::ReferenceResult;
use crate::engine::tasks::score_batch;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Scores every candidate of `candidates` against every reference, one
/// reference at a time, and reduces the results into a masked report.
///
/// For each reference the candidate source is reopened and its batches are
/// mapped through `dispatcher`. Any failure ends the run; no report is
/// produced from a partial run.
#[instrument(skip_all, name = "color_overlaps_workflow")]
pub fn run<A, O, R, S>(
    references: R,
    candidates: &S,
    config: &OverlapConfig<A::Options, O::Options>,
    dispatcher: &Dispatcher,
    reporter: &ProgressReporter,
) -> Result<OverlapReport, EngineError>
where
    A: AlignmentEngine,
    O: OverlapEngine,
    R: IntoIterator<Item = Result<Molecule, MolIoError>>,
    S: BatchSource,
{
    reporter.report(Progress::PhaseStart {
        name: "Scoring References",
    });
    info!(
        batch_size = config.batch_size,
        parallel = dispatcher.is_parallel(),
        "Starting color overlap scoring."
    );

    let mut results: Vec<ReferenceResult> = Vec::new();
    for (index, reference) in references.into_iter().enumerate() {
        let reference = reference?;
        reporter.report(Progress::ReferenceStart {
            index,
            title: reference.title.clone(),
        });

        let result = score_reference::<A, O, S>(&reference, candidates, config, dispatcher, reporter)?;
        info!(
            reference = %result.title,
            candidates = result.num_candidates(),
            color_atoms = result.ref_color_atoms.len(),
            "Reference scored."
        );
        if result.ref_color_atoms.is_empty() && result.num_candidates() > 0 {
            warn!(reference = %result.title, "Reference has no color atoms; its column will be fully masked.");
            reporter.report(Progress::Message(format!(
                "Reference '{}' has no color atoms; its scores are fully masked.",
                result.title
            )));
        }

        reporter.report(Progress::ReferenceFinish {
            index,
            candidates: result.num_candidates(),
        });
        results.push(result);
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Reduction" });
    let report = reducer::reduce(results, config.fill_value)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        references = report.num_references(),
        candidates = report.num_candidates(),
        color_axis = report.color_axis_len(),
        "Color overlap scoring finished."
    );
    Ok(report)
}

fn score_reference<A, O, S>(
    reference: &Molecule,
    candidates: &S,
    config: &OverlapConfig<A::Options, O::Options>,
    dispatcher: &Dispatcher,
    reporter: &ProgressReporter,
) -> Result<ReferenceResult, EngineError>
where
    A: AlignmentEngine,
    O: OverlapEngine,
    S: BatchSource,
{
    let batches = candidates.open_batches(config.batch_size)?;
    let batch_results = dispatcher.map(
        |batch: Vec<Molecule>| {
            let result = score_batch::run::<A, O>(
                &batch,
                reference,
                &config.alignment,
                &config.color,
                &config.tolerance,
            )?;
            reporter.report(Progress::CandidatesScored {
                count: result.len() as u64,
            });
            Ok(result)
        },
        batches,
    )?;

    let mut accumulator = ReferenceAccumulator::new(reference.title.clone(), config.tolerance);
    for batch in batch_results {
        accumulator.push(batch)?;
    }
    Ok(accumulator.finish())
}

/// Reads references and candidates from SD files, scores them with the
/// default shape and color engines, and writes the report through `sink`.
///
/// The output file is only created once the whole run has succeeded.
#[instrument(skip_all, name = "color_overlaps_files", fields(refs = %ref_path.display(), fits = %fit_path.display()))]
pub fn run_files(
    ref_path: &Path,
    fit_path: &Path,
    out_path: &Path,
    config: &OverlapConfig,
    dispatcher: &Dispatcher,
    sink: &dyn ResultSink,
    reporter: &ProgressReporter,
) -> Result<OverlapReport, EngineError> {
    let references = MolReader::open(ref_path)?.with_conformer_merging(config.merge_conformers);
    let candidates = MolReader::open(fit_path)?.with_conformer_merging(config.merge_conformers);
    debug!(
        references = %references.path().display(),
        candidates = %candidates.path().display(),
        merge_conformers = config.merge_conformers,
        "Opened molecule files."
    );

    let report = run::<ShapeAligner, ColorOverlap, _, _>(
        references.mols()?,
        &candidates,
        config,
        dispatcher,
        reporter,
    )?;

    reporter.report(Progress::PhaseStart { name: "Writing" });
    sink.write(&report, out_path)?;
    reporter.report(Progress::PhaseFinish);
    info!(path = %out_path.display(), "Wrote overlap report.");
    Ok(report)
}
