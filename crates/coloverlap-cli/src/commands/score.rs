use crate::cli::ScoreArgs;
use crate::config::{PartialOverlapConfig, RunSettings};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use coloverlap::core::io::sink::JsonSink;
use coloverlap::engine::dispatch::Dispatcher;
use coloverlap::engine::progress::ProgressReporter;
use coloverlap::workflows::color_overlaps;
use tracing::{debug, info};

pub fn run(args: ScoreArgs) -> Result<()> {
    info!("Starting overlap scoring workflow...");

    let partial = match &args.config {
        Some(path) => PartialOverlapConfig::from_file(path)?,
        None => PartialOverlapConfig::default(),
    };
    let RunSettings {
        config,
        execution,
        pretty,
    } = partial.merge_with_cli(&args)?;
    debug!("Final overlap configuration: {:?}", config);

    let dispatcher = Dispatcher::from_context(execution.as_ref())?;
    match &execution {
        Some(context) if dispatcher.is_parallel() => {
            info!(executor = %context, "Scoring batches on a worker pool.")
        }
        _ => info!("Scoring batches sequentially."),
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let sink = JsonSink { pretty };

    let report = color_overlaps::run_files(
        &args.reference,
        &args.fit,
        &args.output,
        &config,
        &dispatcher,
        &sink,
        &reporter,
    )?;

    info!(
        candidates = report.num_candidates(),
        references = report.num_references(),
        color_atoms = report.color_axis_len(),
        "Overlap scoring finished."
    );
    println!(
        "Scored {} candidates against {} references; report written to {}",
        report.num_candidates(),
        report.num_references(),
        args.output.display()
    );
    Ok(())
}
