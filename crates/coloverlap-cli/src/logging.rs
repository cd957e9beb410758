use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

/// Maps `-q` and the `-v` count to the most verbose level that is emitted.
fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: compact events on stderr and, with
/// `log_file`, a plain-text copy that names the emitting thread so pool
/// workers (`<context>-worker-<n>`) can be told apart.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file = log_file
        .map(|path| File::create(&path).map_err(CliError::Io))
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_thread_names(true)
                .with_target(true)
        });

    tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(console)
        .with(file)
        .init();

    Ok(())
}
