use clap::{Args, Parser};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "coloverlap - Scores the overlap of aligned candidate molecules with each color atom of a set of reference molecules.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(flatten)]
    pub score: ScoreArgs,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Arguments of a scoring run.
#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// SD file with the reference molecules.
    #[arg(short = 'r', long = "ref", required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// SD file with the candidate (fit) molecules.
    #[arg(short = 'f', long = "fit", required = true, value_name = "PATH")]
    pub fit: PathBuf,

    /// Path for the JSON overlap report.
    #[arg(short = 'o', long = "out", required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Execution context: a worker count, 'auto', or a pool name from the
    /// config file. Without it, batches run sequentially.
    #[arg(short = 'e', long = "executor", alias = "cluster-id", value_name = "ID")]
    pub executor: Option<String>,

    /// Number of candidates per batch [default: 1000].
    #[arg(short = 'b', long, value_name = "INT")]
    pub batch_size: Option<usize>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S color.color-radius=1.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn required_paths_and_optional_executor_are_parsed() {
        let cli = Cli::try_parse_from([
            "coloverlap", "-r", "refs.sdf", "-f", "fits.sdf", "-o", "out.json", "--executor", "4",
        ])
        .unwrap();
        assert_eq!(cli.score.reference, PathBuf::from("refs.sdf"));
        assert_eq!(cli.score.executor.as_deref(), Some("4"));
        assert_eq!(cli.score.batch_size, None);
        assert!(cli.score.set_values.is_empty());
    }

    #[test]
    fn cluster_id_is_accepted_as_executor() {
        let cli = Cli::try_parse_from([
            "coloverlap", "--ref", "refs.sdf", "--fit", "fits.sdf", "--out", "out.json",
            "--cluster-id", "workers",
        ])
        .unwrap();
        assert_eq!(cli.score.executor.as_deref(), Some("workers"));
    }

    #[test]
    fn missing_output_is_rejected() {
        assert!(Cli::try_parse_from(["coloverlap", "-r", "a.sdf", "-f", "b.sdf"]).is_err());
    }
}
