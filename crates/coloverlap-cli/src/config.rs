pub mod defaults;

use crate::cli::ScoreArgs;
use crate::error::{CliError, Result};
use coloverlap::core::color::overlap::ColorOptions;
use coloverlap::core::models::color::ColorType;
use coloverlap::core::shape::alignment::ShapeOptions;
use coloverlap::core::utils::geometry::GeometryTolerance;
use coloverlap::engine::config::{ExecutionContext, OverlapConfig, OverlapConfigBuilder};
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialAlignmentConfig {
    use_hydrogens: Option<bool>,
    max_iterations: Option<usize>,
    initial_rotation_step: Option<f64>,
    initial_translation_step: Option<f64>,
    min_step: Option<f64>,
}

impl PartialAlignmentConfig {
    fn into_options(self) -> ShapeOptions {
        let d = ShapeOptions::default();
        ShapeOptions {
            use_hydrogens: self.use_hydrogens.unwrap_or(d.use_hydrogens),
            max_iterations: self.max_iterations.unwrap_or(d.max_iterations),
            initial_rotation_step: self.initial_rotation_step.unwrap_or(d.initial_rotation_step),
            initial_translation_step: self
                .initial_translation_step
                .unwrap_or(d.initial_translation_step),
            min_step: self.min_step.unwrap_or(d.min_step),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialColorConfig {
    color_radius: Option<f64>,
    color_weight: Option<f64>,
    enabled_types: Option<Vec<ColorType>>,
}

impl PartialColorConfig {
    fn into_options(self) -> ColorOptions {
        let d = ColorOptions::default();
        ColorOptions {
            color_radius: self.color_radius.unwrap_or(d.color_radius),
            color_weight: self.color_weight.unwrap_or(d.color_weight),
            enabled_types: self.enabled_types.or(d.enabled_types),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialConsistencyConfig {
    rtol: Option<f64>,
    atol: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PoolDefinition {
    workers: usize,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialExecutionConfig {
    batch_size: Option<usize>,
    executor: Option<String>,
    #[serde(default)]
    pools: BTreeMap<String, PoolDefinition>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInputConfig {
    merge_conformers: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    pretty: Option<bool>,
}

/// Configuration as read from a TOML file, every field optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialOverlapConfig {
    alignment: Option<PartialAlignmentConfig>,
    color: Option<PartialColorConfig>,
    consistency: Option<PartialConsistencyConfig>,
    execution: Option<PartialExecutionConfig>,
    input: Option<PartialInputConfig>,
    output: Option<PartialOutputConfig>,
}

/// Everything a scoring run needs after file, `--set` and flag values have
/// been merged.
#[derive(Debug)]
pub struct RunSettings {
    pub config: OverlapConfig,
    pub execution: Option<ExecutionContext>,
    pub pretty: bool,
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

impl PartialOverlapConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Command-line flags win over `--set` values, which win over the file.
    pub fn merge_with_cli(mut self, args: &ScoreArgs) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let execution = self.execution.take().unwrap_or_default();
        let consistency = self.consistency.take().unwrap_or_default();
        let default_tolerance = GeometryTolerance::default();

        let config = OverlapConfigBuilder::new()
            .alignment(self.alignment.take().unwrap_or_default().into_options())
            .color(self.color.take().unwrap_or_default().into_options())
            .batch_size(
                args.batch_size
                    .or(execution.batch_size)
                    .unwrap_or(defaults.batch_size),
            )
            .tolerance(GeometryTolerance {
                rtol: consistency.rtol.unwrap_or(default_tolerance.rtol),
                atol: consistency.atol.unwrap_or(default_tolerance.atol),
            })
            .merge_conformers(
                self.input
                    .take()
                    .and_then(|i| i.merge_conformers)
                    .unwrap_or(defaults.merge_conformers),
            )
            .build()?;

        let pools: BTreeMap<String, usize> = execution
            .pools
            .into_iter()
            .map(|(name, pool)| (name, pool.workers))
            .collect();
        let execution = args
            .executor
            .as_ref()
            .or(execution.executor.as_ref())
            .map(|id| ExecutionContext::resolve(id, &pools))
            .transpose()?;

        let pretty = self
            .output
            .and_then(|o| o.pretty)
            .unwrap_or(defaults.pretty);

        Ok(RunSettings {
            config,
            execution,
            pretty,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();

            match key {
                "alignment.use-hydrogens" => {
                    self.alignment_mut().use_hydrogens = Some(parse_value(key, value, "boolean")?);
                }
                "alignment.max-iterations" => {
                    self.alignment_mut().max_iterations = Some(parse_value(key, value, "integer")?);
                }
                "alignment.initial-rotation-step" => {
                    self.alignment_mut().initial_rotation_step =
                        Some(parse_value(key, value, "float")?);
                }
                "alignment.initial-translation-step" => {
                    self.alignment_mut().initial_translation_step =
                        Some(parse_value(key, value, "float")?);
                }
                "alignment.min-step" => {
                    self.alignment_mut().min_step = Some(parse_value(key, value, "float")?);
                }
                "color.color-radius" => {
                    self.color_mut().color_radius = Some(parse_value(key, value, "float")?);
                }
                "color.color-weight" => {
                    self.color_mut().color_weight = Some(parse_value(key, value, "float")?);
                }
                "color.enabled-types" => {
                    let types = value
                        .split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| s.parse::<ColorType>().map_err(CliError::Config))
                        .collect::<Result<Vec<_>>>()?;
                    self.color_mut().enabled_types = Some(types);
                }
                "consistency.rtol" => {
                    self.consistency
                        .get_or_insert_with(Default::default)
                        .rtol = Some(parse_value(key, value, "float")?);
                }
                "consistency.atol" => {
                    self.consistency
                        .get_or_insert_with(Default::default)
                        .atol = Some(parse_value(key, value, "float")?);
                }
                "execution.batch-size" => {
                    self.execution_mut().batch_size = Some(parse_value(key, value, "integer")?);
                }
                "execution.executor" => {
                    self.execution_mut().executor = Some(value.trim().to_string());
                }
                "input.merge-conformers" => {
                    self.input.get_or_insert_with(Default::default).merge_conformers =
                        Some(parse_value(key, value, "boolean")?);
                }
                "output.pretty" => {
                    self.output.get_or_insert_with(Default::default).pretty =
                        Some(parse_value(key, value, "boolean")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn alignment_mut(&mut self) -> &mut PartialAlignmentConfig {
        self.alignment.get_or_insert_with(Default::default)
    }

    fn color_mut(&mut self) -> &mut PartialColorConfig {
        self.color.get_or_insert_with(Default::default)
    }

    fn execution_mut(&mut self) -> &mut PartialExecutionConfig {
        self.execution.get_or_insert_with(Default::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("coloverlap.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn args(extra: &[&str]) -> ScoreArgs {
        let mut argv = vec!["coloverlap", "-r", "refs.sdf", "-f", "fits.sdf", "-o", "out.json"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap().score
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let settings = PartialOverlapConfig::default().merge_with_cli(&args(&[])).unwrap();
        assert_eq!(settings.config.batch_size, 1000);
        assert_eq!(settings.config.alignment, ShapeOptions::default());
        assert_eq!(settings.config.color, ColorOptions::default());
        assert_eq!(settings.config.tolerance, GeometryTolerance::default());
        assert!(settings.execution.is_none());
        assert!(!settings.pretty);
    }

    #[test]
    fn file_values_are_loaded_and_merged() {
        let dir = TempDir::new().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            [alignment]
            use-hydrogens = true
            max-iterations = 50

            [color]
            color-radius = 1.5
            enabled-types = ["donor", "rings"]

            [consistency]
            rtol = 1e-4

            [execution]
            batch-size = 64
            executor = "fast"

            [execution.pools.fast]
            workers = 3

            [input]
            merge-conformers = false

            [output]
            pretty = true
            "#,
        );

        let partial = PartialOverlapConfig::from_file(&path).unwrap();
        let settings = partial.merge_with_cli(&args(&[])).unwrap();

        assert!(settings.config.alignment.use_hydrogens);
        assert_eq!(settings.config.alignment.max_iterations, 50);
        assert_eq!(settings.config.alignment.min_step, ShapeOptions::default().min_step);
        assert_eq!(settings.config.color.color_radius, 1.5);
        assert_eq!(
            settings.config.color.enabled_types,
            Some(vec![ColorType::Donor, ColorType::Ring])
        );
        assert_eq!(settings.config.tolerance.rtol, 1e-4);
        assert_eq!(settings.config.tolerance.atol, GeometryTolerance::default().atol);
        assert_eq!(settings.config.batch_size, 64);
        let execution = settings.execution.unwrap();
        assert_eq!(execution.label, "fast");
        assert_eq!(execution.workers, Some(3));
        assert!(!settings.config.merge_conformers);
        assert!(settings.pretty);
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config_file(
            &dir,
            "[execution]\nbatch-size = 64\nexecutor = \"auto\"\n",
        );
        let partial = PartialOverlapConfig::from_file(&path).unwrap();
        let settings = partial
            .merge_with_cli(&args(&[
                "--batch-size",
                "8",
                "--executor",
                "2",
                "-S",
                "execution.batch-size=16",
                "-S",
                "color.color-weight=0.5",
            ]))
            .unwrap();

        assert_eq!(settings.config.batch_size, 8);
        assert_eq!(settings.execution.unwrap().workers, Some(2));
        assert_eq!(settings.config.color.color_weight, 0.5);
    }

    #[test]
    fn set_values_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config_file(&dir, "[alignment]\nmax-iterations = 50\n");
        let partial = PartialOverlapConfig::from_file(&path).unwrap();
        let settings = partial
            .merge_with_cli(&args(&[
                "-S",
                "alignment.max-iterations=10",
                "-S",
                "color.enabled-types=donor,acceptor",
            ]))
            .unwrap();
        assert_eq!(settings.config.alignment.max_iterations, 10);
        assert!(settings.config.merge_conformers);
        assert_eq!(
            settings.config.color.enabled_types,
            Some(vec![ColorType::Donor, ColorType::Acceptor])
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config_file(&dir, "[color]\nradius = 1.0\n");
        assert!(matches!(
            PartialOverlapConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let err = PartialOverlapConfig::default()
            .merge_with_cli(&args(&["-S", "color.radius=1.0"]))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("Unsupported")));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["alignment.max-iterations", "alignment.max-iterations=many", "color.enabled-types=aromatic"] {
            let result = PartialOverlapConfig::default().merge_with_cli(&args(&["-S", bad]));
            assert!(matches!(result, Err(CliError::Config(_))), "{bad} should fail");
        }
    }

    #[test]
    fn zero_batch_size_and_unknown_executor_are_config_errors() {
        let zero = PartialOverlapConfig::default().merge_with_cli(&args(&["--batch-size", "0"]));
        assert!(matches!(zero, Err(CliError::Config(_))));

        let unknown = PartialOverlapConfig::default().merge_with_cli(&args(&["--executor", "gpu"]));
        assert!(matches!(unknown, Err(CliError::Config(msg)) if msg.contains("gpu")));
    }
}
