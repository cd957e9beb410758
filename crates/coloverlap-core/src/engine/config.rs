use crate::core::color::overlap::ColorOptions;
use crate::core::shape::alignment::ShapeOptions;
use crate::core::utils::geometry::GeometryTolerance;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Unknown execution context '{0}' (expected a worker count, 'auto', or a configured pool name)")]
    UnknownExecutionContext(String),
}

/// Where candidate batches run.
///
/// `workers == None` sizes the pool to the number of logical cores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub label: String,
    pub workers: Option<usize>,
}

impl ExecutionContext {
    pub fn with_workers(workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "workers",
                reason: "a worker pool needs at least one worker".to_string(),
            });
        }
        Ok(Self {
            label: format!("pool-{}", workers),
            workers: Some(workers),
        })
    }

    pub fn auto() -> Self {
        Self {
            label: "auto".to_string(),
            workers: None,
        }
    }

    /// Resolves an execution-context identifier: a worker count, `auto`, or
    /// the name of one of `pools` (name to worker count).
    pub fn resolve(id: &str, pools: &BTreeMap<String, usize>) -> Result<Self, ConfigError> {
        let id = id.trim();
        if let Some(&workers) = pools.get(id) {
            let mut context = Self::with_workers(workers)?;
            context.label = id.to_string();
            return Ok(context);
        }
        id.parse()
    }
}

impl FromStr for ExecutionContext {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::auto());
        }
        match s.parse::<usize>() {
            Ok(workers) => Self::with_workers(workers),
            Err(_) => Err(ConfigError::UnknownExecutionContext(s.to_string())),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.workers {
            Some(n) => write!(f, "{} ({} workers)", self.label, n),
            None => write!(f, "{} (one worker per core)", self.label),
        }
    }
}

/// Parameters of one scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapConfig<AO = ShapeOptions, OO = ColorOptions> {
    pub alignment: AO,
    pub color: OO,
    pub batch_size: usize,
    /// Tolerance for comparing reference color-atom coordinates reported by
    /// different candidates and batches.
    pub tolerance: GeometryTolerance,
    /// Value stored at masked positions of the score array.
    pub fill_value: f64,
    /// Merge consecutive same-molecule SD records into one multi-conformer
    /// molecule when reading files.
    pub merge_conformers: bool,
}

pub struct OverlapConfigBuilder<AO = ShapeOptions, OO = ColorOptions> {
    alignment: Option<AO>,
    color: Option<OO>,
    batch_size: Option<usize>,
    tolerance: Option<GeometryTolerance>,
    fill_value: Option<f64>,
    merge_conformers: Option<bool>,
}

impl<AO, OO> Default for OverlapConfigBuilder<AO, OO> {
    fn default() -> Self {
        Self {
            alignment: None,
            color: None,
            batch_size: None,
            tolerance: None,
            fill_value: None,
            merge_conformers: None,
        }
    }
}

impl<AO: Default, OO: Default> OverlapConfigBuilder<AO, OO> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(mut self, options: AO) -> Self {
        self.alignment = Some(options);
        self
    }
    pub fn color(mut self, options: OO) -> Self {
        self.color = Some(options);
        self
    }
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }
    pub fn tolerance(mut self, tolerance: GeometryTolerance) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn fill_value(mut self, fill: f64) -> Self {
        self.fill_value = Some(fill);
        self
    }
    pub fn merge_conformers(mut self, merge: bool) -> Self {
        self.merge_conformers = Some(merge);
        self
    }

    /// Engine options and the tolerance fall back to their defaults; the
    /// batch size must be given explicitly.
    pub fn build(self) -> Result<OverlapConfig<AO, OO>, ConfigError> {
        let batch_size = self
            .batch_size
            .ok_or(ConfigError::MissingParameter("batch_size"))?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }

        let tolerance = self.tolerance.unwrap_or_default();
        for (name, value) in [("rtol", tolerance.rtol), ("atol", tolerance.atol)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be a non-negative number, got {}", value),
                });
            }
        }

        Ok(OverlapConfig {
            alignment: self.alignment.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            batch_size,
            tolerance,
            fill_value: self.fill_value.unwrap_or(f64::NAN),
            merge_conformers: self.merge_conformers.unwrap_or(true),
        })
    }
}
