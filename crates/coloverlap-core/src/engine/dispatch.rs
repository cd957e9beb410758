use super::config::ExecutionContext;
use super::error::EngineError;
use tracing::info;
#[cfg(feature = "parallel")]
use tracing::debug;
#[cfg(not(feature = "parallel"))]
use tracing::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Ordered map of a fallible function over a fallible batch stream.
///
/// Results come back in the order the batches were produced. The first error,
/// from the stream or from `f`, aborts the map and is returned unchanged.
pub trait BatchExecutor {
    fn map<T, R, E, I, F>(&self, f: F, batches: I) -> Result<Vec<R>, EngineError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send,
        E: Into<EngineError>,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, EngineError> + Send + Sync;
}

/// Runs every batch on the calling thread, one after another.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl BatchExecutor for SequentialExecutor {
    fn map<T, R, E, I, F>(&self, f: F, batches: I) -> Result<Vec<R>, EngineError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send,
        E: Into<EngineError>,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, EngineError> + Send + Sync,
    {
        batches
            .into_iter()
            .map(|batch| batch.map_err(Into::<EngineError>::into).and_then(&f))
            .collect()
    }
}

/// Scatters batches over a dedicated rayon thread pool and gathers the
/// results back into submission order.
#[cfg(feature = "parallel")]
pub struct PoolExecutor {
    pool: rayon::ThreadPool,
    label: String,
}

#[cfg(feature = "parallel")]
impl PoolExecutor {
    pub fn new(context: &ExecutionContext) -> Result<Self, EngineError> {
        let label = context.label.clone();
        let thread_label = label.clone();
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(move |i| format!("{}-worker-{}", thread_label, i));
        if let Some(workers) = context.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| EngineError::Execution(e.to_string()))?;
        Ok(Self { pool, label })
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(feature = "parallel")]
impl BatchExecutor for PoolExecutor {
    fn map<T, R, E, I, F>(&self, f: F, batches: I) -> Result<Vec<R>, EngineError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send,
        E: Into<EngineError>,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, EngineError> + Send + Sync,
    {
        // Errors are converted before crossing into the pool so that only
        // `EngineError` has to be `Send`.
        let tagged = batches
            .into_iter()
            .map(|batch| batch.map_err(Into::<EngineError>::into))
            .enumerate();

        self.pool.install(|| -> Result<Vec<R>, EngineError> {
            let mut results = tagged
                .par_bridge()
                .map(|(index, batch)| batch.and_then(&f).map(|result| (index, result)))
                .collect::<Result<Vec<(usize, R)>, EngineError>>()?;
            results.sort_unstable_by_key(|(index, _)| *index);
            debug!(batches = results.len(), pool = %self.label, "Gathered batch results.");
            Ok(results.into_iter().map(|(_, result)| result).collect())
        })
    }
}

/// The execution strategy of a run, chosen once at startup.
pub enum Dispatcher {
    Sequential(SequentialExecutor),
    #[cfg(feature = "parallel")]
    Pool(PoolExecutor),
}

impl Dispatcher {
    /// No context selects local sequential execution; a context selects a
    /// worker pool.
    pub fn from_context(context: Option<&ExecutionContext>) -> Result<Self, EngineError> {
        let Some(context) = context else {
            info!("Using local sequential execution.");
            return Ok(Dispatcher::Sequential(SequentialExecutor));
        };

        #[cfg(feature = "parallel")]
        {
            let pool = PoolExecutor::new(context)?;
            info!(context = pool.label(), workers = pool.num_workers(), "Using worker pool execution.");
            Ok(Dispatcher::Pool(pool))
        }

        #[cfg(not(feature = "parallel"))]
        {
            warn!(
                context = %context.label,
                "Built without the 'parallel' feature; falling back to sequential execution."
            );
            Ok(Dispatcher::Sequential(SequentialExecutor))
        }
    }

    pub fn is_parallel(&self) -> bool {
        !matches!(self, Dispatcher::Sequential(_))
    }
}

impl BatchExecutor for Dispatcher {
    fn map<T, R, E, I, F>(&self, f: F, batches: I) -> Result<Vec<R>, EngineError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send,
        E: Into<EngineError>,
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, EngineError> + Send + Sync,
    {
        match self {
            Dispatcher::Sequential(executor) => executor.map(f, batches),
            #[cfg(feature = "parallel")]
            Dispatcher::Pool(executor) => executor.map(f, batches),
        }
    }
}
