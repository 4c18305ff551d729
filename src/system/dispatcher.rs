// src/system/dispatcher.rs

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// The rayon pool refused to start.
    #[error("Could not start a pool of {nb_cores} worker threads: {source}")]
    PoolBuild {
        /// Requested pool size.
        nb_cores: usize,
        /// Error reported by rayon.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// A unit of work submitted to [`ParallelDispatcher::dispatch`].
pub type Command = Box<dyn FnOnce() -> Result<()> + Send>;

/// Runs a tool's parallel sub-tasks on a dedicated worker pool.
#[derive(Debug)]
pub struct ParallelDispatcher {
    pool: rayon::ThreadPool,
}

impl ParallelDispatcher {
    /// Builds a pool of `nb_cores` threads. `0` lets the pool size itself from
    /// the available hardware parallelism.
    pub fn new(nb_cores: usize) -> Result<Self, DispatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_cores)
            .thread_name(|i| format!("stagekit-worker-{}", i))
            .build()
            .map_err(|source| DispatchError::PoolBuild { nb_cores, source })?;
        log::debug!(
            "Dispatcher ready with {} worker threads (requested: {}).",
            pool.current_num_threads(),
            nb_cores
        );
        Ok(Self { pool })
    }

    /// Number of worker threads actually running.
    pub fn nb_cores(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `f` inside the pool, so `rayon` parallel iterators used by `f`
    /// are bounded by this dispatcher.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }

    /// Runs every command to completion. All commands run even when some fail;
    /// the failures are then combined into one error.
    pub fn dispatch(&self, commands: Vec<Command>) -> Result<()> {
        let total = commands.len();
        log::trace!("Dispatching {} commands.", total);

        let results: Vec<Result<()>> = self
            .pool
            .install(|| commands.into_par_iter().map(|command| command()).collect());

        let errors: Vec<String> = results
            .into_iter()
            .enumerate()
            .filter_map(|(i, result)| result.err().map(|e| format!("Command #{}: {}", i, e)))
            .collect();

        if !errors.is_empty() {
            return Err(anyhow!(
                "{} of {} dispatched command(s) failed.",
                errors.len(),
                total
            ))
            .context(errors.join("\n"));
        }
        Ok(())
    }

    /// Applies `f` to every item in parallel.
    pub fn iterate<T, F>(&self, items: Vec<T>, f: F)
    where
        T: Send,
        F: Fn(T) + Sync + Send,
    {
        self.pool.install(|| items.into_par_iter().for_each(f));
    }
}
