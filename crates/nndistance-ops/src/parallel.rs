use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while setting up parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Where the accelerator path schedules its work items.
#[derive(Clone, Default)]
pub enum ThreadPoolHandle {
    /// Use the global rayon thread pool.
    #[default]
    Global,
    /// Use a dedicated pool with a fixed number of threads.
    Fixed(Arc<rayon::ThreadPool>),
}

impl ThreadPoolHandle {
    /// Creates a handle for the requested thread count.
    ///
    /// `None` selects the global pool; `Some(n)` builds a dedicated pool once so that
    /// repeated calls do not pay the pool construction cost.
    ///
    /// # Errors
    ///
    /// Returns [`ParallelError::InvalidThreadCount`] for `Some(0)` and
    /// [`ParallelError::BuildError`] if rayon cannot spawn the pool.
    pub fn new(num_threads: Option<usize>) -> Result<Self, ParallelError> {
        match num_threads {
            None => Ok(Self::Global),
            Some(0) => Err(ParallelError::InvalidThreadCount(0)),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("nndistance-{i}"))
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(Self::Fixed(Arc::new(pool)))
            }
        }
    }

    /// Returns the number of threads work is spread over.
    pub fn num_threads(&self) -> usize {
        match self {
            Self::Global => rayon::current_num_threads(),
            Self::Fixed(pool) => pool.current_num_threads(),
        }
    }

    /// Runs `op` inside the selected pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match self {
            Self::Global => op(),
            Self::Fixed(pool) => pool.install(op),
        }
    }
}

impl std::fmt::Debug for ThreadPoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "Global"),
            Self::Fixed(pool) => write!(f, "Fixed({})", pool.current_num_threads()),
        }
    }
}
