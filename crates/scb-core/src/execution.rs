//! Execution strategies for independent resampling tasks
//!
//! Bootstrap resamples only read a fixed residual field and each produce one
//! scalar, so they can be scheduled in any order. This module runs such a
//! batch either on the current thread or across the rayon pool, checking a
//! [`CancellationToken`] between tasks.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Execution strategy for batch operations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Process items sequentially on the calling thread
    #[default]
    Sequential,
    /// Process items in parallel (requires the `parallel` feature)
    Parallel,
}

impl ExecutionStrategy {
    /// Check if parallel execution is available
    pub fn is_parallel(&self) -> bool {
        cfg!(feature = "parallel") && matches!(self, ExecutionStrategy::Parallel)
    }

    /// Run `count` independent tasks and collect their results in index order
    ///
    /// The token is checked before every task; once it fires the whole batch
    /// fails with [`Error::Cancelled`] and no partial results are returned.
    pub fn execute_batch<F, R>(&self, count: usize, token: &CancellationToken, f: F) -> Result<Vec<R>>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        match self {
            #[cfg(feature = "parallel")]
            ExecutionStrategy::Parallel => {
                use rayon::prelude::*;
                (0..count)
                    .into_par_iter()
                    .map(|i| {
                        token.check()?;
                        Ok(f(i))
                    })
                    .collect()
            }
            _ => {
                if matches!(self, ExecutionStrategy::Parallel) {
                    debug!("parallel feature disabled, running {count} tasks sequentially");
                }
                let mut results = Vec::with_capacity(count);
                for i in 0..count {
                    token.check()?;
                    results.push(f(i));
                }
                Ok(results)
            }
        }
    }

    /// Get the number of threads available
    pub fn num_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        let threads = if self.is_parallel() {
            rayon::current_num_threads()
        } else {
            1
        };
        #[cfg(not(feature = "parallel"))]
        let threads = 1;
        threads
    }
}

/// Cooperative cancellation flag with an optional deadline
///
/// Cloning shares the flag, so a caller can keep one clone and cancel a
/// running bootstrap from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`Error::Cancelled`] if the token has fired
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(Error::Cancelled("cancelled by caller".to_string()));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }
}
