//! Execution strategies: fan one argument out to a list of handlers.
//!
//! - [`ParallelExecution`] runs every handler concurrently and aggregates failures.
//! - [`SerialExecution`] runs handlers one after another, stopping at the first failure.
//! - [`RoundRobin`] invokes a single handler per call, rotating through the list.

pub mod parallel;
pub mod round_robin;
pub mod serial;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};

pub use parallel::{execute_parallel, ParallelExecution};
pub use round_robin::RoundRobin;
pub use serial::{execute_serial, SerialExecution};

/// A handler invoked by an [`ExecutionStrategy`].
pub type ExecutableFn<A> = dyn Fn(A) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// Wrap an async closure as an [`ExecutableFn`].
pub fn executable<A, F, Fut>(f: F) -> Arc<ExecutableFn<A>>
where
    A: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |arg: A| f(arg).boxed())
}

/// A policy for dispatching `arg` to `handlers`.
///
/// Each handler receives its own clone of `arg`.
#[async_trait]
pub trait ExecutionStrategy<A>: Send {
    /// # Errors
    ///
    /// Propagates handler failures as described by the implementing strategy.
    async fn execute(&mut self, handlers: &[Arc<ExecutableFn<A>>], arg: A) -> anyhow::Result<()>;
}

/// Errors produced by the strategies themselves (as opposed to handler failures).
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Two or more handlers failed. Causes are kept in handler order.
    #[error("Multiple errors occurred during execution.")]
    Multiple { causes: Vec<anyhow::Error> },
    #[error("no handlers to execute")]
    NoHandlers,
}

impl ExecutionError {
    #[must_use]
    pub fn causes(&self) -> &[anyhow::Error] {
        match self {
            Self::Multiple { causes } => causes,
            Self::NoHandlers => &[],
        }
    }
}
