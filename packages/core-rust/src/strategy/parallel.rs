use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::warn;

use super::{ExecutableFn, ExecutionError, ExecutionStrategy};

/// Run all handlers concurrently and wait for every one of them to settle.
///
/// A single failure is returned as-is; two or more are collected into
/// [`ExecutionError::Multiple`] in handler order, regardless of the order in
/// which they completed.
///
/// # Errors
///
/// Returns the failing handler's error, or [`ExecutionError::Multiple`].
pub async fn execute_parallel<A: Clone>(
    handlers: &[Arc<ExecutableFn<A>>],
    arg: A,
) -> anyhow::Result<()> {
    let results = join_all(handlers.iter().map(|handler| handler(arg.clone()))).await;
    let mut causes: Vec<anyhow::Error> = results.into_iter().filter_map(Result::err).collect();

    match causes.len() {
        0 => Ok(()),
        1 => Err(causes.remove(0)),
        failed => {
            warn!(failed, total = handlers.len(), "parallel execution had multiple failures");
            Err(ExecutionError::Multiple { causes }.into())
        }
    }
}

/// [`ExecutionStrategy`] form of [`execute_parallel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelExecution;

#[async_trait]
impl<A> ExecutionStrategy<A> for ParallelExecution
where
    A: Clone + Send + 'static,
{
    async fn execute(&mut self, handlers: &[Arc<ExecutableFn<A>>], arg: A) -> anyhow::Result<()> {
        execute_parallel(handlers, arg).await
    }
}
