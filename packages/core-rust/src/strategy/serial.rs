use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ExecutableFn, ExecutionStrategy};

/// Run handlers one at a time in list order.
///
/// # Errors
///
/// Returns the first handler failure unchanged; later handlers are not invoked.
pub async fn execute_serial<A: Clone>(
    handlers: &[Arc<ExecutableFn<A>>],
    arg: A,
) -> anyhow::Result<()> {
    for (index, handler) in handlers.iter().enumerate() {
        if let Err(err) = handler(arg.clone()).await {
            debug!(index, remaining = handlers.len() - index - 1, "serial execution aborted");
            return Err(err);
        }
    }
    Ok(())
}

/// [`ExecutionStrategy`] form of [`execute_serial`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecution;

#[async_trait]
impl<A> ExecutionStrategy<A> for SerialExecution
where
    A: Clone + Send + 'static,
{
    async fn execute(&mut self, handlers: &[Arc<ExecutableFn<A>>], arg: A) -> anyhow::Result<()> {
        execute_serial(handlers, arg).await
    }
}
