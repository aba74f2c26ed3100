use std::sync::Arc;

use async_trait::async_trait;

use super::{ExecutableFn, ExecutionError, ExecutionStrategy};

/// Invokes exactly one handler per call, rotating through the list.
///
/// The cursor lives on the instance and survives across calls; the first call
/// selects index 0. `execute` takes `&mut self`, so concurrent callers must
/// share the strategy behind their own lock.
#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    last_index: Option<usize>,
}

impl RoundRobin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index selected by the most recent call, if any.
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    fn advance(&mut self, len: usize) -> usize {
        let next = self.last_index.map_or(0, |last| (last + 1) % len);
        self.last_index = Some(next);
        next
    }
}

#[async_trait]
impl<A> ExecutionStrategy<A> for RoundRobin
where
    A: Send + 'static,
{
    async fn execute(&mut self, handlers: &[Arc<ExecutableFn<A>>], arg: A) -> anyhow::Result<()> {
        if handlers.is_empty() {
            return Err(ExecutionError::NoHandlers.into());
        }
        let index = self.advance(handlers.len());
        handlers[index](arg).await
    }
}
