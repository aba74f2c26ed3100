//! Deadline racing for providers.
//!
//! Both wrappers spawn the provider call and race its handle against a timer.
//! When the timer wins the handle is dropped, which detaches the task rather
//! than aborting it: the provider keeps running and its late result is thrown
//! away.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::component::{resolve, ComponentError, ResolveOptions};
use crate::provider::{OptionalProviderComponent, ProviderComponent, ProviderError};
use crate::traits::{OptionalProvider, OptionalProviderFn, Provider, ProviderFn};

/// Outcome of racing a provider future against the timer.
enum Race<T> {
    Settled(anyhow::Result<T>),
    Elapsed,
}

async fn race<T>(fut: BoxFuture<'static, anyhow::Result<T>>, timeout: Duration) -> Race<T>
where
    T: Send + 'static,
{
    let handle = tokio::spawn(fut);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => Race::Settled(result),
        Ok(Err(join_err)) => Race::Settled(Err(anyhow::Error::new(join_err))),
        Err(_elapsed) => Race::Elapsed,
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// TimeSensitiveProvider
// ---------------------------------------------------------------------------

/// A [`Provider`] that fails with [`ProviderError::Timeout`] when the wrapped
/// provider does not settle within `timeout`.
pub struct TimeSensitiveProvider<R, A = ()> {
    provider: Arc<ProviderFn<R, A>>,
    timeout: Duration,
}

impl<R, A> TimeSensitiveProvider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    /// # Errors
    ///
    /// Returns [`ComponentError`] if `provider` cannot be resolved.
    pub fn new(provider: ProviderComponent<R, A>, timeout: Duration) -> Result<Self, ComponentError> {
        let provider = resolve(provider, &["get"], ResolveOptions::named("provider"))?;
        Ok(Self { provider, timeout })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<R, A> Provider<R, A> for TimeSensitiveProvider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    async fn get(&self, arg: A) -> anyhow::Result<R> {
        match race((self.provider)(arg), self.timeout).await {
            Race::Settled(result) => result,
            Race::Elapsed => {
                let timeout_ms = millis(self.timeout);
                debug!(timeout_ms, "provider lost the race against its deadline");
                Err(ProviderError::Timeout { timeout_ms }.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSensitiveOptionalProvider
// ---------------------------------------------------------------------------

/// An [`OptionalProvider`] that yields `None` when the wrapped provider does
/// not settle within `timeout`.
pub struct TimeSensitiveOptionalProvider<R, A = ()> {
    provider: Arc<OptionalProviderFn<R, A>>,
    timeout: Duration,
}

impl<R, A> TimeSensitiveOptionalProvider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    /// # Errors
    ///
    /// Returns [`ComponentError`] if `provider` cannot be resolved.
    pub fn new(
        provider: OptionalProviderComponent<R, A>,
        timeout: Duration,
    ) -> Result<Self, ComponentError> {
        let provider = resolve(provider, &["get"], ResolveOptions::named("provider"))?;
        Ok(Self { provider, timeout })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<R, A> OptionalProvider<R, A> for TimeSensitiveOptionalProvider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    async fn get(&self, arg: A) -> anyhow::Result<Option<R>> {
        match race((self.provider)(arg), self.timeout).await {
            Race::Settled(result) => result,
            Race::Elapsed => {
                debug!(
                    timeout_ms = millis(self.timeout),
                    "optional provider lost the race against its deadline"
                );
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
