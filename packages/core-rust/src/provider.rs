//! Provider components, function constructors, and the optional-to-required wrapper.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::FutureExt;

use crate::component::{resolve, Component, ComponentError, ResolveOptions};
use crate::traits::{
    OptionalProvider, OptionalProviderFn, Predicate, PredicateFn, Provider, ProviderFn,
    SyncProvider, SyncProviderFn,
};

pub type ProviderComponent<R, A = ()> = Component<dyn Provider<R, A>, ProviderFn<R, A>>;
pub type OptionalProviderComponent<R, A = ()> =
    Component<dyn OptionalProvider<R, A>, OptionalProviderFn<R, A>>;
pub type SyncProviderComponent<R> = Component<dyn SyncProvider<R>, SyncProviderFn<R>>;
pub type PredicateComponent<T> = Component<dyn Predicate<T>, PredicateFn<T>>;

/// Errors raised by the provider wrappers in this crate.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("provider returned no value")]
    NoValue,
}

// ---------------------------------------------------------------------------
// Function constructors
// ---------------------------------------------------------------------------

/// Wrap an async closure as a [`ProviderFn`].
pub fn provider_fn<R, A, F, Fut>(f: F) -> Arc<ProviderFn<R, A>>
where
    R: 'static,
    A: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    Arc::new(move |arg: A| f(arg).boxed())
}

/// Wrap an async closure as an [`OptionalProviderFn`].
pub fn optional_provider_fn<R, A, F, Fut>(f: F) -> Arc<OptionalProviderFn<R, A>>
where
    R: 'static,
    A: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<R>>> + Send + 'static,
{
    provider_fn(f)
}

/// Wrap a closure as a [`SyncProviderFn`].
pub fn sync_provider_fn<R, F>(f: F) -> Arc<SyncProviderFn<R>>
where
    F: Fn() -> R + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`PredicateFn`].
pub fn predicate_fn<T, F>(f: F) -> Arc<PredicateFn<T>>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

// ---------------------------------------------------------------------------
// ProviderWrapper
// ---------------------------------------------------------------------------

/// Turns an [`OptionalProvider`] into a [`Provider`].
///
/// When the wrapped provider yields nothing, the default-value provider is
/// asked next (which itself defaults to returning `default_value`). If that
/// also yields nothing, `get` fails with [`ProviderError::NoValue`].
pub struct ProviderWrapper<R, A = ()> {
    provider: Arc<OptionalProviderFn<R, A>>,
    fallback: Arc<OptionalProviderFn<R, A>>,
}

/// Construction options for [`ProviderWrapper`].
pub struct ProviderWrapperOptions<R, A = ()> {
    /// The optional provider being wrapped.
    pub provider: OptionalProviderComponent<R, A>,
    /// Value returned when the provider yields nothing.
    pub default_value: Option<R>,
    /// Consulted when the provider yields nothing. Takes precedence over `default_value`.
    pub default_value_provider: OptionalProviderComponent<R, A>,
}

impl<R, A> ProviderWrapper<R, A>
where
    R: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    /// # Errors
    ///
    /// Returns [`ComponentError`] if `provider` cannot be resolved.
    pub fn new(options: ProviderWrapperOptions<R, A>) -> Result<Self, ComponentError> {
        let provider = resolve(options.provider, &["get"], ResolveOptions::named("provider"))?;
        let default_value = options.default_value;
        let fallback = resolve(
            options.default_value_provider,
            &["get"],
            ResolveOptions::named("defaultValueProvider").with_default(Component::Function(
                optional_provider_fn(move |_arg: A| {
                    let value = default_value.clone();
                    async move { Ok(value) }
                }),
            )),
        )?;
        Ok(Self { provider, fallback })
    }

    /// Wrap `provider` with an optional constant default.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError`] if `provider` cannot be resolved.
    pub fn wrap(
        provider: OptionalProviderComponent<R, A>,
        default_value: Option<R>,
    ) -> Result<Self, ComponentError> {
        Self::new(ProviderWrapperOptions {
            provider,
            default_value,
            default_value_provider: Component::Absent,
        })
    }
}

#[async_trait]
impl<R, A> Provider<R, A> for ProviderWrapper<R, A>
where
    R: Send + 'static,
    A: Clone + Send + 'static,
{
    async fn get(&self, arg: A) -> anyhow::Result<R> {
        if let Some(value) = (self.provider)(arg.clone()).await? {
            return Ok(value);
        }
        match (self.fallback)(arg).await? {
            Some(value) => Ok(value),
            None => Err(ProviderError::NoValue.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
