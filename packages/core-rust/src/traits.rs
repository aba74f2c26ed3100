use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};

use crate::component::Capable;

/// Callable form of a [`Provider`]: takes the argument by value and yields the
/// value asynchronously.
pub type ProviderFn<R, A = ()> = dyn Fn(A) -> BoxFuture<'static, anyhow::Result<R>> + Send + Sync;

/// Callable form of an [`OptionalProvider`].
pub type OptionalProviderFn<R, A = ()> = ProviderFn<Option<R>, A>;

/// Callable form of a [`SyncProvider`].
pub type SyncProviderFn<R> = dyn Fn() -> R + Send + Sync;

/// Callable form of a [`Predicate`].
pub type PredicateFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Object-shaped source of a value, keyed by an argument.
/// The capability is exposed under the name `"get"`.
#[async_trait]
pub trait Provider<R, A = ()>: Send + Sync {
    /// Produce the value for `arg`.
    async fn get(&self, arg: A) -> anyhow::Result<R>;
}

/// Like [`Provider`], but "no value" is a legitimate answer.
#[async_trait]
pub trait OptionalProvider<R, A = ()>: Send + Sync {
    /// Produce the value for `arg`, or `None` when there is nothing to give.
    async fn get(&self, arg: A) -> anyhow::Result<Option<R>>;
}

/// Synchronous, argument-less provider. Used to lazily compute defaults.
pub trait SyncProvider<R>: Send + Sync {
    fn get(&self) -> R;
}

/// Boolean test over a value. Exposed under the name `"test"`.
pub trait Predicate<T>: Send + Sync {
    fn test(&self, value: &T) -> bool;
}

impl<R, A> Capable<ProviderFn<R, A>> for dyn Provider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<ProviderFn<R, A>>> {
        if name != "get" {
            return None;
        }
        let bound: Arc<ProviderFn<R, A>> = Arc::new(move |arg: A| {
            let this = Arc::clone(&self);
            async move { this.get(arg).await }.boxed()
        });
        Some(bound)
    }
}

impl<R, A> Capable<OptionalProviderFn<R, A>> for dyn OptionalProvider<R, A>
where
    R: Send + 'static,
    A: Send + 'static,
{
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<OptionalProviderFn<R, A>>> {
        if name != "get" {
            return None;
        }
        let bound: Arc<OptionalProviderFn<R, A>> = Arc::new(move |arg: A| {
            let this = Arc::clone(&self);
            async move { this.get(arg).await }.boxed()
        });
        Some(bound)
    }
}

impl<R: 'static> Capable<SyncProviderFn<R>> for dyn SyncProvider<R> {
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<SyncProviderFn<R>>> {
        if name != "get" {
            return None;
        }
        let bound: Arc<SyncProviderFn<R>> = Arc::new(move || self.get());
        Some(bound)
    }
}

impl<T: 'static> Capable<PredicateFn<T>> for dyn Predicate<T> {
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<PredicateFn<T>>> {
        if name != "test" {
            return None;
        }
        let bound: Arc<PredicateFn<T>> = Arc::new(move |value: &T| self.test(value));
        Some(bound)
    }
}
