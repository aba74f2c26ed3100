//! Toolbelt Core: component resolution, provider contracts, deadline racing, and
//! execution strategies.

pub mod component;
pub mod predicate;
pub mod provider;
pub mod strategy;
pub mod timeout;
pub mod traits;

pub use component::{resolve, Capable, Component, ComponentError, ComponentKind, ResolveOptions};
pub use predicate::{negate, NegatedPredicate};
pub use provider::{
    optional_provider_fn, predicate_fn, provider_fn, sync_provider_fn, OptionalProviderComponent,
    PredicateComponent, ProviderComponent, ProviderError, ProviderWrapper, ProviderWrapperOptions,
    SyncProviderComponent,
};
pub use strategy::{
    executable, execute_parallel, execute_serial, ExecutableFn, ExecutionError, ExecutionStrategy,
    ParallelExecution, RoundRobin, SerialExecution,
};
pub use timeout::{TimeSensitiveOptionalProvider, TimeSensitiveProvider};
pub use traits::{
    OptionalProvider, OptionalProviderFn, Predicate, PredicateFn, Provider, ProviderFn,
    SyncProvider, SyncProviderFn,
};
