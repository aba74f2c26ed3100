//! Predicate negation.

use std::sync::Arc;

use crate::component::{resolve, ComponentError, ResolveOptions};
use crate::provider::PredicateComponent;
use crate::traits::{Predicate, PredicateFn};

/// Resolve `predicate` and return a callable answering the opposite.
///
/// # Errors
///
/// Returns [`ComponentError`] if `predicate` exposes no `test` capability.
pub fn negate<T: 'static>(
    predicate: PredicateComponent<T>,
) -> Result<Arc<PredicateFn<T>>, ComponentError> {
    let test = resolve(predicate, &["test"], ResolveOptions::named("predicate"))?;
    Ok(Arc::new(move |value: &T| !test(value)))
}

/// A [`Predicate`] that inverts another one.
pub struct NegatedPredicate<T> {
    test: Arc<PredicateFn<T>>,
}

impl<T: 'static> NegatedPredicate<T> {
    /// # Errors
    ///
    /// Returns [`ComponentError`] if `predicate` exposes no `test` capability.
    pub fn new(predicate: PredicateComponent<T>) -> Result<Self, ComponentError> {
        let test = resolve(predicate, &["test"], ResolveOptions::named("predicate"))?;
        Ok(Self { test })
    }
}

impl<T> Predicate<T> for NegatedPredicate<T> {
    fn test(&self, value: &T) -> bool {
        !(self.test)(value)
    }
}
