//! Component resolution: turning "something that can do X" into a callable.
//!
//! Constructor options across the workspace accept capabilities in one of three
//! shapes, modelled by [`Component`]:
//!
//! - an object implementing a capability trait (e.g. `Arc<dyn Provider<R, A>>`),
//! - a bare function of the capability's callable form (e.g. `Arc<ProviderFn<R, A>>`),
//! - nothing at all.
//!
//! [`resolve`] collapses those shapes into a single `Arc<F>` at construction
//! time, falling back to a default value or a default provider when the
//! component is missing.

use std::fmt;
use std::sync::Arc;

use crate::traits::{SyncProvider, SyncProviderFn};

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A reference to a capability, in any of its accepted shapes.
///
/// `T` is the object-shaped contract (usually a trait object) and `F` the
/// callable form of the capability.
pub enum Component<T: ?Sized, F: ?Sized> {
    /// No component supplied.
    Absent,
    /// An object exposing the capability through [`Capable`].
    Object(Arc<T>),
    /// The capability as a bare callable.
    Function(Arc<F>),
}

/// Shape of a [`Component`], kept on resolution errors to identify the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Absent,
    Object,
    Function,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Object => f.write_str("object"),
            Self::Function => f.write_str("function"),
        }
    }
}

impl<T: ?Sized, F: ?Sized> Component<T, F> {
    /// Returns the shape of this component.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Absent => ComponentKind::Absent,
            Self::Object(_) => ComponentKind::Object,
            Self::Function(_) => ComponentKind::Function,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: ?Sized, F: ?Sized> Clone for Component<T, F> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Object(object) => Self::Object(Arc::clone(object)),
            Self::Function(function) => Self::Function(Arc::clone(function)),
        }
    }
}

impl<T: ?Sized, F: ?Sized> Default for Component<T, F> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T: ?Sized, F: ?Sized> fmt::Debug for Component<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component::{:?}", self.kind())
    }
}

// ---------------------------------------------------------------------------
// Capable
// ---------------------------------------------------------------------------

/// Capability table for object-shaped components.
///
/// An implementation answers, for a given capability name, with the callable
/// form bound to `self`, or `None` if the object does not expose that name.
pub trait Capable<F: ?Sized> {
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<F>>;
}

// ---------------------------------------------------------------------------
// ResolveOptions
// ---------------------------------------------------------------------------

/// Component that lazily produces a default component.
pub type DefaultProvider<T, F> =
    Component<dyn SyncProvider<Component<T, F>>, SyncProviderFn<Component<T, F>>>;

/// Fallback behaviour for [`resolve`].
///
/// `default_provider` wins over `default` when both are set.
pub struct ResolveOptions<T: ?Sized, F: ?Sized> {
    /// Component to resolve against when the primary one is unusable.
    pub default: Option<Component<T, F>>,
    /// Provider of the component to resolve against when the primary one is unusable.
    pub default_provider: Option<DefaultProvider<T, F>>,
    /// Overrides the whole error message.
    pub error_message: Option<String>,
    /// Label used in the default error message (`Invalid <name>`).
    pub name: Option<String>,
}

impl<T: ?Sized, F: ?Sized> Default for ResolveOptions<T, F> {
    fn default() -> Self {
        Self {
            default: None,
            default_provider: None,
            error_message: None,
            name: None,
        }
    }
}

impl<T: ?Sized, F: ?Sized> ResolveOptions<T, F> {
    /// Options that only label the component in error messages.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Component<T, F>) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_default_provider(mut self, provider: DefaultProvider<T, F>) -> Self {
        self.default_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    fn message(&self) -> String {
        self.error_message.clone().unwrap_or_else(|| {
            format!("Invalid {}", self.name.as_deref().unwrap_or("component"))
        })
    }
}

// ---------------------------------------------------------------------------
// ComponentError
// ---------------------------------------------------------------------------

/// A component could not be turned into a callable and no usable default existed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ComponentError {
    kind: ComponentKind,
    message: String,
}

impl ComponentError {
    /// Shape of the component that failed to resolve.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

/// Resolve `component` into the callable registered under the first matching
/// name in `names`.
///
/// Resolution order:
/// 1. an object exposing one of `names` (first match wins) is bound and returned;
/// 2. a bare function is returned unchanged;
/// 3. otherwise `default_provider` is invoked and its result resolved;
/// 4. otherwise `default` is resolved;
/// 5. otherwise resolution fails.
///
/// # Errors
///
/// Returns [`ComponentError`] when neither the component nor its fallbacks
/// yield a callable. Errors from a fallback carry a `Default Provider:` or
/// `Default Value:` prefix in front of the original label.
pub fn resolve<T, F>(
    component: Component<T, F>,
    names: &[&str],
    options: ResolveOptions<T, F>,
) -> Result<Arc<F>, ComponentError>
where
    T: ?Sized + Capable<F> + 'static,
    F: ?Sized + 'static,
{
    let kind = component.kind();
    if let Some(bound) = bind(component, names) {
        return Ok(bound);
    }

    let message = options.message();

    if let Some(provider) = options.default_provider {
        let provider_kind = provider.kind();
        let Some(provide) = bind(provider, &["get"]) else {
            return Err(ComponentError {
                kind: provider_kind,
                message: "Default Provider: Invalid component".to_string(),
            });
        };
        tracing::trace!(label = %message, "resolving component from default provider");
        return resolve(
            provide(),
            names,
            ResolveOptions::default().with_error_message(format!("Default Provider: {message}")),
        );
    }

    if let Some(default) = options.default {
        tracing::trace!(label = %message, "resolving component from default value");
        return resolve(
            default,
            names,
            ResolveOptions::default().with_error_message(format!("Default Value: {message}")),
        );
    }

    Err(ComponentError { kind, message })
}

/// Steps 1 and 2 of [`resolve`], without any fallback.
fn bind<T, F>(component: Component<T, F>, names: &[&str]) -> Option<Arc<F>>
where
    T: ?Sized + Capable<F>,
    F: ?Sized,
{
    match component {
        Component::Object(object) => names
            .iter()
            .find_map(|name| Arc::clone(&object).capability(name)),
        Component::Function(function) => Some(function),
        Component::Absent => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
