//! Transport stack composition.

use tower::util::BoxCloneService;
use tower::{Service, ServiceBuilder};

use super::deadline::DeadlineLayer;
use super::trace::TraceLayer;
use crate::error::HttpError;
use crate::transport::request::{HttpRequest, HttpResponse};

/// Type-erased transport stack held by an [`HttpOperator`](crate::HttpOperator).
pub type BoxTransport = BoxCloneService<HttpRequest, HttpResponse, HttpError>;

/// Wrap `transport` with the middleware layers and erase its type.
///
/// Layer order (outermost to innermost):
/// 1. `TraceLayer` -- span per call, records status and outcome (timeouts included)
/// 2. `DeadlineLayer` -- enforce the request's own timeout
#[must_use]
pub fn build_transport_stack<S>(transport: S) -> BoxTransport
where
    S: Service<HttpRequest, Response = HttpResponse, Error = HttpError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    BoxCloneService::new(
        ServiceBuilder::new()
            .layer(TraceLayer)
            .layer(DeadlineLayer)
            .service(transport),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
