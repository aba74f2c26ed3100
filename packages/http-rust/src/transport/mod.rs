//! Transport boundary: request/response descriptors, the default `reqwest`
//! service, and the middleware stack wrapped around it.
//!
//! Any `tower::Service<HttpRequest, Response = HttpResponse, Error = HttpError>`
//! that is `Clone + Send` can stand in for [`ReqwestTransport`].

pub mod config;
pub mod middleware;
pub mod request;
pub mod reqwest_transport;

pub use config::TransportConfig;
pub use middleware::{build_transport_stack, BoxTransport, DeadlineLayer, TraceLayer};
pub use request::{HttpMethod, HttpRequest, HttpResponse};
pub use reqwest_transport::ReqwestTransport;
