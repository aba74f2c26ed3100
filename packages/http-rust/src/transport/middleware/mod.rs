//! Tower middleware layers for the transport.
//!
//! - [`deadline`]: Per-request timeout enforcement
//! - [`trace`]: Request timing and outcome via `tracing` spans
//! - [`pipeline`]: Composes the layers around a transport

pub mod deadline;
pub mod pipeline;
pub mod trace;

pub use deadline::DeadlineLayer;
pub use pipeline::{build_transport_stack, BoxTransport};
pub use trace::TraceLayer;
