//! Tracing middleware for transport calls.
//!
//! Wraps each call in an `http_request` span and records its duration,
//! response status, and outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::error::HttpError;
use crate::transport::request::{HttpRequest, HttpResponse};

// ---------------------------------------------------------------------------
// TraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments transport calls with `tracing` spans.
#[derive(Debug, Clone)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

// ---------------------------------------------------------------------------
// TraceService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S> Service<HttpRequest> for TraceService<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = HttpError> + Send,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let method = request.method;
        let span = info_span!(
            "http_request",
            method = %method,
            url = %request.url,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = start.elapsed().as_millis() as u64;
                let span = tracing::Span::current();
                span.record("duration_ms", duration_ms);

                match &result {
                    Ok(response) => {
                        span.record("status", response.status.as_u16());
                        span.record("outcome", "ok");
                        tracing::debug!(
                            %method,
                            status = response.status.as_u16(),
                            duration_ms,
                            "http request complete"
                        );
                    }
                    Err(err) => {
                        span.record("outcome", "error");
                        tracing::warn!(%method, duration_ms, error = %err, "http request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
