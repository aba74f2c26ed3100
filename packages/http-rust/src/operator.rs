//! The request pipeline.
//!
//! An [`HttpOperator`] resolves its URL, header, and body providers once at
//! construction and then, per [`perform`](HttpOperator::perform) call, walks
//! `building -> dispatched -> {succeeded | network-failed | status-rejected}`,
//! notifying its observers along the way.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use parking_lot::Mutex;
use serde::Serialize;
use tower::{Service, ServiceExt};
use tracing::{debug, warn};
use url::Url;

use toolbelt_core::{
    provider_fn, resolve, sync_provider_fn, Component, ProviderFn, ResolveOptions,
};

use crate::error::HttpError;
use crate::headers::{content_type_headers, CompositeHeadersProvider};
use crate::observer::{CompositeHttpObserver, HttpObserver};
use crate::traits::{
    json_serializer, no_body, BodySerializerComponent, BodySerializerFn, HeadersProviderComponent,
    HeadersProviderFn, UrlProviderComponent,
};
use crate::transport::{
    build_transport_stack, BoxTransport, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport,
    TransportConfig,
};

/// Content type used when none is configured.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Bounds on the invocation argument threaded through the pipeline.
///
/// `Serialize` backs the default JSON body for POST and PUT.
pub trait OperationArg: Clone + Serialize + Send + Sync + 'static {}

impl<T> OperationArg for T where T: Clone + Serialize + Send + Sync + 'static {}

// ---------------------------------------------------------------------------
// HttpOperatorOptions
// ---------------------------------------------------------------------------

/// Construction options for [`HttpOperator`].
pub struct HttpOperatorOptions<A> {
    /// Fixed URL. Used when `url_provider` is absent.
    pub url: Option<String>,
    /// Computes the URL per argument. Capability `"get"`.
    pub url_provider: UrlProviderComponent<A>,
    /// Contributes headers per argument. Capability `"get"`.
    pub headers_provider: HeadersProviderComponent<A>,
    /// Builds the body per argument. Capability `"serialize"`.
    /// Defaults to no body for GET/DELETE and JSON for POST/PUT.
    pub body_serializer: BodySerializerComponent<A>,
    pub method: HttpMethod,
    /// Explicit `Content-Type`. When set alongside `headers_provider` it is
    /// merged after the custom headers; otherwise it is only the fallback.
    pub content_type: Option<String>,
    /// Deadline for the whole exchange. `None` or zero means unbounded.
    pub timeout: Option<Duration>,
}

impl<A> HttpOperatorOptions<A> {
    #[must_use]
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Whether these options identify a URL at all. An empty `url` does not.
    #[must_use]
    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.is_empty()) || !self.url_provider.is_absent()
    }
}

impl<A> Default for HttpOperatorOptions<A> {
    fn default() -> Self {
        Self {
            url: None,
            url_provider: Component::Absent,
            headers_provider: Component::Absent,
            body_serializer: Component::Absent,
            method: HttpMethod::Get,
            content_type: None,
            timeout: None,
        }
    }
}

impl<A> Clone for HttpOperatorOptions<A> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            url_provider: self.url_provider.clone(),
            headers_provider: self.headers_provider.clone(),
            body_serializer: self.body_serializer.clone(),
            method: self.method,
            content_type: self.content_type.clone(),
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpOperator
// ---------------------------------------------------------------------------

/// Builds, sends, and validates one HTTP request per invocation.
pub struct HttpOperator<A> {
    url_provider: Arc<ProviderFn<String, A>>,
    headers_provider: Arc<HeadersProviderFn<A>>,
    body_serializer: Arc<BodySerializerFn<A>>,
    method: HttpMethod,
    timeout: Option<Duration>,
    transport: Mutex<BoxTransport>,
    observers: CompositeHttpObserver<A>,
}

impl<A: OperationArg> HttpOperator<A> {
    /// Build an operator backed by a default [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Configuration`] when no URL source is given,
    /// [`HttpError::InvalidUrl`] when the fixed `url` does not parse,
    /// [`HttpError::Component`] when a provider cannot be resolved, and
    /// [`HttpError::Build`] when the HTTP client cannot be created.
    pub fn new(options: HttpOperatorOptions<A>) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::new(&TransportConfig::default())?;
        Self::with_transport(options, transport)
    }

    /// Build an operator that dispatches through `transport`.
    ///
    /// The transport is wrapped with the tracing and deadline layers.
    ///
    /// # Errors
    ///
    /// Same as [`HttpOperator::new`], minus client creation.
    pub fn with_transport<S>(options: HttpOperatorOptions<A>, transport: S) -> Result<Self, HttpError>
    where
        S: Service<HttpRequest, Response = HttpResponse, Error = HttpError> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        if !options.has_url() {
            return Err(HttpError::configuration("Must provide either url_provider or url"));
        }
        let HttpOperatorOptions {
            url,
            url_provider,
            headers_provider,
            body_serializer,
            method,
            content_type,
            timeout,
        } = options;

        let mut url_options = ResolveOptions::named("urlProvider");
        if let Some(url) = url.filter(|url| !url.is_empty()) {
            if url_provider.is_absent() {
                Url::parse(&url).map_err(|source| HttpError::InvalidUrl {
                    url: url.clone(),
                    source,
                })?;
            }
            url_options = url_options.with_default(Component::Function(provider_fn(move |_arg: A| {
                let url = url.clone();
                async move { Ok(url) }
            })));
        }
        let url_provider = resolve(url_provider, &["get"], url_options)?;

        let default_serializer = if method.has_body() {
            json_serializer::<A>()
        } else {
            no_body::<A>()
        };
        let body_serializer = resolve(
            body_serializer,
            &["serialize"],
            ResolveOptions::named("bodySerializer").with_default(Component::Function(default_serializer)),
        )?;

        let headers_provider = resolve_headers(headers_provider, content_type)?;
        let timeout = timeout.filter(|t| !t.is_zero());

        debug!(%method, ?timeout, "http operator configured");
        Ok(Self {
            url_provider,
            headers_provider,
            body_serializer,
            method,
            timeout,
            transport: Mutex::new(build_transport_stack(transport)),
            observers: CompositeHttpObserver::default(),
        })
    }

    /// Register an observer for all subsequent invocations.
    pub fn subscribe(&self, observer: Arc<dyn HttpObserver<A>>) {
        self.observers.add(observer);
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run one request for `arg`.
    ///
    /// # Errors
    ///
    /// - [`HttpError::Build`] / [`HttpError::InvalidUrl`] if the request could
    ///   not be assembled (no events are emitted);
    /// - the transport's error, e.g. [`HttpError::Network`] or
    ///   [`HttpError::Timeout`], after `on_request_error`;
    /// - [`HttpError::Status`] for a status outside `[200, 300)`, after
    ///   `on_response_error`.
    pub async fn perform(&self, arg: A) -> Result<HttpResponse, HttpError> {
        let request = self.build_request(&arg).await?;
        self.observers.on_request_created(&arg, &request);

        let transport = self.transport.lock().clone();
        let response = match transport.oneshot(request.clone()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(method = %request.method, url = %request.url, error = %err, "request failed");
                self.observers.on_request_error(&arg, &request, &err);
                return Err(err);
            }
        };

        if !response.is_success() {
            let err = HttpError::Status {
                status: response.status.as_u16(),
            };
            debug!(url = %request.url, status = response.status.as_u16(), "response rejected");
            self.observers.on_response_error(&arg, &response, &err);
            return Err(err);
        }

        self.observers.on_response_received(&arg, &response);
        Ok(response)
    }

    async fn build_request(&self, arg: &A) -> Result<HttpRequest, HttpError> {
        let raw_url = (self.url_provider)(arg.clone())
            .await
            .map_err(HttpError::Build)?;
        let url = Url::parse(&raw_url).map_err(|source| HttpError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        if let Some(contribution) = (self.headers_provider)(arg.clone())
            .await
            .map_err(HttpError::Build)?
        {
            contribution.apply_to(&mut headers).map_err(HttpError::Build)?;
        }

        let body = (self.body_serializer)(arg.clone())
            .await
            .map_err(HttpError::Build)?;

        Ok(HttpRequest::new(self.method, url)
            .with_headers(headers)
            .with_body(body)
            .with_timeout(self.timeout))
    }
}

/// Custom headers plus an explicit content type are merged, custom first.
/// Otherwise the custom provider stands alone and the content type (or
/// [`DEFAULT_CONTENT_TYPE`]) is only used when no custom provider is given.
fn resolve_headers<A: OperationArg>(
    headers_provider: HeadersProviderComponent<A>,
    content_type: Option<String>,
) -> Result<Arc<HeadersProviderFn<A>>, HttpError> {
    match content_type {
        Some(content_type) if !headers_provider.is_absent() => {
            let custom = resolve(
                headers_provider,
                &["get"],
                ResolveOptions::named("headersProvider"),
            )?;
            let composite: HeadersProviderComponent<A> = Component::Object(Arc::new(
                CompositeHeadersProvider::from_fns(vec![custom, content_type_headers(content_type)]),
            ));
            Ok(resolve(composite, &["get"], ResolveOptions::default())?)
        }
        content_type => {
            let content_type = content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            let fallback = sync_provider_fn(move || {
                Component::Function(content_type_headers::<A>(content_type.clone()))
            });
            Ok(resolve(
                headers_provider,
                &["get"],
                ResolveOptions::named("headersProvider")
                    .with_default_provider(Component::Function(fallback)),
            )?)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
