//! Result providers: an [`HttpOperator`] plus a response deserializer.
//!
//! [`HttpProvider`] turns every failure into [`ResourceError::Unavailable`].
//! [`HttpOptionalProvider`] answers `None` when the request itself fails, but
//! still reports [`ResourceError::Deserialize`] when a successful response
//! cannot be decoded.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use toolbelt_core::{resolve, Component, OptionalProvider, Provider, ResolveOptions};

use crate::error::{HttpError, ResourceError};
use crate::operator::{HttpOperator, HttpOperatorOptions, OperationArg};
use crate::traits::{json_deserializer, ResponseDeserializerComponent, ResponseDeserializerFn};

/// Construction options shared by [`HttpProvider`] and [`HttpOptionalProvider`].
pub struct HttpProviderOptions<R, A> {
    /// Pre-built operator. When set, `operator` is ignored.
    pub http_operator: Option<Arc<HttpOperator<A>>>,
    /// Options used to build a private operator.
    pub operator: HttpOperatorOptions<A>,
    /// Capability `"deserialize"`. Falls back to JSON under `new`; required
    /// by `with_deserializer`.
    pub response_deserializer: ResponseDeserializerComponent<R>,
}

impl<R, A> HttpProviderOptions<R, A> {
    #[must_use]
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            operator: HttpOperatorOptions::for_url(url),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn shared(http_operator: Arc<HttpOperator<A>>) -> Self {
        Self {
            http_operator: Some(http_operator),
            ..Self::default()
        }
    }
}

impl<R, A> Default for HttpProviderOptions<R, A> {
    fn default() -> Self {
        Self {
            http_operator: None,
            operator: HttpOperatorOptions::default(),
            response_deserializer: Component::Absent,
        }
    }
}

/// Operator and deserializer resolved from [`HttpProviderOptions`].
struct Resolved<R, A> {
    operator: Arc<HttpOperator<A>>,
    deserialize: Arc<ResponseDeserializerFn<R>>,
}

impl<R, A> Resolved<R, A>
where
    R: Send + 'static,
    A: OperationArg,
{
    fn new(
        name: &str,
        options: HttpProviderOptions<R, A>,
        fallback: Option<Arc<ResponseDeserializerFn<R>>>,
    ) -> Result<Self, HttpError> {
        let HttpProviderOptions {
            http_operator,
            operator,
            response_deserializer,
        } = options;

        let operator = match http_operator {
            Some(shared) => shared,
            None if operator.has_url() => Arc::new(HttpOperator::new(operator)?),
            None => {
                return Err(HttpError::configuration(format!(
                    "{name} requires either an http_operator, url, or url_provider to be provided."
                )));
            }
        };

        let mut deserializer_options = ResolveOptions::named("responseDeserializer");
        if let Some(fallback) = fallback {
            deserializer_options = deserializer_options.with_default(Component::Function(fallback));
        }
        let deserialize = resolve(response_deserializer, &["deserialize"], deserializer_options)?;

        Ok(Self {
            operator,
            deserialize,
        })
    }
}

// ---------------------------------------------------------------------------
// HttpProvider
// ---------------------------------------------------------------------------

/// A [`Provider`] backed by an HTTP request.
pub struct HttpProvider<R, A> {
    inner: Resolved<R, A>,
}

impl<R, A> HttpProvider<R, A>
where
    R: DeserializeOwned + Send + 'static,
    A: OperationArg,
{
    /// Build a provider that decodes JSON unless `response_deserializer` is set.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Configuration`] when neither an operator nor a
    /// URL source is given, or any error from building the operator.
    pub fn new(options: HttpProviderOptions<R, A>) -> Result<Self, HttpError> {
        Ok(Self {
            inner: Resolved::new("HttpProvider", options, Some(json_deserializer::<R>()))?,
        })
    }
}

impl<R, A> HttpProvider<R, A>
where
    R: Send + 'static,
    A: OperationArg,
{
    /// Build a provider for any `R`, decoded by the required
    /// `response_deserializer`.
    ///
    /// # Errors
    ///
    /// As [`HttpProvider::new`], plus [`HttpError::Component`] when no
    /// deserializer is given.
    pub fn with_deserializer(options: HttpProviderOptions<R, A>) -> Result<Self, HttpError> {
        Ok(Self {
            inner: Resolved::new("HttpProvider", options, None)?,
        })
    }

    /// The operator performing the requests, e.g. to subscribe observers.
    #[must_use]
    pub fn operator(&self) -> &Arc<HttpOperator<A>> {
        &self.inner.operator
    }

    async fn fetch(&self, arg: A) -> anyhow::Result<R> {
        let response = self.inner.operator.perform(arg).await?;
        (self.inner.deserialize)(response).await
    }
}

#[async_trait]
impl<R, A> Provider<R, A> for HttpProvider<R, A>
where
    R: Send + 'static,
    A: OperationArg,
{
    async fn get(&self, arg: A) -> anyhow::Result<R> {
        self.fetch(arg)
            .await
            .map_err(|source| ResourceError::Unavailable { source }.into())
    }
}

// ---------------------------------------------------------------------------
// HttpOptionalProvider
// ---------------------------------------------------------------------------

/// An [`OptionalProvider`] backed by an HTTP request.
pub struct HttpOptionalProvider<R, A> {
    inner: Resolved<R, A>,
}

impl<R, A> HttpOptionalProvider<R, A>
where
    R: DeserializeOwned + Send + 'static,
    A: OperationArg,
{
    /// # Errors
    ///
    /// Same as [`HttpProvider::new`].
    pub fn new(options: HttpProviderOptions<R, A>) -> Result<Self, HttpError> {
        Ok(Self {
            inner: Resolved::new(
                "HttpOptionalProvider",
                options,
                Some(json_deserializer::<R>()),
            )?,
        })
    }
}

impl<R, A> HttpOptionalProvider<R, A>
where
    R: Send + 'static,
    A: OperationArg,
{
    /// # Errors
    ///
    /// Same as [`HttpProvider::with_deserializer`].
    pub fn with_deserializer(options: HttpProviderOptions<R, A>) -> Result<Self, HttpError> {
        Ok(Self {
            inner: Resolved::new("HttpOptionalProvider", options, None)?,
        })
    }

    #[must_use]
    pub fn operator(&self) -> &Arc<HttpOperator<A>> {
        &self.inner.operator
    }
}

#[async_trait]
impl<R, A> OptionalProvider<R, A> for HttpOptionalProvider<R, A>
where
    R: Send + 'static,
    A: OperationArg,
{
    async fn get(&self, arg: A) -> anyhow::Result<Option<R>> {
        let response = match self.inner.operator.perform(arg).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "resource unavailable, yielding none");
                return Ok(None);
            }
        };

        match (self.inner.deserialize)(response).await {
            Ok(value) => Ok(Some(value)),
            Err(source) => Err(ResourceError::Deserialize { source }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use serde::{Deserialize, Serialize};
    use toolbelt_core::provider_fn;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::observer::HttpObserver;
    use crate::traits::ResponseDeserializer;
    use crate::transport::HttpResponse;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    async fn server_with(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn user_url(server: &MockServer) -> String {
        format!("{}/users/1", server.uri())
    }

    fn options<R>(server: &MockServer) -> HttpProviderOptions<R, ()> {
        HttpProviderOptions::for_url(user_url(server))
    }

    #[test]
    fn requires_some_url_source() {
        let err = HttpProvider::<User, ()>::new(HttpProviderOptions::default()).err().unwrap();
        assert_eq!(
            err.to_string(),
            "HttpProvider requires either an http_operator, url, or url_provider to be provided."
        );

        let err = HttpOptionalProvider::<User, ()>::new(HttpProviderOptions::default())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "HttpOptionalProvider requires either an http_operator, url, or url_provider to be provided."
        );
    }

    #[test]
    fn empty_url_is_not_a_url_source() {
        let err = HttpProvider::<User, ()>::new(HttpProviderOptions::for_url("")).err().unwrap();
        assert!(matches!(err, HttpError::Configuration(_)));

        let err = HttpOptionalProvider::<User, ()>::new(HttpProviderOptions::for_url(""))
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "HttpOptionalProvider requires either an http_operator, url, or url_provider to be provided."
        );
    }

    #[tokio::test]
    async fn malformed_url_fails_at_construction() {
        let err = HttpOptionalProvider::<User, ()>::new(HttpProviderOptions::for_url("::nope"))
            .err()
            .unwrap();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn provider_deserializes_json() {
        let server = server_with(200, r#"{"id":1,"name":"ada"}"#).await;
        let provider = HttpProvider::new(options::<User>(&server)).unwrap();
        let user = provider.get(()).await.unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "ada".to_string()
            }
        );
    }

    #[tokio::test]
    async fn provider_wraps_status_errors() {
        let server = server_with(500, "").await;
        let provider = HttpProvider::new(options::<User>(&server)).unwrap();
        let err = provider.get(()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to obtain resource: Unexpected status code: 500");

        let resource = err.downcast_ref::<ResourceError>().unwrap();
        let ResourceError::Unavailable { source } = resource else {
            panic!("expected Unavailable, got {resource:?}");
        };
        assert!(matches!(
            source.downcast_ref::<HttpError>(),
            Some(HttpError::Status { status: 500 })
        ));
    }

    #[tokio::test]
    async fn provider_wraps_deserialization_errors() {
        let server = server_with(200, "not json").await;
        let provider = HttpProvider::new(options::<User>(&server)).unwrap();
        let err = provider.get(()).await.unwrap_err();
        assert!(err.to_string().starts_with("Unable to obtain resource: "));
        assert!(err.downcast_ref::<ResourceError>().unwrap().source().is_some());
    }

    #[tokio::test]
    async fn optional_provider_yields_value() {
        let server = server_with(200, r#"{"id":1,"name":"ada"}"#).await;
        let provider = HttpOptionalProvider::new(options::<User>(&server)).unwrap();
        assert_eq!(provider.get(()).await.unwrap().map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn optional_provider_swallows_status_errors() {
        for status in [500, 404] {
            let server = server_with(status, "").await;
            let provider = HttpOptionalProvider::new(options::<User>(&server)).unwrap();
            assert_eq!(provider.get(()).await.unwrap(), None, "status {status}");
        }
    }

    #[tokio::test]
    async fn optional_provider_swallows_network_errors() {
        let provider =
            HttpOptionalProvider::<User, ()>::new(HttpProviderOptions::for_url("http://127.0.0.1:1/"))
                .unwrap();
        assert_eq!(provider.get(()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn optional_provider_reports_deserialization_errors() {
        let server = server_with(200, "{").await;
        let provider = HttpOptionalProvider::new(options::<User>(&server)).unwrap();
        let err = provider.get(()).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to deserialize resource: "));
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::Deserialize { .. })
        ));
    }

    #[tokio::test]
    async fn optional_provider_surfaces_custom_deserializer_failure() {
        let server = server_with(200, "OK").await;
        let failing: Arc<ResponseDeserializerFn<User>> =
            provider_fn(|_response: HttpResponse| async { Err(anyhow::anyhow!("No worky")) });
        let provider = HttpOptionalProvider::<User, ()>::new(HttpProviderOptions {
            response_deserializer: Component::Function(failing),
            ..HttpProviderOptions::for_url(user_url(&server))
        })
        .unwrap();
        let err = provider.get(()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to deserialize resource: No worky");
    }

    #[tokio::test]
    async fn custom_deserializer_object() {
        struct StatusOnly;

        #[async_trait]
        impl ResponseDeserializer<u16> for StatusOnly {
            async fn deserialize(&self, response: HttpResponse) -> anyhow::Result<u16> {
                Ok(response.status.as_u16())
            }
        }

        let server = server_with(202, "ignored").await;
        let provider = HttpProvider::<u16, ()>::new(HttpProviderOptions {
            response_deserializer: Component::Object(Arc::new(StatusOnly)),
            ..HttpProviderOptions::for_url(user_url(&server))
        })
        .unwrap();
        assert_eq!(provider.get(()).await.unwrap(), 202);
    }

    /// Decoded value with no serde support at all.
    #[derive(Debug, PartialEq)]
    struct BodyLength(usize);

    fn body_length() -> Arc<ResponseDeserializerFn<BodyLength>> {
        provider_fn(|response: HttpResponse| async move { Ok(BodyLength(response.body.len())) })
    }

    #[tokio::test]
    async fn explicit_deserializer_accepts_any_type() {
        let server = server_with(200, "four").await;

        let required = HttpProvider::<BodyLength, ()>::with_deserializer(HttpProviderOptions {
            response_deserializer: Component::Function(body_length()),
            ..HttpProviderOptions::for_url(user_url(&server))
        })
        .unwrap();
        assert_eq!(required.get(()).await.unwrap(), BodyLength(4));

        let optional =
            HttpOptionalProvider::<BodyLength, ()>::with_deserializer(HttpProviderOptions {
                response_deserializer: Component::Function(body_length()),
                ..HttpProviderOptions::for_url(user_url(&server))
            })
            .unwrap();
        assert_eq!(optional.get(()).await.unwrap(), Some(BodyLength(4)));
    }

    #[tokio::test]
    async fn explicit_deserializer_is_required_without_json() {
        let err = HttpProvider::<BodyLength, ()>::with_deserializer(HttpProviderOptions::for_url(
            "http://example.test/",
        ))
        .err()
        .unwrap();
        assert!(matches!(err, HttpError::Component(_)));
        assert_eq!(err.to_string(), "Invalid responseDeserializer");
    }

    #[tokio::test]
    async fn providers_can_share_one_operator() {
        #[derive(Default)]
        struct Counter(parking_lot::Mutex<u32>);

        impl HttpObserver<()> for Counter {
            fn on_response_received(&self, _arg: &(), _response: &HttpResponse) {
                *self.0.lock() += 1;
            }
        }

        let server = server_with(200, r#"{"id":1,"name":"ada"}"#).await;
        let operator =
            Arc::new(HttpOperator::<()>::new(HttpOperatorOptions::for_url(user_url(&server))).unwrap());
        let counter = Arc::new(Counter::default());
        operator.subscribe(counter.clone());

        let required: HttpProvider<User, ()> =
            HttpProvider::new(HttpProviderOptions::shared(Arc::clone(&operator))).unwrap();
        let optional: HttpOptionalProvider<User, ()> =
            HttpOptionalProvider::new(HttpProviderOptions::shared(Arc::clone(&operator))).unwrap();

        required.get(()).await.unwrap();
        optional.get(()).await.unwrap();
        assert!(Arc::ptr_eq(required.operator(), optional.operator()));
        assert_eq!(*counter.0.lock(), 2);
    }
}
