//! Pluggable contracts consumed by the HTTP pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use toolbelt_core::{
    optional_provider_fn, provider_fn, Capable, Component, OptionalProviderComponent,
    OptionalProviderFn, ProviderComponent, ProviderFn,
};

use crate::headers::HeaderContribution;
use crate::transport::HttpResponse;

/// Produces the request URL for an argument. Capability `"get"`.
pub type UrlProviderComponent<A> = ProviderComponent<String, A>;

/// Contributes request headers for an argument. Capability `"get"`.
pub type HeadersProviderComponent<A> = OptionalProviderComponent<HeaderContribution, A>;
pub type HeadersProviderFn<A> = OptionalProviderFn<HeaderContribution, A>;

// ---------------------------------------------------------------------------
// BodySerializer
// ---------------------------------------------------------------------------

/// Turns the invocation argument into a request body. `None` sends no body.
/// Exposed under the capability name `"serialize"`.
#[async_trait]
pub trait BodySerializer<A>: Send + Sync {
    async fn serialize(&self, arg: A) -> anyhow::Result<Option<Bytes>>;
}

pub type BodySerializerFn<A> = OptionalProviderFn<Bytes, A>;
pub type BodySerializerComponent<A> = Component<dyn BodySerializer<A>, BodySerializerFn<A>>;

impl<A: Send + 'static> Capable<BodySerializerFn<A>> for dyn BodySerializer<A> {
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<BodySerializerFn<A>>> {
        if name != "serialize" {
            return None;
        }
        let bound: Arc<BodySerializerFn<A>> = Arc::new(move |arg: A| {
            let this = Arc::clone(&self);
            async move { this.serialize(arg).await }.boxed()
        });
        Some(bound)
    }
}

/// Serializer that never produces a body.
#[must_use]
pub fn no_body<A: Send + 'static>() -> Arc<BodySerializerFn<A>> {
    optional_provider_fn(|_arg: A| async { Ok(None) })
}

/// Serializer that encodes the argument as JSON.
///
/// An argument that encodes to `null` (such as `()` or `None`) sends no body.
#[must_use]
pub fn json_serializer<A: Serialize + Send + 'static>() -> Arc<BodySerializerFn<A>> {
    optional_provider_fn(|arg: A| {
        let body = serde_json::to_vec(&arg)
            .map(|bytes| (bytes != b"null").then(|| Bytes::from(bytes)))
            .map_err(anyhow::Error::from);
        async move { body }
    })
}

// ---------------------------------------------------------------------------
// ResponseDeserializer
// ---------------------------------------------------------------------------

/// Maps a successful response to a typed value.
/// Exposed under the capability name `"deserialize"`.
#[async_trait]
pub trait ResponseDeserializer<R>: Send + Sync {
    async fn deserialize(&self, response: HttpResponse) -> anyhow::Result<R>;
}

pub type ResponseDeserializerFn<R> = ProviderFn<R, HttpResponse>;
pub type ResponseDeserializerComponent<R> =
    Component<dyn ResponseDeserializer<R>, ResponseDeserializerFn<R>>;

impl<R: Send + 'static> Capable<ResponseDeserializerFn<R>> for dyn ResponseDeserializer<R> {
    fn capability(self: Arc<Self>, name: &str) -> Option<Arc<ResponseDeserializerFn<R>>> {
        if name != "deserialize" {
            return None;
        }
        let bound: Arc<ResponseDeserializerFn<R>> = Arc::new(move |response: HttpResponse| {
            let this = Arc::clone(&self);
            async move { this.deserialize(response).await }.boxed()
        });
        Some(bound)
    }
}

/// Deserializer that parses the response body as JSON.
#[must_use]
pub fn json_deserializer<R: DeserializeOwned + Send + 'static>() -> Arc<ResponseDeserializerFn<R>> {
    provider_fn(|response: HttpResponse| {
        let value = response.json::<R>().map_err(anyhow::Error::from);
        async move { value }
    })
}
