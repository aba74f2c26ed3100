//! Toolbelt HTTP: a configurable request pipeline over a tower transport,
//! composite header merging, and providers that turn responses into values.

pub mod error;
pub mod headers;
pub mod observer;
pub mod operator;
pub mod provider;
pub mod traits;
pub mod transport;

pub use error::{HttpError, ResourceError};
pub use headers::{content_type_headers, CompositeHeadersProvider, FieldValue, HeaderContribution};
pub use observer::{CompositeHttpObserver, HttpObserver};
pub use operator::{HttpOperator, HttpOperatorOptions, OperationArg, DEFAULT_CONTENT_TYPE};
pub use provider::{HttpOptionalProvider, HttpProvider, HttpProviderOptions};
pub use traits::{
    json_deserializer, json_serializer, no_body, BodySerializer, BodySerializerComponent,
    BodySerializerFn, HeadersProviderComponent, HeadersProviderFn, ResponseDeserializer,
    ResponseDeserializerComponent, ResponseDeserializerFn, UrlProviderComponent,
};
pub use transport::{
    build_transport_stack, BoxTransport, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport,
    TransportConfig,
};
