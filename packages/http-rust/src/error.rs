//! Error types for the HTTP pipeline and the result providers.

use toolbelt_core::ComponentError;

/// Errors raised while configuring or running an [`HttpOperator`](crate::HttpOperator).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// A URL, header, or body provider failed while the request was being built.
    #[error("failed to build request: {0}")]
    Build(#[source] anyhow::Error),
    #[error("{0}")]
    Network(#[source] anyhow::Error),
    #[error("The operation was aborted due to timeout")]
    Timeout { timeout_ms: u64 },
    #[error("Unexpected status code: {status}")]
    Status { status: u16 },
}

impl HttpError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Status code carried by [`HttpError::Status`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by [`HttpProvider`](crate::HttpProvider) and
/// [`HttpOptionalProvider`](crate::HttpOptionalProvider).
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Unable to obtain resource: {source}")]
    Unavailable { source: anyhow::Error },
    #[error("Failed to deserialize resource: {source}")]
    Deserialize { source: anyhow::Error },
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn messages_match_wire_expectations() {
        assert_eq!(HttpError::Status { status: 404 }.to_string(), "Unexpected status code: 404");
        assert_eq!(
            HttpError::Timeout { timeout_ms: 10 }.to_string(),
            "The operation was aborted due to timeout"
        );
        assert_eq!(
            HttpError::configuration("Must provide either url_provider or url").to_string(),
            "Must provide either url_provider or url"
        );
    }

    #[test]
    fn resource_error_keeps_cause() {
        let err = ResourceError::Unavailable {
            source: HttpError::Status { status: 500 }.into(),
        };
        assert_eq!(err.to_string(), "Unable to obtain resource: Unexpected status code: 500");
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "Unexpected status code: 500");
    }

    #[test]
    fn status_accessor() {
        assert_eq!(HttpError::Status { status: 503 }.status(), Some(503));
        assert_eq!(HttpError::Timeout { timeout_ms: 1 }.status(), None);
    }
}
