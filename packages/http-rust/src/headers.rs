//! Header contributions and the composite header provider.
//!
//! Merge rule across representations: a list appends, a scalar overwrites.
//! Contributions are applied strictly in provider order, so a later scalar
//! erases earlier values for that name and a later list adds after them.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use toolbelt_core::{
    optional_provider_fn, resolve, ComponentError, OptionalProvider, ResolveOptions,
};

use crate::traits::{HeadersProviderComponent, HeadersProviderFn};

/// Value side of a [`HeaderContribution::Fields`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Overwrites any earlier values for the name.
    One(String),
    /// Appended after any earlier values for the name.
    Many(Vec<String>),
}

/// Headers offered by one provider.
#[derive(Debug, Clone)]
pub enum HeaderContribution {
    /// Each name present replaces all earlier values for that name.
    Map(HeaderMap),
    /// Applied as successive overwrites, in order.
    Pairs(Vec<(String, String)>),
    /// Per-field: [`FieldValue::One`] overwrites, [`FieldValue::Many`] appends.
    Fields(Vec<(String, FieldValue)>),
}

impl HeaderContribution {
    pub fn pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Merge this contribution into `headers`.
    ///
    /// # Errors
    ///
    /// Fails on the first name or value that is not a valid HTTP header.
    pub fn apply_to(self, headers: &mut HeaderMap) -> anyhow::Result<()> {
        match self {
            Self::Map(map) => {
                for name in map.keys() {
                    headers.remove(name);
                }
                for (name, value) in &map {
                    headers.append(name.clone(), value.clone());
                }
            }
            Self::Pairs(pairs) => {
                for (name, value) in pairs {
                    headers.insert(header_name(&name)?, header_value(&value)?);
                }
            }
            Self::Fields(fields) => {
                for (name, value) in fields {
                    let name = header_name(&name)?;
                    match value {
                        FieldValue::One(value) => {
                            headers.insert(name, header_value(&value)?);
                        }
                        FieldValue::Many(values) => {
                            for value in values {
                                headers.append(name.clone(), header_value(&value)?);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<HeaderMap> for HeaderContribution {
    fn from(map: HeaderMap) -> Self {
        Self::Map(map)
    }
}

fn header_name(name: &str) -> anyhow::Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid header name {name:?}: {e}"))
}

fn header_value(value: &str) -> anyhow::Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| anyhow::anyhow!("invalid header value {value:?}: {e}"))
}

/// Provider contributing a single `Content-Type` header.
#[must_use]
pub fn content_type_headers<A: Send + 'static>(
    content_type: impl Into<String>,
) -> Arc<HeadersProviderFn<A>> {
    let content_type = content_type.into();
    optional_provider_fn(move |_arg: A| {
        let contribution =
            HeaderContribution::pairs([(CONTENT_TYPE.as_str(), content_type.as_str())]);
        async move { Ok(Some(contribution)) }
    })
}

// ---------------------------------------------------------------------------
// CompositeHeadersProvider
// ---------------------------------------------------------------------------

/// Asks every provider concurrently and merges their contributions in list order.
pub struct CompositeHeadersProvider<A> {
    providers: Vec<Arc<HeadersProviderFn<A>>>,
}

impl<A> CompositeHeadersProvider<A>
where
    A: Clone + Send + 'static,
{
    /// # Errors
    ///
    /// Returns [`ComponentError`] for the first provider that cannot be resolved.
    pub fn new(providers: Vec<HeadersProviderComponent<A>>) -> Result<Self, ComponentError> {
        let providers = providers
            .into_iter()
            .map(|provider| resolve(provider, &["get"], ResolveOptions::named("headersProvider")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { providers })
    }

    #[must_use]
    pub fn from_fns(providers: Vec<Arc<HeadersProviderFn<A>>>) -> Self {
        Self { providers }
    }

    /// Build one header set for `arg`.
    ///
    /// # Errors
    ///
    /// Returns the first failure in list order, whether from a provider or
    /// from an invalid header in its contribution.
    pub async fn merge(&self, arg: A) -> anyhow::Result<HeaderMap> {
        let results = join_all(self.providers.iter().map(|provider| provider(arg.clone()))).await;

        let mut headers = HeaderMap::new();
        for contribution in results {
            if let Some(contribution) = contribution? {
                contribution.apply_to(&mut headers)?;
            }
        }
        Ok(headers)
    }
}

#[async_trait]
impl<A> OptionalProvider<HeaderContribution, A> for CompositeHeadersProvider<A>
where
    A: Clone + Send + Sync + 'static,
{
    async fn get(&self, arg: A) -> anyhow::Result<Option<HeaderContribution>> {
        Ok(Some(HeaderContribution::Map(self.merge(arg).await?)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use toolbelt_core::Component;

    use super::*;

    fn fixed(contribution: Option<HeaderContribution>) -> HeadersProviderComponent<()> {
        Component::Function(optional_provider_fn(move |()| {
            let contribution = contribution.clone();
            async move { Ok(contribution) }
        }))
    }

    fn delayed(delay_ms: u64, contribution: HeaderContribution) -> HeadersProviderComponent<()> {
        Component::Function(optional_provider_fn(move |()| {
            let contribution = contribution.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Some(contribution))
            }
        }))
    }

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn many(values: &[&str]) -> FieldValue {
        FieldValue::Many(values.iter().map(ToString::to_string).collect())
    }

    async fn merge(providers: Vec<HeadersProviderComponent<()>>) -> HeaderMap {
        CompositeHeadersProvider::new(providers).unwrap().merge(()).await.unwrap()
    }

    #[tokio::test]
    async fn later_pairs_overwrite_earlier_ones() {
        let headers = merge(vec![
            fixed(Some(HeaderContribution::pairs([("x-token", "a"), ("accept", "text/html")]))),
            fixed(Some(HeaderContribution::pairs([("X-Token", "b")]))),
        ])
        .await;
        assert_eq!(values(&headers, "x-token"), ["b"]);
        assert_eq!(values(&headers, "accept"), ["text/html"]);
    }

    #[tokio::test]
    async fn map_replaces_values_per_name() {
        let mut map = HeaderMap::new();
        map.append("x-tag", HeaderValue::from_static("m1"));
        map.append("x-tag", HeaderValue::from_static("m2"));
        let headers = merge(vec![
            fixed(Some(HeaderContribution::fields([("x-tag", many(&["f1", "f2"]))]))),
            fixed(Some(map.into())),
        ])
        .await;
        assert_eq!(values(&headers, "x-tag"), ["m1", "m2"]);
    }

    #[tokio::test]
    async fn list_appends_after_scalar() {
        let headers = merge(vec![
            fixed(Some(HeaderContribution::fields([("x-tag", FieldValue::One("first".into()))]))),
            fixed(Some(HeaderContribution::fields([("x-tag", many(&["second", "third"]))]))),
        ])
        .await;
        assert_eq!(values(&headers, "x-tag"), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn scalar_erases_earlier_list() {
        let headers = merge(vec![
            fixed(Some(HeaderContribution::fields([("x-tag", many(&["first", "second"]))]))),
            fixed(Some(HeaderContribution::pairs([("x-tag", "last")]))),
        ])
        .await;
        assert_eq!(values(&headers, "x-tag"), ["last"]);
    }

    #[tokio::test]
    async fn absent_contributions_are_skipped() {
        let headers = merge(vec![
            fixed(None),
            fixed(Some(HeaderContribution::pairs([("accept", "*/*")]))),
            fixed(None),
        ])
        .await;
        assert_eq!(headers.len(), 1);
    }

    #[tokio::test]
    async fn applies_in_list_order_not_completion_order() {
        let headers = merge(vec![
            delayed(50, HeaderContribution::pairs([("x-winner", "slow-first")])),
            delayed(0, HeaderContribution::pairs([("x-winner", "fast-second")])),
        ])
        .await;
        assert_eq!(values(&headers, "x-winner"), ["fast-second"]);
    }

    #[tokio::test]
    async fn first_failure_in_list_order_wins() {
        let failing = |message: &'static str, delay_ms: u64| -> HeadersProviderComponent<()> {
            Component::Function(optional_provider_fn(move |()| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(anyhow::anyhow!(message))
            }))
        };
        let composite =
            CompositeHeadersProvider::new(vec![failing("first", 40), failing("second", 0)]).unwrap();
        let err = composite.merge(()).await.unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[tokio::test]
    async fn invalid_header_name_fails_the_merge() {
        let bad = fixed(Some(HeaderContribution::pairs([("bad name", "v")])));
        let composite = CompositeHeadersProvider::new(vec![bad]).unwrap();
        let err = composite.merge(()).await.unwrap_err();
        assert!(err.to_string().contains("invalid header name"));
    }

    #[tokio::test]
    async fn composite_is_itself_a_headers_provider() {
        let inner =
            CompositeHeadersProvider::new(vec![fixed(Some(HeaderContribution::pairs([("x-inner", "1")])))])
                .unwrap();
        let inner: HeadersProviderComponent<()> = Component::Object(Arc::new(inner));
        let outer = CompositeHeadersProvider::new(vec![
            inner,
            Component::Function(content_type_headers("text/plain")),
        ])
        .unwrap();
        let headers = outer.merge(()).await.unwrap();
        assert_eq!(values(&headers, "x-inner"), ["1"]);
        assert_eq!(values(&headers, "content-type"), ["text/plain"]);
    }

    #[test]
    fn absent_provider_is_rejected() {
        let err = CompositeHeadersProvider::<()>::new(vec![Component::Absent]).err().unwrap();
        assert_eq!(err.message(), "Invalid headersProvider");
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        fn token() -> impl Strategy<Value = String> {
            "[a-z0-9]{1,8}"
        }

        proptest! {
            #[test]
            fn lists_accumulate_and_scalars_reset(
                steps in prop::collection::vec(
                    prop_oneof![
                        token().prop_map(FieldValue::One),
                        prop::collection::vec(token(), 1..4).prop_map(FieldValue::Many),
                    ],
                    1..8,
                )
            ) {
                let mut headers = HeaderMap::new();
                let mut expected: Vec<String> = Vec::new();
                for step in steps {
                    match &step {
                        FieldValue::One(value) => expected = vec![value.clone()],
                        FieldValue::Many(more) => expected.extend(more.iter().cloned()),
                    }
                    HeaderContribution::fields([("x-tag", step)])
                        .apply_to(&mut headers)
                        .unwrap();
                }
                prop_assert_eq!(values(&headers, "x-tag"), expected);
            }
        }
    }
}
