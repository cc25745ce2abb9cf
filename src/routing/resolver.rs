//! Upstream resolution by precedence chain.

use std::sync::Arc;

use url::Url;

use crate::config::UpstreamConfig;
use crate::routing::source::{
    parse_upstream_url, CandidateExtractor, CandidateSource, CookieExtractor, HeaderExtractor,
    QueryExtractor, RequestView,
};
use crate::security::ApiKey;

/// The backend a single request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpstream {
    pub base_url: Url,
    pub source: CandidateSource,
    pub credential: Option<ApiKey>,
}

/// Decides the upstream for each request.
///
/// Holds only read-only configuration; `resolve` is pure and cheap, so it runs
/// fresh for every request.
#[derive(Debug, Clone)]
pub struct UpstreamResolver {
    extractors: Arc<[Box<dyn CandidateExtractor>]>,
    default_url: Url,
    credential: Option<ApiKey>,
}

impl UpstreamResolver {
    /// Build a resolver with the standard cookie → header → query chain.
    ///
    /// A default URL that fails to parse is replaced by the literal fallback;
    /// config validation normally rejects it before this point.
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let default_url = parse_upstream_url(&config.default_url)
            .or_else(|| parse_upstream_url(crate::config::schema::FALLBACK_UPSTREAM_URL))
            .expect("fallback upstream literal is a valid URL");

        Self {
            extractors: Arc::from(vec![
                Box::new(CookieExtractor) as Box<dyn CandidateExtractor>,
                Box::new(HeaderExtractor),
                Box::new(QueryExtractor),
            ]),
            default_url,
            credential: config.api_key.clone(),
        }
    }

    /// Pick the upstream for one request. Never fails.
    pub fn resolve(&self, request: RequestView<'_>) -> ResolvedUpstream {
        let chosen = self.extractors.iter().find_map(|extractor| {
            let candidate = extractor.extract(request);
            let url = candidate.as_deref().and_then(parse_upstream_url);
            if candidate.is_some() && url.is_none() {
                tracing::debug!(source = %extractor.source(), "Ignoring malformed upstream candidate");
            }
            url.map(|url| (url, extractor.source()))
        });

        let (base_url, source) =
            chosen.unwrap_or_else(|| (self.default_url.clone(), CandidateSource::EnvironmentDefault));

        tracing::debug!(source = %source, upstream = %base_url, "Resolved upstream");

        ResolvedUpstream {
            base_url,
            source,
            credential: self.credential.clone(),
        }
    }
}
