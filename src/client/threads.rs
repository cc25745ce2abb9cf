//! Thread search as seen by a chat client.
//!
//! Lookups are scoped to one assistant by metadata. When the scoped search
//! fails, one unscoped search is tried; when that fails too the caller gets an
//! empty list flagged as degraded instead of an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::headers::API_KEY_HEADER;

/// Page size used for thread listings.
pub const THREAD_PAGE_LIMIT: u32 = 100;

/// A conversation thread as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Metadata filter selecting one assistant's threads.
///
/// UUIDs name a concrete assistant; anything else names a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFilter {
    AssistantId(String),
    GraphId(String),
}

impl MetadataFilter {
    pub fn for_assistant(assistant_id: &str) -> Self {
        if Uuid::parse_str(assistant_id).is_ok() {
            MetadataFilter::AssistantId(assistant_id.to_string())
        } else {
            MetadataFilter::GraphId(assistant_id.to_string())
        }
    }
}

/// Body of `POST /threads/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataFilter>,
    pub limit: u32,
}

impl ThreadQuery {
    pub fn scoped(filter: MetadataFilter) -> Self {
        Self {
            metadata: Some(filter),
            limit: THREAD_PAGE_LIMIT,
        }
    }

    pub fn unscoped() -> Self {
        Self {
            metadata: None,
            limit: THREAD_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThreadSearchError {
    #[error("thread search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("base URL {0:?} is not absolute; a page origin is required")]
    RelativeBase(String),
}

/// The "search threads by metadata" capability.
#[async_trait]
pub trait ThreadSearch: Send + Sync {
    async fn search(&self, query: &ThreadQuery) -> Result<Vec<Thread>, ThreadSearchError>;
}

/// Result of [`list_threads`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadListing {
    pub threads: Vec<Thread>,
    /// Both lookups failed; `threads` is empty because of that, not because
    /// there are no threads.
    pub degraded: bool,
}

/// List `assistant_id`'s threads: scoped, then unscoped, then empty.
pub async fn list_threads<S>(search: &S, assistant_id: &str) -> ThreadListing
where
    S: ThreadSearch + ?Sized,
{
    if assistant_id.trim().is_empty() {
        return ThreadListing::default();
    }

    let scoped = ThreadQuery::scoped(MetadataFilter::for_assistant(assistant_id));
    let err = match search.search(&scoped).await {
        Ok(threads) => return ThreadListing { threads, degraded: false },
        Err(err) => err,
    };
    tracing::warn!(error = %err, assistant_id, "Scoped thread search failed; retrying unscoped");

    match search.search(&ThreadQuery::unscoped()).await {
        Ok(threads) => ThreadListing { threads, degraded: false },
        Err(err) => {
            tracing::warn!(error = %err, "Unscoped thread search failed; returning no threads");
            ThreadListing {
                threads: Vec::new(),
                degraded: true,
            }
        }
    }
}

/// [`ThreadSearch`] over HTTP against a base URL (proxy or direct).
#[derive(Debug, Clone)]
pub struct HttpThreadSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpThreadSearch {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ThreadSearch for HttpThreadSearch {
    async fn search(&self, query: &ThreadQuery) -> Result<Vec<Thread>, ThreadSearchError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ThreadSearchError::RelativeBase(self.base_url.clone()));
        }

        let url = format!("{}/threads/search", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(url).json(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let threads = request
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Thread>>()
            .await?;
        Ok(threads)
    }
}
