//! Index service response types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for index service calls
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// A document shown in the post-run sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleDocument {
    pub title: String,
    pub category: String,
}

/// Read-only projection of the index used for human verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub document_count: u64,
    pub sample_documents: Vec<SampleDocument>,
}

/// Body of `GET /{index}/_count`
#[derive(Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: u64,
}

/// Body of `GET /{index}/_search`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub hits: SearchHits,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchHits {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(rename = "_source", default)]
    pub source: serde_json::Map<String, serde_json::Value>,
}

impl SearchHit {
    /// Project the display fields, `plan_type` taking precedence over `category`
    pub fn to_sample(&self) -> SampleDocument {
        let field = |name: &str| {
            self.source
                .get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        SampleDocument {
            title: field("title").unwrap_or_else(|| "No title".to_string()),
            category: field("plan_type")
                .or_else(|| field("category"))
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}
