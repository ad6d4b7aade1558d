//! HTTP client for the remote document index

use crate::core::IndexServiceConfig;
use crate::index::{
    response::{CountResponse, SearchHit, SearchResponse},
    IndexError, IndexService, SampleDocument,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// User-Agent string for index requests.
const USER_AGENT: &str = concat!("corpus-pipeline/", env!("CARGO_PKG_VERSION"));

/// Elasticsearch-compatible index client
#[derive(Debug, Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
    index_name: String,
}

impl ElasticClient {
    /// Build a client from configuration
    ///
    /// Every request carries `Authorization: ApiKey <credential>` when a
    /// credential is configured, and the configured timeout.
    pub fn new(config: &IndexServiceConfig) -> Result<Self, IndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.credential {
            let mut value = HeaderValue::from_str(&format!("ApiKey {}", key)).map_err(|e| {
                IndexError::Decode {
                    url: config.base_url().to_string(),
                    reason: format!("invalid credential header: {}", e),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|source| IndexError::Http {
                url: config.base_url().to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            index_name: config.index_name.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, IndexError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| IndexError::Http { url: url.clone(), source })?;

        if response.status() != StatusCode::OK {
            return Err(IndexError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| IndexError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl IndexService for ElasticClient {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn ping(&self) -> Result<(), IndexError> {
        let url = self.url("/");
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| IndexError::Http { url: url.clone(), source })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => {
                warn!("Index service liveness check returned {}", status);
                Err(IndexError::Status {
                    url,
                    status: status.as_u16(),
                })
            }
        }
    }

    async fn count(&self) -> Result<u64, IndexError> {
        let url = self.url(&format!("/{}/_count", self.index_name));
        let body: CountResponse = self.get_json(url).await?;
        Ok(body.count)
    }

    async fn sample(&self, size: usize) -> Result<Vec<SampleDocument>, IndexError> {
        let url = self.url(&format!("/{}/_search?size={}", self.index_name, size));
        let body: SearchResponse = self.get_json(url).await?;
        Ok(body.hits.hits.iter().map(SearchHit::to_sample).collect())
    }
}
