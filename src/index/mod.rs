//! Remote document index access

pub mod client;
pub mod response;

use async_trait::async_trait;
pub use client::ElasticClient;
pub use response::{IndexError, IndexSummary, SampleDocument};

/// Trait for index access - allows for fake indexes in tests
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Name of the index queried by `count` and `sample`
    fn index_name(&self) -> &str;

    /// Liveness check against the service root
    async fn ping(&self) -> Result<(), IndexError>;

    /// Number of documents in the index
    async fn count(&self) -> Result<u64, IndexError>;

    /// Up to `size` documents for display
    async fn sample(&self, size: usize) -> Result<Vec<SampleDocument>, IndexError>;
}
