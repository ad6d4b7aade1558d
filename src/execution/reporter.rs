//! Post-run summary of what landed in the index

use crate::index::{IndexError, IndexService, IndexSummary};
use tracing::{debug, warn};

/// Queries the index for a document count and a small sample
///
/// Read-only. A failure here is advisory and never changes the outcome of
/// the run. Once the count is known, a failed sample query only empties the
/// sample.
pub struct ResultReporter<'a> {
    index: &'a dyn IndexService,
    sample_size: usize,
}

impl<'a> ResultReporter<'a> {
    pub fn new(index: &'a dyn IndexService, sample_size: usize) -> Self {
        Self { index, sample_size }
    }

    pub async fn summarize(&self) -> Result<IndexSummary, IndexError> {
        debug!("Summarizing index {}", self.index.index_name());
        let document_count = self.index.count().await?;
        let sample_documents = match self.index.sample(self.sample_size).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Could not fetch sample documents: {}", e);
                Vec::new()
            }
        };

        Ok(IndexSummary {
            document_count,
            sample_documents,
        })
    }
}
