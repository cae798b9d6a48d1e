use async_trait::async_trait;
use shared::protocol::PageEnvelope;

use crate::{error::FetchError, query::QueryState};

/// One page of rows plus the total row count across all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
}

impl<T> ResultPage<T> {
    pub fn new(rows: Vec<T>, total_count: u64) -> Self {
        Self { rows, total_count }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl<T> Default for ResultPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<PageEnvelope<T>> for ResultPage<T> {
    fn from(envelope: PageEnvelope<T>) -> Self {
        Self::new(envelope.data, envelope.meta.total)
    }
}

/// Where a list controller gets its pages from.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, query: &QueryState) -> Result<ResultPage<T>, FetchError>;
}
