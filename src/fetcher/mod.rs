pub mod http_fetcher;
pub mod parser;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{SearchQuery, WorkSummary};

pub use http_fetcher::HttpSource;

/// Where works come from.
///
/// `search` returns summaries in the order the archive gave them; no
/// sorting happens here. `fetch_work` returns the work's plain text.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<WorkSummary>>;

    async fn fetch_work(&self, link: &str) -> Result<String>;
}
