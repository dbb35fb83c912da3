//! Session state: search results, the loaded work and its pages, and the
//! coordinator that ties them to the bookmark store.
//!
//! Network calls run as spawned tasks. Their results come back over a
//! channel and are applied only when the owner of the [`Coordinator`]
//! drains it, so session state has a single writer.

pub mod bookmarks;
pub mod coordinator;
pub mod paginator;
pub mod search;
pub mod status;
pub mod work;

use std::future::Future;
use std::time::Duration;

use crate::app::{Ao3Error, Result};

pub use bookmarks::{is_bookmarked, toggle, BookmarkAction};
pub use coordinator::{Coordinator, SessionDeps, SessionSettings, ViewMode};
pub use paginator::{paginate, PageSet, DEFAULT_CHUNK_SIZE, NO_CONTENT_PAGE};
pub use search::{apply_sort, SearchOutcome, SearchResultSet, SearchSession};
pub use status::{Status, StatusLevel, StatusSink, TracingSink};
pub use work::{LoadState, WorkSession};

/// Run `fut` with a deadline, mapping expiry to [`Ao3Error::Timeout`].
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Ao3Error::Timeout(limit.as_secs()))?
}
