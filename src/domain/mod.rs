pub mod bookmark;
pub mod query;
pub mod work;

pub use bookmark::Bookmark;
pub use query::{BackendSort, Rating, SearchQuery, SortKey};
pub use work::{LoadedWork, WorkIdentity, WorkSummary, UNKNOWN_AUTHOR};
