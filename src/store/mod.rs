pub mod sqlite;

use crate::app::Result;
use crate::domain::Bookmark;

pub use sqlite::SqliteStore;

/// Durable bookmark records. The store assigns ids; callers match on url.
pub trait BookmarkStore: Send + Sync {
    fn add_bookmark(&self, url: &str, title: &str) -> Result<i64>;
    fn remove_bookmark(&self, id: i64) -> Result<()>;
    fn list_bookmarks(&self) -> Result<Vec<Bookmark>>;
    fn get_bookmark(&self, id: i64) -> Result<Option<Bookmark>>;
}
