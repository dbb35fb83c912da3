use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Ao3Error, Result};
use crate::domain::Bookmark;
use crate::store::BookmarkStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            Ao3Error::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn row_to_bookmark(row: &Row<'_>) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            created_at: row
                .get::<_, String>(3)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

impl BookmarkStore for SqliteStore {
    fn add_bookmark(&self, url: &str, title: &str) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO bookmarks (title, url, created_at) VALUES (?1, ?2, ?3)",
            params![title, url, Utc::now().to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!("Bookmarked {} as #{}", url, id);
        Ok(id)
    }

    fn remove_bookmark(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;

        let removed = conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(Ao3Error::BookmarkNotFound(id));
        }

        tracing::info!("Removed bookmark #{}", id);
        Ok(())
    }

    fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT id, title, url, created_at FROM bookmarks ORDER BY id")?;

        let bookmarks = stmt
            .query_map([], Self::row_to_bookmark)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookmarks)
    }

    fn get_bookmark(&self, id: i64) -> Result<Option<Bookmark>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT id, title, url, created_at FROM bookmarks WHERE id = ?1",
                params![id],
                Self::row_to_bookmark,
            )
            .optional()?;

        Ok(result)
    }
}
