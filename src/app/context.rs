use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Ao3Error, Result};
use crate::config::Config;
use crate::export::EpubExporter;
use crate::fetcher::HttpSource;
use crate::opener::BrowserOpener;
use crate::session::{SessionDeps, SessionSettings, StatusSink};
use crate::store::SqliteStore;

/// Long-lived collaborators shared by batch commands and the TUI.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub source: Arc<HttpSource>,
    pub exporter: Arc<EpubExporter>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(SqliteStore::in_memory()?))
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let source = Arc::new(HttpSource::new(&config.source)?);
        let exporter = Arc::new(EpubExporter::new(config.export.output_dir.clone()));

        Ok(Self {
            config,
            store,
            source,
            exporter,
        })
    }

    /// Wire up a coordinator's collaborators, reporting through `status`.
    pub fn session_deps(&self, status: Arc<dyn StatusSink>) -> SessionDeps {
        SessionDeps {
            source: self.source.clone(),
            store: self.store.clone(),
            exporter: self.exporter.clone(),
            opener: Arc::new(BrowserOpener),
            status,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            chunk_size: self.config.reader.page_size,
            fetch_timeout: self.config.reader.fetch_timeout(),
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Ao3Error::Config("Could not find data directory".into()))?;
        let ao3_dir = data_dir.join("ao3");
        std::fs::create_dir_all(&ao3_dir).map_err(|e| {
            Ao3Error::Config(format!("Could not create {}: {}", ao3_dir.display(), e))
        })?;
        Ok(ao3_dir.join("bookmarks.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TracingSink;
    use crate::store::BookmarkStore;

    #[test]
    fn test_settings_follow_reader_config() {
        let mut config = Config::default();
        config.reader.page_size = 1200;
        config.reader.fetch_timeout_secs = 5;
        let ctx = AppContext::in_memory(config).unwrap();

        let settings = ctx.session_settings();
        assert_eq!(settings.chunk_size, 1200);
        assert_eq!(settings.fetch_timeout.as_secs(), 5);

        let deps = ctx.session_deps(Arc::new(TracingSink));
        assert!(deps.store.list_bookmarks().unwrap().is_empty());
    }

    #[test]
    fn test_file_backed_context() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("bookmarks.db");
        let ctx = AppContext::new(Config::default(), Some(db.clone())).unwrap();
        ctx.store.add_bookmark("https://archiveofourown.org/works/1", "One").unwrap();
        assert!(db.exists());
    }
}
