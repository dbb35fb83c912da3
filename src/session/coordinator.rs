use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::app::{Ao3Error, Result};
use crate::domain::{Bookmark, LoadedWork, SearchQuery, SortKey, WorkIdentity, WorkSummary};
use crate::export::Exporter;
use crate::fetcher::ContentSource;
use crate::opener::Opener;
use crate::store::BookmarkStore;

use super::bookmarks::{self, BookmarkAction};
use super::paginator::{PageSet, DEFAULT_CHUNK_SIZE};
use super::search::{SearchCompletion, SearchOutcome, SearchResultSet, SearchSession, SearchTicket};
use super::status::{Status, StatusSink};
use super::work::{self, LoadCompletion, LoadState, LoadTicket, WorkSession};
use super::bounded;

/// Which main view the display should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Idle,
    Results,
    Reading,
}

/// Collaborators the coordinator talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub source: Arc<dyn ContentSource>,
    pub store: Arc<dyn BookmarkStore>,
    pub exporter: Arc<dyn Exporter>,
    pub opener: Arc<dyn Opener>,
    pub status: Arc<dyn StatusSink>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Characters per page
    pub chunk_size: usize,
    /// Deadline for each search, load or export fetch
    pub fetch_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Finished background work, waiting to be applied on the control loop.
enum Completion {
    Search {
        ticket: SearchTicket,
        sort: SortKey,
        result: Result<Vec<WorkSummary>>,
    },
    Load {
        ticket: LoadTicket,
        result: Result<String>,
    },
    Export {
        title: String,
        result: Result<PathBuf>,
    },
}

/// Owns all session state and exposes the user-facing actions.
///
/// Actions that need the network spawn a task and return at once. The
/// task's result is queued and only touches state when the owner calls
/// [`apply_pending`](Self::apply_pending), [`apply_next`](Self::apply_next)
/// or [`settle`](Self::settle). Every mutation bumps a revision counter
/// that display layers can watch through [`subscribe`](Self::subscribe).
pub struct Coordinator {
    deps: SessionDeps,
    settings: SessionSettings,
    search: SearchSession,
    work: WorkSession,
    view: ViewMode,
    bookmarks: Vec<Bookmark>,
    status: Option<Status>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    revision: watch::Sender<u64>,
}

impl Coordinator {
    pub fn new(deps: SessionDeps, settings: SessionSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        let mut coordinator = Self {
            deps,
            settings,
            search: SearchSession::new(),
            work: WorkSession::new(settings.chunk_size),
            view: ViewMode::Idle,
            bookmarks: Vec::new(),
            status: None,
            tx,
            rx,
            in_flight: 0,
            revision,
        };
        coordinator.refresh_bookmarks();
        coordinator
    }

    // ---- actions ----

    /// Start a search. Blank queries are ignored.
    pub fn search(&mut self, query: SearchQuery, sort: SortKey) {
        if query.text.trim().is_empty() {
            tracing::debug!("Ignoring blank search");
            return;
        }

        let ticket = self.search.begin(query.clone());
        self.report(Status::progress("Searching..."));

        let source = self.deps.source.clone();
        let limit = self.settings.fetch_timeout;
        let fallback = ticket.clone();
        self.dispatch(
            async move {
                let result = bounded(limit, source.search(&query)).await;
                Completion::Search {
                    ticket,
                    sort,
                    result,
                }
            },
            move |e| Completion::Search {
                ticket: fallback,
                sort,
                result: Err(e),
            },
        );
    }

    /// Repeat the last search with a different post-fetch sort.
    pub fn rerun_search(&mut self, sort: SortKey) -> bool {
        match self.search.last_query().cloned() {
            Some(query) => {
                self.search(query, sort);
                true
            }
            None => false,
        }
    }

    /// Load the result at `index`. Out-of-range indices do nothing.
    pub fn select_result(&mut self, index: usize) -> bool {
        let Some(summary) = self.search.results().get(index) else {
            tracing::debug!("No result at index {}", index);
            return false;
        };
        let identity = summary.identity();
        self.load(identity);
        true
    }

    /// Load a bookmarked work, looked up in a fresh store read.
    pub fn select_bookmark(&mut self, id: i64) -> bool {
        let bookmarks = match self.deps.store.list_bookmarks() {
            Ok(list) => list,
            Err(e) => {
                self.report(Status::error(format!("Error loading bookmark: {}", e)));
                return false;
            }
        };

        let found = bookmarks
            .iter()
            .find(|b| b.id == id)
            .map(|b| WorkIdentity::new(b.title.clone(), b.url.clone()));
        self.set_bookmarks(bookmarks);

        match found {
            Some(identity) => {
                self.load(identity);
                true
            }
            None => {
                let err = Ao3Error::BookmarkNotFound(id);
                self.report(Status::error(format!("Error loading bookmark: {}", err)));
                false
            }
        }
    }

    /// Bookmark the loaded work, or remove its bookmark if it has one.
    pub fn toggle_bookmark(&mut self) {
        let Some(work) = self.work.work() else {
            return;
        };

        let action = match self.deps.store.list_bookmarks() {
            Ok(fresh) => bookmarks::toggle(&fresh, work),
            Err(e) => {
                self.report(Status::error(format!("Bookmark error: {}", e)));
                return;
            }
        };

        let outcome = match &action {
            BookmarkAction::Add { url, title } => self
                .deps
                .store
                .add_bookmark(url, title)
                .map(|_| format!("Bookmarked {}", title)),
            BookmarkAction::Remove { id, title } => self
                .deps
                .store
                .remove_bookmark(*id)
                .map(|_| format!("Removed bookmark {}", title)),
        };

        match outcome {
            Ok(message) => {
                self.report(Status::success(message));
                self.refresh_bookmarks();
            }
            Err(e) => self.report(Status::error(format!("Bookmark error: {}", e))),
        }
    }

    /// Re-read bookmarks for display. On failure the last good list stays.
    pub fn refresh_bookmarks(&mut self) -> bool {
        match self.deps.store.list_bookmarks() {
            Ok(list) => {
                self.set_bookmarks(list);
                true
            }
            Err(e) => {
                self.report(Status::error(format!("Bookmark error: {}", e)));
                false
            }
        }
    }

    pub fn page_next(&mut self) -> bool {
        let moved = self.work.next_page();
        if moved {
            self.bump();
        }
        moved
    }

    pub fn page_prev(&mut self) -> bool {
        let moved = self.work.prev_page();
        if moved {
            self.bump();
        }
        moved
    }

    /// Fetch the loaded work again and package it as a one-chapter EPUB.
    pub fn export(&mut self) {
        let Some(work) = self.work.work() else {
            return;
        };
        let title = work.title.clone();
        let author = work.author.clone();
        let link = work.link.clone();

        self.report(Status::progress(format!("Exporting {}...", title)));

        let source = self.deps.source.clone();
        let exporter = self.deps.exporter.clone();
        let limit = self.settings.fetch_timeout;
        let fallback = title.clone();
        self.dispatch(
            async move {
                let result = export_work(source, exporter, &title, author, &link, limit).await;
                Completion::Export { title, result }
            },
            move |e| Completion::Export {
                title: fallback,
                result: Err(e),
            },
        );
    }

    /// Hand the loaded work's link to the opener. Failures are reported.
    pub fn open_external(&mut self) {
        let Some(link) = self.work.work().map(|w| w.link.clone()) else {
            return;
        };
        match self.deps.opener.open(&link) {
            Ok(()) => self.report(Status::info(format!("Opened {}", link))),
            Err(e) => self.report(Status::error(format!("Browser error: {}", e))),
        }
    }

    /// Switch back to the result list if there is one.
    pub fn show_results(&mut self) -> bool {
        if self.search.results().is_empty() || self.view == ViewMode::Results {
            return false;
        }
        self.view = ViewMode::Results;
        self.bump();
        true
    }

    /// Switch back to the loaded work if there is one.
    pub fn show_reader(&mut self) -> bool {
        if self.work.work().is_none() || self.view == ViewMode::Reading {
            return false;
        }
        self.view = ViewMode::Reading;
        self.bump();
        true
    }

    // ---- completion handling ----

    /// Apply every completion that has already arrived. Never waits.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it. Returns false when
    /// nothing is in flight.
    pub async fn apply_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Wait until every dispatched task has finished and been applied.
    pub async fn settle(&mut self) {
        while self.apply_next().await {}
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Search {
                ticket,
                sort,
                result,
            } => match self.search.complete(&ticket, result, sort) {
                SearchCompletion::Superseded => {}
                SearchCompletion::Applied(SearchOutcome::Found(n)) => {
                    tracing::info!("Search found {} works", n);
                    self.view = ViewMode::Results;
                    self.report(Status::success("Select a work from the list below"));
                }
                SearchCompletion::Applied(SearchOutcome::NoResults) => {
                    self.hide_results();
                    self.report(Status::error("No results found"));
                }
                SearchCompletion::Applied(SearchOutcome::FilteredEmpty) => {
                    self.hide_results();
                    self.report(Status::error("No results found after filtering"));
                }
                SearchCompletion::Failed(e) => {
                    tracing::warn!(kind = ?e.kind(), "Search failed: {}", e);
                    self.hide_results();
                    self.report(Status::error(format!("Search error: {}", e)));
                }
            },
            Completion::Load { ticket, result } => match self.work.complete(ticket, result) {
                LoadCompletion::Superseded => {}
                LoadCompletion::Loaded => {
                    self.view = ViewMode::Reading;
                    let title = self.work.work().map(|w| w.title.clone()).unwrap_or_default();
                    self.report(Status::success(format!("Loaded {}", title)));
                }
                LoadCompletion::Failed(e) => {
                    tracing::warn!(kind = ?e.kind(), "Load failed: {}", e);
                    self.report(Status::error(format!("Error loading work: {}", e)));
                }
            },
            Completion::Export { title, result } => match result {
                Ok(path) => {
                    tracing::info!("Exported {} to {}", title, path.display());
                    self.report(Status::success(format!("Exported {} to EPUB", title)));
                }
                Err(e) => {
                    tracing::warn!(kind = ?e.kind(), "Export failed: {}", e);
                    self.report(Status::error(format!("Export error: {}", e)));
                }
            },
        }
        self.bump();
    }

    // ---- state ----

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn results(&self) -> &[WorkSummary] {
        &self.search.results().items
    }

    pub fn result_set(&self) -> &SearchResultSet {
        self.search.results()
    }

    pub fn last_query(&self) -> Option<&SearchQuery> {
        self.search.last_query()
    }

    pub fn work(&self) -> Option<&LoadedWork> {
        self.work.work()
    }

    pub fn pages(&self) -> Option<&PageSet> {
        self.work.pages()
    }

    pub fn load_state(&self) -> &LoadState {
        self.work.state()
    }

    /// Bookmarks as of the last store read. For display only.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Whether the loaded work appears in the last bookmark read.
    pub fn is_current_bookmarked(&self) -> bool {
        self.work
            .work()
            .is_some_and(|w| bookmarks::is_bookmarked(&self.bookmarks, &w.link).is_some())
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    // ---- internals ----

    fn load(&mut self, identity: WorkIdentity) {
        let ticket = self.work.begin_load(identity);
        self.report(Status::progress("Loading work..."));

        let source = self.deps.source.clone();
        let limit = self.settings.fetch_timeout;
        let fallback = ticket.clone();
        self.dispatch(
            async move {
                let result = work::fetch_text(source.as_ref(), ticket.link(), limit).await;
                Completion::Load { ticket, result }
            },
            move |e| Completion::Load {
                ticket: fallback,
                result: Err(e),
            },
        );
    }

    /// Run `task` in the background. If it panics, `on_failure` builds the
    /// completion instead so `in_flight` still drains.
    fn dispatch<F, E>(&mut self, task: F, on_failure: E)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
        E: FnOnce(Ao3Error) -> Completion + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let completion = match tokio::spawn(task).await {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::error!("Background task failed: {}", e);
                    on_failure(Ao3Error::Other(format!("Task failed: {}", e)))
                }
            };
            // The receiver lives as long as the coordinator; a failed send
            // only means the session has already shut down.
            let _ = tx.send(completion);
        });
    }

    fn hide_results(&mut self) {
        self.view = if self.work.work().is_some() {
            ViewMode::Reading
        } else {
            ViewMode::Idle
        };
    }

    fn set_bookmarks(&mut self, list: Vec<Bookmark>) {
        self.bookmarks = list;
        self.bump();
    }

    fn report(&mut self, status: Status) {
        self.deps.status.report(&status);
        self.status = Some(status);
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

async fn export_work(
    source: Arc<dyn ContentSource>,
    exporter: Arc<dyn Exporter>,
    title: &str,
    author: String,
    link: &str,
    limit: Duration,
) -> Result<PathBuf> {
    let text = work::fetch_text(source.as_ref(), link, limit).await?;
    let title = title.to_string();
    tokio::task::spawn_blocking(move || {
        let output_name = format!("{}.epub", title);
        exporter.export(&title, &author, &[text], &output_name)
    })
    .await
    .map_err(|e| Ao3Error::Other(format!("Export task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::session::status::StatusLevel;
    use crate::store::SqliteStore;

    const BASE: &str = "https://archiveofourown.org/works/";

    #[derive(Default)]
    struct FakeSource {
        results: Vec<WorkSummary>,
        texts: HashMap<String, String>,
        gates: HashMap<String, Arc<Notify>>,
        fail_search: bool,
        hang: bool,
        panic_on_fetch: bool,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn with_works(works: &[(u32, u32, usize)]) -> Self {
            let mut source = Self::default();
            for &(id, kudos, len) in works {
                let link = format!("{}{}", BASE, id);
                let mut summary =
                    WorkSummary::new(format!("Work {}", id), format!("author{}", id), link.clone());
                summary.kudos = Some(kudos);
                summary.complete = Some(id % 2 == 0);
                source.results.push(summary);
                source.texts.insert(link, "w".repeat(len));
            }
            source
        }

        fn gate(&mut self, id: u32) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.insert(format!("{}{}", BASE, id), gate.clone());
            gate
        }
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<WorkSummary>> {
            if self.fail_search {
                return Err(Ao3Error::Other("unexpected page layout".into()));
            }
            Ok(self.results.clone())
        }

        async fn fetch_work(&self, link: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_fetch {
                panic!("source crashed");
            }
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(gate) = self.gates.get(link) {
                gate.notified().await;
            }
            self.texts
                .get(link)
                .cloned()
                .ok_or_else(|| Ao3Error::Other(format!("no such work: {}", link)))
        }
    }

    #[derive(Default)]
    struct RecordingExporter {
        calls: Mutex<Vec<(String, String, Vec<String>, String)>>,
        fail: AtomicBool,
    }

    impl Exporter for RecordingExporter {
        fn export(
            &self,
            title: &str,
            author: &str,
            chapters: &[String],
            output_name: &str,
        ) -> Result<PathBuf> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Ao3Error::Export("disk full".into()));
            }
            self.calls.lock().unwrap().push((
                title.to_string(),
                author.to_string(),
                chapters.to_vec(),
                output_name.to_string(),
            ));
            Ok(PathBuf::from(output_name))
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Opener for RecordingOpener {
        fn open(&self, link: &str) -> Result<()> {
            if self.fail {
                return Err(Ao3Error::Other("no browser".into()));
            }
            self.opened.lock().unwrap().push(link.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Status>>,
    }

    impl StatusSink for RecordingSink {
        fn report(&self, status: &Status) {
            self.seen.lock().unwrap().push(status.clone());
        }
    }

    struct BrokenStore;

    impl BookmarkStore for BrokenStore {
        fn add_bookmark(&self, _url: &str, _title: &str) -> Result<i64> {
            Err(Ao3Error::Other("store offline".into()))
        }
        fn remove_bookmark(&self, _id: i64) -> Result<()> {
            Err(Ao3Error::Other("store offline".into()))
        }
        fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
            Err(Ao3Error::Other("store offline".into()))
        }
        fn get_bookmark(&self, _id: i64) -> Result<Option<Bookmark>> {
            Err(Ao3Error::Other("store offline".into()))
        }
    }

    struct Harness {
        source: Arc<FakeSource>,
        store: Arc<SqliteStore>,
        exporter: Arc<RecordingExporter>,
        opener: Arc<RecordingOpener>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn new(source: FakeSource) -> Self {
            Self {
                source: Arc::new(source),
                store: Arc::new(SqliteStore::in_memory().unwrap()),
                exporter: Arc::new(RecordingExporter::default()),
                opener: Arc::new(RecordingOpener::default()),
                sink: Arc::new(RecordingSink::default()),
            }
        }

        fn deps(&self) -> SessionDeps {
            SessionDeps {
                source: self.source.clone(),
                store: self.store.clone(),
                exporter: self.exporter.clone(),
                opener: self.opener.clone(),
                status: self.sink.clone(),
            }
        }

        fn coordinator(&self) -> Coordinator {
            Coordinator::new(self.deps(), SessionSettings::default())
        }

        async fn with_results(&self) -> Coordinator {
            let mut c = self.coordinator();
            c.search(SearchQuery::new("found family"), SortKey::None);
            c.settle().await;
            c
        }
    }

    fn three_works() -> FakeSource {
        FakeSource::with_works(&[(1, 5, 100), (2, 20, 7000), (3, 0, 4500)])
    }

    fn message(c: &Coordinator) -> &str {
        c.status().map(|s| s.message.as_str()).unwrap_or("")
    }

    #[tokio::test]
    async fn test_search_shows_results() {
        let h = Harness::new(three_works());
        let c = h.with_results().await;

        assert_eq!(c.view(), ViewMode::Results);
        assert_eq!(c.results().len(), 3);
        assert_eq!(message(&c), "Select a work from the list below");
        assert_eq!(c.in_flight(), 0);

        let seen = h.sink.seen.lock().unwrap();
        assert_eq!(seen[0], Status::progress("Searching..."));
        assert_eq!(seen.last().unwrap().level, StatusLevel::Success);
    }

    #[tokio::test]
    async fn test_blank_search_is_ignored() {
        let h = Harness::new(three_works());
        let mut c = h.coordinator();
        c.search(SearchQuery::new("   "), SortKey::None);
        assert_eq!(c.in_flight(), 0);
        assert!(c.status().is_none());
        assert!(!c.rerun_search(SortKey::Kudos));
    }

    #[tokio::test]
    async fn test_search_sort_by_kudos() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        assert!(c.rerun_search(SortKey::Kudos));
        c.settle().await;

        let kudos: Vec<u32> = c.results().iter().filter_map(|w| w.kudos).collect();
        assert_eq!(kudos, vec![20, 5, 0]);
        assert_eq!(c.result_set().sort, SortKey::Kudos);
        assert_eq!(c.last_query().unwrap().text, "found family");
    }

    #[tokio::test]
    async fn test_empty_outcomes_have_distinct_messages() {
        let h = Harness::new(FakeSource::default());
        let mut c = h.coordinator();
        c.search(SearchQuery::new("nothing"), SortKey::None);
        c.settle().await;
        assert_eq!(message(&c), "No results found");
        assert_eq!(c.view(), ViewMode::Idle);

        let h = Harness::new(FakeSource::with_works(&[(1, 0, 10), (3, 0, 10)]));
        let mut c = h.with_results().await;
        assert_eq!(c.results().len(), 2);
        c.search(SearchQuery::new("found family"), SortKey::Complete);
        c.settle().await;
        assert_eq!(message(&c), "No results found after filtering");
        assert!(c.status().unwrap().is_error());
        assert!(c.results().is_empty());
        assert_eq!(c.view(), ViewMode::Idle);
    }

    #[tokio::test]
    async fn test_search_failure_keeps_previous_results_hidden() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;

        c.deps.source = Arc::new(FakeSource {
            fail_search: true,
            ..Default::default()
        });
        c.search(SearchQuery::new("again"), SortKey::None);
        c.settle().await;

        assert_eq!(message(&c), "Search error: unexpected page layout");
        assert_eq!(c.view(), ViewMode::Idle);
        assert_eq!(c.results().len(), 3);
        assert!(c.show_results());
        assert_eq!(c.view(), ViewMode::Results);
    }

    #[tokio::test]
    async fn test_select_result_loads_and_paginates() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;

        assert!(c.select_result(1));
        assert!(matches!(c.load_state(), LoadState::Loading(_)));
        assert_eq!(message(&c), "Loading work...");
        c.settle().await;

        assert_eq!(c.view(), ViewMode::Reading);
        let work = c.work().unwrap();
        assert_eq!(work.title, "Work 2");
        assert_eq!(work.author, "author2");
        let pages = c.pages().unwrap();
        let lengths: Vec<usize> = pages.pages().iter().map(|p| p.chars().count()).collect();
        assert_eq!(lengths, vec![3000, 3000, 1000]);
        assert_eq!(pages.current_index(), 0);
    }

    #[tokio::test]
    async fn test_select_result_twice_resets_page() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;

        c.select_result(1);
        c.settle().await;
        assert!(c.page_next());
        let first = c.work().cloned();

        c.select_result(1);
        c.settle().await;
        assert_eq!(c.work().cloned(), first);
        assert_eq!(c.pages().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_select_result_out_of_range() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        assert!(!c.select_result(3));
        assert_eq!(c.in_flight(), 0);
        assert_eq!(h.source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_late_load_is_discarded() {
        let mut source = three_works();
        let slow = source.gate(1);
        let fast = source.gate(2);
        let h = Harness::new(source);
        let mut c = h.with_results().await;

        c.select_result(0);
        c.select_result(1);
        assert_eq!(c.in_flight(), 2);

        fast.notify_one();
        assert!(c.apply_next().await);
        assert_eq!(c.work().unwrap().title, "Work 2");

        slow.notify_one();
        assert!(c.apply_next().await);
        assert_eq!(c.work().unwrap().title, "Work 2");
        assert_eq!(c.load_state(), &LoadState::Loaded);
        assert_eq!(c.in_flight(), 0);
        assert!(!c.apply_next().await);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_work() {
        let mut source = three_works();
        source.results.push(WorkSummary::new(
            "Missing".into(),
            "nobody".into(),
            format!("{}404", BASE),
        ));
        let h = Harness::new(source);
        let mut c = h.with_results().await;

        c.select_result(0);
        c.settle().await;
        c.select_result(3);
        c.settle().await;

        assert!(message(&c).starts_with("Error loading work: no such work"));
        assert_eq!(c.work().unwrap().title, "Work 1");
        assert_eq!(c.view(), ViewMode::Reading);
        assert_eq!(c.load_state(), &LoadState::Failed);
    }

    #[tokio::test]
    async fn test_empty_text_is_a_load_failure() {
        let mut source = three_works();
        source.texts.insert(format!("{}1", BASE), "  \n ".into());
        let h = Harness::new(source);
        let mut c = h.with_results().await;

        c.select_result(0);
        c.settle().await;
        assert_eq!(message(&c), "Error loading work: Work has no readable content");
        assert!(c.work().is_none());
    }

    #[tokio::test]
    async fn test_load_timeout_is_reported() {
        let h = Harness::new(FakeSource {
            hang: true,
            ..three_works()
        });
        let mut c = Coordinator::new(
            h.deps(),
            SessionSettings {
                fetch_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );
        c.search(SearchQuery::new("q"), SortKey::None);
        c.settle().await;

        c.select_result(0);
        c.settle().await;
        assert!(message(&c).starts_with("Error loading work: Request timed out"));
        assert!(c.work().is_none());
    }

    #[tokio::test]
    async fn test_panicking_load_still_completes() {
        let h = Harness::new(FakeSource {
            panic_on_fetch: true,
            ..three_works()
        });
        let mut c = h.with_results().await;

        assert!(c.select_result(0));
        c.settle().await;
        assert_eq!(c.in_flight(), 0);
        assert_eq!(c.load_state(), &LoadState::Failed);
        assert!(message(&c).starts_with("Error loading work: Task failed"));
        assert!(c.work().is_none());

        // The session stays usable afterwards.
        c.search(SearchQuery::new("again"), SortKey::None);
        c.settle().await;
        assert_eq!(c.view(), ViewMode::Results);
    }

    #[tokio::test]
    async fn test_toggle_bookmark_is_its_own_inverse() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        let before = assert_ok!(h.store.list_bookmarks()).len();

        c.select_result(2);
        c.settle().await;
        assert!(!c.is_current_bookmarked());

        c.toggle_bookmark();
        let after_add = h.store.list_bookmarks().unwrap();
        assert_eq!(after_add.len(), before + 1);
        assert_eq!(after_add[0].url, format!("{}3", BASE));
        assert_eq!(after_add[0].title, "Work 3");
        assert!(c.is_current_bookmarked());
        assert_eq!(c.bookmarks().len(), 1);
        assert_eq!(message(&c), "Bookmarked Work 3");

        c.toggle_bookmark();
        assert_eq!(h.store.list_bookmarks().unwrap().len(), before);
        assert_err!(h.store.remove_bookmark(after_add[0].id));
        assert!(!c.is_current_bookmarked());
        assert_eq!(message(&c), "Removed bookmark Work 3");
    }

    #[tokio::test]
    async fn test_toggle_reads_fresh_store() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        c.select_result(0);
        c.settle().await;

        // Added behind the coordinator's back; its snapshot is stale.
        h.store.add_bookmark(&format!("{}1", BASE), "Work 1").unwrap();
        assert!(!c.is_current_bookmarked());

        c.toggle_bookmark();
        assert!(h.store.list_bookmarks().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_bookmark_has_unknown_author() {
        let h = Harness::new(three_works());
        let id = h.store.add_bookmark(&format!("{}2", BASE), "Saved").unwrap();
        let mut c = h.coordinator();
        assert_eq!(c.bookmarks().len(), 1);

        assert!(c.select_bookmark(id));
        c.settle().await;
        let work = c.work().unwrap();
        assert_eq!(work.title, "Saved");
        assert_eq!(work.author, "Unknown");
        assert_eq!(c.view(), ViewMode::Reading);
        assert!(c.is_current_bookmarked());

        assert!(!c.select_bookmark(id + 100));
        assert!(message(&c).starts_with("Error loading bookmark"));
        assert_eq!(c.work().unwrap().title, "Saved");
    }

    #[tokio::test]
    async fn test_store_failures_are_reported() {
        let h = Harness::new(three_works());
        let mut deps = h.deps();
        deps.store = Arc::new(BrokenStore);
        let mut c = Coordinator::new(deps, SessionSettings::default());
        assert_eq!(message(&c), "Bookmark error: store offline");

        c.search(SearchQuery::new("q"), SortKey::None);
        c.settle().await;
        c.select_result(0);
        c.settle().await;

        c.toggle_bookmark();
        assert_eq!(message(&c), "Bookmark error: store offline");
        assert!(c.bookmarks().is_empty());
        assert_eq!(c.work().unwrap().title, "Work 1");
        assert!(!c.select_bookmark(1));
    }

    #[tokio::test]
    async fn test_page_navigation_clamps() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        c.select_result(1);
        c.settle().await;

        let rev = c.revision();
        assert!(!c.page_prev());
        assert_eq!(c.pages().unwrap().current_index(), 0);
        assert_eq!(c.revision(), rev);

        assert!(c.page_next());
        assert!(c.page_next());
        assert!(!c.page_next());
        assert_eq!(c.pages().unwrap().current_index(), 2);
        assert!(c.page_prev());
        assert_eq!(c.pages().unwrap().current_index(), 1);
    }

    #[tokio::test]
    async fn test_export_refetches_and_exports_once() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        c.select_result(1);
        c.settle().await;
        c.page_next();
        let fetches = h.source.fetches.load(Ordering::SeqCst);

        c.export();
        c.settle().await;

        assert_eq!(h.source.fetches.load(Ordering::SeqCst), fetches + 1);
        let calls = h.exporter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (title, author, chapters, output) = &calls[0];
        assert_eq!(title, "Work 2");
        assert_eq!(author, "author2");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].len(), 7000);
        assert_eq!(output, "Work 2.epub");
        assert_eq!(message(&c), "Exported Work 2 to EPUB");
        assert_eq!(c.pages().unwrap().current_index(), 1);
    }

    #[tokio::test]
    async fn test_export_failure_leaves_reader_alone() {
        let h = Harness::new(three_works());
        h.exporter.fail.store(true, Ordering::SeqCst);
        let mut c = h.with_results().await;
        c.select_result(2);
        c.settle().await;
        c.page_next();

        c.export();
        c.settle().await;
        assert_eq!(message(&c), "Export error: disk full");
        assert_eq!(c.work().unwrap().title, "Work 3");
        assert_eq!(c.pages().unwrap().current_index(), 1);
        assert_eq!(c.view(), ViewMode::Reading);
    }

    #[tokio::test]
    async fn test_open_external() {
        let h = Harness::new(three_works());
        let mut c = h.with_results().await;
        c.select_result(0);
        c.settle().await;

        c.open_external();
        assert_eq!(*h.opener.opened.lock().unwrap(), vec![format!("{}1", BASE)]);

        let mut deps = h.deps();
        deps.opener = Arc::new(RecordingOpener {
            fail: true,
            ..Default::default()
        });
        c.deps = deps;
        c.open_external();
        assert_eq!(message(&c), "Browser error: no browser");
        assert!(c.work().is_some());
    }

    #[tokio::test]
    async fn test_work_actions_without_work_do_nothing() {
        let h = Harness::new(three_works());
        let mut c = h.coordinator();
        let rev = c.revision();

        c.toggle_bookmark();
        c.export();
        c.open_external();
        assert!(!c.page_next());
        assert!(!c.page_prev());
        assert!(!c.show_reader());

        assert_eq!(c.revision(), rev);
        assert_eq!(c.in_flight(), 0);
        assert!(h.opener.opened.lock().unwrap().is_empty());
        assert!(h.exporter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let h = Harness::new(three_works());
        let mut c = h.coordinator();
        let mut rx = c.subscribe();
        rx.borrow_and_update();

        c.search(SearchQuery::new("found family"), SortKey::None);
        assert!(assert_ok!(rx.has_changed()));
        rx.borrow_and_update();

        c.settle().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), c.revision());
    }

    #[tokio::test]
    async fn test_apply_pending_does_not_block() {
        let mut source = three_works();
        let gate = source.gate(1);
        let h = Harness::new(source);
        let mut c = h.with_results().await;

        c.select_result(0);
        assert_eq!(c.apply_pending(), 0);
        assert!(c.is_busy());

        gate.notify_one();
        c.settle().await;
        assert!(!c.is_busy());
    }
}
