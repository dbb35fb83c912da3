use std::time::Duration;

use crate::app::{Ao3Error, Result};
use crate::domain::{LoadedWork, WorkIdentity};
use crate::fetcher::ContentSource;

use super::bounded;
use super::paginator::PageSet;

/// Where the work slot is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading(LoadTicket),
    Loaded,
    Failed,
}

/// Identifies one load request. Only the newest ticket may complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    pub target: WorkIdentity,
}

impl LoadTicket {
    pub fn link(&self) -> &str {
        &self.target.link
    }
}

#[derive(Debug)]
pub enum LoadCompletion {
    Superseded,
    Loaded,
    /// The prior work, if any, is still loaded.
    Failed(Ao3Error),
}

/// Fetch a work's text with a deadline. Blank text counts as a failure.
pub async fn fetch_text(source: &dyn ContentSource, link: &str, limit: Duration) -> Result<String> {
    let text = bounded(limit, source.fetch_work(link)).await?;
    if text.trim().is_empty() {
        return Err(Ao3Error::EmptyContent);
    }
    Ok(text)
}

/// The single "currently loaded work" slot and its pages.
#[derive(Debug)]
pub struct WorkSession {
    state: LoadState,
    current: Option<(LoadedWork, PageSet)>,
    chunk_size: usize,
    next_ticket: u64,
}

impl WorkSession {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            state: LoadState::Idle,
            current: None,
            chunk_size,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn work(&self) -> Option<&LoadedWork> {
        self.current.as_ref().map(|(work, _)| work)
    }

    pub fn pages(&self) -> Option<&PageSet> {
        self.current.as_ref().map(|(_, pages)| pages)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn begin_load(&mut self, target: WorkIdentity) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket {
            id: self.next_ticket,
            target,
        };
        if let LoadState::Loading(previous) = &self.state {
            tracing::debug!("Load of {} superseded by {}", previous.link(), ticket.link());
        }
        self.state = LoadState::Loading(ticket.clone());
        ticket
    }

    /// Apply a finished fetch if it belongs to the outstanding request.
    ///
    /// Success swaps in a new work with fresh pages at index 0. Failure
    /// keeps whatever was loaded before.
    pub fn complete(&mut self, ticket: LoadTicket, fetched: Result<String>) -> LoadCompletion {
        match &self.state {
            LoadState::Loading(current) if current.id == ticket.id => {}
            _ => {
                tracing::debug!("Discarding stale load of {}", ticket.link());
                return LoadCompletion::Superseded;
            }
        }

        match fetched {
            Ok(text) => {
                let pages = PageSet::new(&text, self.chunk_size);
                let work = LoadedWork::from_identity(ticket.target, text);
                tracing::info!("Loaded {} ({} pages)", work.link, pages.len());
                self.current = Some((work, pages));
                self.state = LoadState::Loaded;
                LoadCompletion::Loaded
            }
            Err(e) => {
                self.state = LoadState::Failed;
                LoadCompletion::Failed(e)
            }
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.current
            .as_mut()
            .is_some_and(|(_, pages)| pages.next())
    }

    pub fn prev_page(&mut self) -> bool {
        self.current
            .as_mut()
            .is_some_and(|(_, pages)| pages.prev())
    }
}
