use std::cmp::Reverse;
use std::time::Duration;

use crate::app::{Ao3Error, Result};
use crate::domain::{SearchQuery, SortKey, WorkSummary};
use crate::fetcher::ContentSource;

use super::bounded;

/// What a finished search produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(usize),
    /// The source returned nothing at all.
    NoResults,
    /// The source returned works but the complete filter removed them all.
    FilteredEmpty,
}

/// Ordered results of one search plus the sort that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResultSet {
    pub items: Vec<WorkSummary>,
    pub sort: SortKey,
}

impl SearchResultSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WorkSummary> {
        self.items.get(index)
    }
}

/// Post-fetch ordering. All sorts are stable, so ties keep source order.
pub fn apply_sort(mut results: Vec<WorkSummary>, sort: SortKey) -> Vec<WorkSummary> {
    match sort {
        SortKey::None => {}
        SortKey::Kudos => results.sort_by_key(|w| Reverse(w.kudos.unwrap_or(0))),
        // Plain string comparison; "2 Jan" sorts after "10 Mar".
        SortKey::Date => results.sort_by(|a, b| {
            let a = a.date.as_deref().unwrap_or("");
            let b = b.date.as_deref().unwrap_or("");
            b.cmp(a)
        }),
        SortKey::Complete => results.retain(|w| w.complete == Some(true)),
    }
    results
}

/// Sort raw source output and classify the outcome.
pub fn finish(raw: Vec<WorkSummary>, sort: SortKey) -> (SearchResultSet, SearchOutcome) {
    if raw.is_empty() {
        return (
            SearchResultSet {
                items: Vec::new(),
                sort,
            },
            SearchOutcome::NoResults,
        );
    }

    let items = apply_sort(raw, sort);
    let outcome = if items.is_empty() {
        SearchOutcome::FilteredEmpty
    } else {
        SearchOutcome::Found(items.len())
    };
    (SearchResultSet { items, sort }, outcome)
}

/// One-shot search used by batch mode: fetch, then sort.
pub async fn execute(
    source: &dyn ContentSource,
    query: &SearchQuery,
    sort: SortKey,
    limit: Duration,
) -> Result<(SearchResultSet, SearchOutcome)> {
    if query.text.trim().is_empty() {
        return Err(Ao3Error::Other("Search query is empty".to_string()));
    }
    let raw = bounded(limit, source.search(query)).await?;
    Ok(finish(raw, sort))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    id: u64,
}

/// Result of handing a search completion back to the session.
#[derive(Debug)]
pub enum SearchCompletion {
    /// A newer search was started; this result was dropped.
    Superseded,
    Applied(SearchOutcome),
    Failed(Ao3Error),
}

/// Holds the current result set and tracks which search is outstanding.
#[derive(Debug, Default)]
pub struct SearchSession {
    results: SearchResultSet,
    last_query: Option<SearchQuery>,
    next_ticket: u64,
    pending: Option<u64>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &SearchResultSet {
        &self.results
    }

    pub fn last_query(&self) -> Option<&SearchQuery> {
        self.last_query.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a search. Any search still outstanding is superseded.
    pub fn begin(&mut self, query: SearchQuery) -> SearchTicket {
        self.next_ticket += 1;
        self.pending = Some(self.next_ticket);
        self.last_query = Some(query);
        SearchTicket {
            id: self.next_ticket,
        }
    }

    /// Apply a finished fetch. Empty outcomes replace the result set;
    /// failures leave it untouched.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        fetched: Result<Vec<WorkSummary>>,
        sort: SortKey,
    ) -> SearchCompletion {
        if self.pending != Some(ticket.id) {
            tracing::debug!("Dropping superseded search #{}", ticket.id);
            return SearchCompletion::Superseded;
        }
        self.pending = None;

        match fetched {
            Ok(raw) => {
                let (results, outcome) = finish(raw, sort);
                self.results = results;
                SearchCompletion::Applied(outcome)
            }
            Err(e) => SearchCompletion::Failed(e),
        }
    }
}
