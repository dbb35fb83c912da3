//! # ao3-tui
//!
//! A terminal client for Archive of Our Own: search works, read them a
//! page at a time, keep bookmarks and export to EPUB.
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────── Coordinator ────────────┐
//! TUI / CLI →│ SearchSession  WorkSession  matcher │→ status sink
//!            └──┬──────────────┬─────────────┬─────┘
//!          ContentSource  BookmarkStore   Exporter
//! ```
//!
//! The [`session::Coordinator`] owns all session state. Network calls run
//! as spawned tasks whose results are applied back on the caller's loop.
//!
//! ## Quick Start
//!
//! ```bash
//! # Search, newest first
//! ao3 search "found family" --sort date
//!
//! # Read the second page of a work
//! ao3 read https://archiveofourown.org/works/123 --page 2
//!
//! # Bookmarks
//! ao3 bookmark add https://archiveofourown.org/works/123 "Hearth"
//! ao3 bookmarks
//!
//! # Interactive client
//! ao3
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires the store, content source and
/// exporter together and builds coordinator dependencies.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/ao3/config.toml`.
pub mod config;

/// Works, bookmarks and search queries.
pub mod domain;

/// EPUB packaging.
pub mod export;

/// Archive access: search and work text over HTTP, plus HTML parsing.
pub mod fetcher;

pub mod opener;

/// Session state and the coordinator driving it.
pub mod session;

/// SQLite bookmark persistence.
pub mod store;

/// Terminal user interface built with ratatui.
pub mod tui;
