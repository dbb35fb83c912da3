pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{BackendSort, Rating, SortKey};

#[derive(Parser)]
#[command(name = "ao3")]
#[command(about = "Search, read and bookmark Archive of Our Own works from the terminal", long_about = None)]
pub struct Cli {
    /// Path to the bookmark database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Defaults to `tui` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for works
    Search {
        /// Tag, character, author or free text
        query: String,

        /// Results page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Server-side sort: kudos, hits or date
        #[arg(long)]
        sort: Option<BackendSort>,

        /// Only complete works (server-side)
        #[arg(long)]
        complete: bool,

        /// general, teen, mature, explicit or not-rated
        #[arg(long)]
        rating: Option<Rating>,

        /// Reorder fetched results: kudos, date or complete
        #[arg(long, default_value = "none")]
        order: SortKey,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one page of a work
    Read {
        /// Work URL
        url: String,

        /// Page to print, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Characters per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Add or remove a bookmark
    Bookmark {
        #[command(subcommand)]
        action: BookmarkCommand,
    },
    /// List bookmarks
    Bookmarks {
        /// Print bookmarks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a work to EPUB
    Export {
        /// Work URL
        url: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = crate::domain::UNKNOWN_AUTHOR)]
        author: String,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Launch the interactive client
    Tui,
}

#[derive(Subcommand)]
pub enum BookmarkCommand {
    /// Bookmark a work
    Add {
        url: String,
        title: String,
    },
    /// Remove a bookmark by id
    Remove {
        id: i64,
    },
}
