use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ao3_tui::app::AppContext;
use ao3_tui::cli::{commands, BookmarkCommand, Cli, Commands};
use ao3_tui::config::Config;
use ao3_tui::domain::SearchQuery;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let is_tui = matches!(cli.command, None | Some(Commands::Tui));

    // The TUI owns the terminal, so only log there when asked to.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if is_tui && cli.log.is_none() { "off" } else { "warn" })
    });
    match &cli.log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }

    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db.clone())?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Search {
            query,
            page,
            sort,
            complete,
            rating,
            order,
            json,
        } => {
            let query = SearchQuery {
                page,
                backend_sort: sort,
                complete_only: complete,
                rating,
                ..SearchQuery::new(query)
            };
            commands::search_works(&ctx, &query, order, json).await?;
        }
        Commands::Read {
            url,
            page,
            page_size,
        } => {
            commands::read_work(&ctx, &url, page, page_size).await?;
        }
        Commands::Bookmark { action } => match action {
            BookmarkCommand::Add { url, title } => {
                commands::add_bookmark(&ctx, &url, &title)?;
            }
            BookmarkCommand::Remove { id } => {
                commands::remove_bookmark(&ctx, id)?;
            }
        },
        Commands::Bookmarks { json } => {
            commands::list_bookmarks(&ctx, json)?;
        }
        Commands::Export {
            url,
            title,
            author,
            output,
        } => {
            commands::export_work(&ctx, &url, &title, &author, output).await?;
        }
        Commands::Tui => {
            ao3_tui::tui::run(Arc::new(ctx)).await?;
        }
    }

    Ok(())
}
