use std::path::PathBuf;

use crate::app::{Ao3Error, AppContext, Result};
use crate::domain::{SearchQuery, SortKey, WorkSummary};
use crate::export::{EpubExporter, Exporter};
use crate::session::search::{self, SearchOutcome};
use crate::session::{is_bookmarked, work, PageSet};
use crate::store::BookmarkStore;

pub async fn search_works(
    ctx: &AppContext,
    query: &SearchQuery,
    order: SortKey,
    json: bool,
) -> Result<()> {
    let (results, outcome) = search::execute(
        ctx.source.as_ref(),
        query,
        order,
        ctx.config.reader.fetch_timeout(),
    )
    .await?;

    if json {
        let out = serde_json::to_string_pretty(&results.items)
            .map_err(|e| Ao3Error::Other(format!("Could not encode results: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    match outcome {
        SearchOutcome::NoResults => println!("No results found"),
        SearchOutcome::FilteredEmpty => println!("No results found after filtering"),
        SearchOutcome::Found(_) => {
            for (i, work) in results.items.iter().enumerate() {
                println!("{}\n", format_summary(i + 1, work));
            }
        }
    }
    Ok(())
}

/// Multi-line listing for one search result.
pub fn format_summary(position: usize, work: &WorkSummary) -> String {
    let kudos = work
        .kudos
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());
    let date = work.date.as_deref().unwrap_or("-");

    let mut out = format!(
        "{}. {}\n   Kudos: {} | Updated: {} | {}\n   {}",
        position,
        work.display_line(),
        kudos,
        date,
        work.status_label(),
        work.link
    );
    if !work.summary.is_empty() {
        out.push_str("\n   ");
        out.push_str(&work.summary.replace('\n', "\n   "));
    }
    out
}

pub async fn read_work(
    ctx: &AppContext,
    url: &str,
    page: usize,
    page_size: Option<usize>,
) -> Result<()> {
    let text = work::fetch_text(ctx.source.as_ref(), url, ctx.config.reader.fetch_timeout()).await?;
    let pages = PageSet::new(&text, page_size.unwrap_or(ctx.config.reader.page_size));

    let content = select_page(&pages, page)?;
    println!("Page {}/{}\n", page, pages.len());
    println!("{}", content);
    Ok(())
}

/// 1-based page lookup.
pub fn select_page(pages: &PageSet, page: usize) -> Result<&str> {
    page.checked_sub(1)
        .and_then(|idx| pages.pages().get(idx))
        .map(String::as_str)
        .ok_or_else(|| {
            Ao3Error::Other(format!(
                "Page {} out of range (1-{})",
                page,
                pages.len()
            ))
        })
}

pub fn add_bookmark(ctx: &AppContext, url: &str, title: &str) -> Result<Option<i64>> {
    let bookmarks = ctx.store.list_bookmarks()?;
    if let Some(existing) = is_bookmarked(&bookmarks, url) {
        println!("Already bookmarked [{}]: {}", existing.id, existing.title);
        return Ok(None);
    }

    let id = ctx.store.add_bookmark(url, title)?;
    println!("Bookmarked [{}]: {}", id, title);
    Ok(Some(id))
}

pub fn remove_bookmark(ctx: &AppContext, id: i64) -> Result<()> {
    let bookmark = ctx
        .store
        .get_bookmark(id)?
        .ok_or(Ao3Error::BookmarkNotFound(id))?;

    ctx.store.remove_bookmark(id)?;
    println!("Removed bookmark [{}]: {}", id, bookmark.title);
    Ok(())
}

pub fn list_bookmarks(ctx: &AppContext, json: bool) -> Result<()> {
    let bookmarks = ctx.store.list_bookmarks()?;

    if json {
        let out = serde_json::to_string_pretty(&bookmarks)
            .map_err(|e| Ao3Error::Other(format!("Could not encode bookmarks: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if bookmarks.is_empty() {
        println!("No bookmarks yet.");
        return Ok(());
    }

    for bookmark in bookmarks {
        println!(
            "[{}] {}\n    {}  (saved {})",
            bookmark.id,
            bookmark.display_title(),
            bookmark.url,
            bookmark.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub async fn export_work(
    ctx: &AppContext,
    url: &str,
    title: &str,
    author: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let text = work::fetch_text(ctx.source.as_ref(), url, ctx.config.reader.fetch_timeout()).await?;

    let path = match output {
        Some(dir) => EpubExporter::new(dir).export(title, author, &[text], &format!("{}.epub", title))?,
        None => ctx
            .exporter
            .export(title, author, &[text], &format!("{}.epub", title))?,
    };
    println!("Exported {} to {}", title, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn ctx() -> AppContext {
        AppContext::in_memory(Config::default()).unwrap()
    }

    #[test]
    fn test_add_bookmark_skips_duplicates() {
        let ctx = ctx();
        let url = "https://archiveofourown.org/works/7";

        let first = add_bookmark(&ctx, url, "Seven").unwrap();
        assert!(first.is_some());
        let second = add_bookmark(&ctx, url, "Seven again").unwrap();
        assert!(second.is_none());
        assert_eq!(ctx.store.list_bookmarks().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_bookmark() {
        let ctx = ctx();
        let id = add_bookmark(&ctx, "https://archiveofourown.org/works/8", "Eight")
            .unwrap()
            .unwrap();

        remove_bookmark(&ctx, id).unwrap();
        assert!(ctx.store.list_bookmarks().unwrap().is_empty());
        assert!(matches!(
            remove_bookmark(&ctx, id),
            Err(Ao3Error::BookmarkNotFound(_))
        ));
    }

    #[test]
    fn test_list_bookmarks_empty() {
        assert!(list_bookmarks(&ctx(), false).is_ok());
        assert!(list_bookmarks(&ctx(), true).is_ok());
    }

    #[test]
    fn test_select_page_is_one_based() {
        let pages = PageSet::new(&"q".repeat(25), 10);
        assert_eq!(select_page(&pages, 1).unwrap().len(), 10);
        assert_eq!(select_page(&pages, 3).unwrap().len(), 5);
        assert!(select_page(&pages, 0).is_err());
        assert!(select_page(&pages, 4).is_err());
    }

    #[test]
    fn test_format_summary() {
        let mut work = WorkSummary::new(
            "Hearth".into(),
            "alder".into(),
            "https://archiveofourown.org/works/1".into(),
        );
        work.kudos = Some(1200);
        work.complete = Some(true);
        work.summary = "Line one\nLine two".into();

        let text = format_summary(3, &work);
        assert!(text.starts_with("3. Hearth by alder\n"));
        assert!(text.contains("Kudos: 1200 | Updated: - | Complete"));
        assert!(text.ends_with("   Line one\n   Line two"));
    }
}
