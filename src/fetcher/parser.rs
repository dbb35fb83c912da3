//! Scraping of archive search and work pages.
//!
//! The archive's markup is regular enough that a handful of patterns cover
//! what we need. Anything missing degrades to a default rather than failing
//! the whole page.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::WorkSummary;

pub const NO_TEXT_PLACEHOLDER: &str = "[No text found]";
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

static BLURB_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<li\b[^>]*class="[^"]*\bwork\s+blurb\s+group\b[^"]*"[^>]*>"#)
        .expect("blurb regex")
});
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<h4\b[^>]*class="[^"]*\bheading\b[^"]*"[^>]*>(.*?)</h4>"#)
        .expect("heading regex")
});
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?href="([^"]*)"[^>]*>(.*?)</a>"#).expect("link regex")
});
static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*rel="author"[^>]*>(.*?)</a>"#).expect("author regex")
});
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<blockquote\b[^>]*class="[^"]*\buserstuff\s+summary\b[^"]*"[^>]*>(.*?)</blockquote>"#,
    )
    .expect("summary regex")
});
static KUDOS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<dd\b[^>]*class="[^"]*\bkudos\b[^"]*"[^>]*>(.*?)</dd>"#)
        .expect("kudos regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<p\b[^>]*class="[^"]*\bdatetime\b[^"]*"[^>]*>(.*?)</p>"#)
        .expect("datetime regex")
});
static COMPLETE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bcomplete-(yes|no)\b"#).expect("complete regex"));
static USERSTUFF_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div\b[^>]*class="[^"]*\buserstuff\b[^"]*"[^>]*>"#)
        .expect("userstuff regex")
});
static DIV_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<(/?)div\b[^>]*>"#).expect("div regex"));
static LANDMARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<h3\b[^>]*class="[^"]*\blandmark\b[^"]*"[^>]*>.*?</h3>"#)
        .expect("landmark regex")
});
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<!--.*?-->"#).expect("comment regex"));
static BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<br\s*/?>|</p>|</h\d>|</li>|</blockquote>"#).expect("break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?s)<[^>]+>"#).expect("tag regex"));

/// Extract up to `limit` work summaries from a search results page.
pub fn parse_search_results(html: &str, base: &Url, limit: usize) -> Vec<WorkSummary> {
    let starts: Vec<usize> = BLURB_START_RE.find_iter(html).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            parse_blurb(&html[start..end], base)
        })
        .take(limit)
        .collect()
}

fn parse_blurb(blurb: &str, base: &Url) -> Option<WorkSummary> {
    let heading = HEADING_RE.captures(blurb)?.get(1)?.as_str();
    let link_caps = LINK_RE.captures(heading)?;
    let href = decode_html_entities(link_caps.get(1)?.as_str()).to_string();
    let link = base.join(&href).ok()?.to_string();

    let mut title = inline_text(link_caps.get(2)?.as_str());
    if title.is_empty() {
        title = "No Title".to_string();
    }

    let author = AUTHOR_RE
        .captures(blurb)
        .and_then(|c| c.get(1))
        .map(|m| inline_text(m.as_str()))
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

    let mut summary = WorkSummary::new(title, author, link);

    summary.summary = SUMMARY_RE
        .captures(blurb)
        .and_then(|c| c.get(1))
        .map(|m| html_to_text(m.as_str()).lines().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    summary.kudos = KUDOS_RE
        .captures(blurb)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_count(&inline_text(m.as_str())));

    summary.date = DATE_RE
        .captures(blurb)
        .and_then(|c| c.get(1))
        .map(|m| inline_text(m.as_str()))
        .filter(|d| !d.is_empty());

    summary.complete = COMPLETE_RE
        .captures(blurb)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "yes");

    Some(summary)
}

/// Extract the readable text of a work page.
///
/// Every `userstuff` block becomes one paragraph group; groups are joined
/// with a blank line. Returns `None` when the page has no such block.
pub fn parse_work_text(html: &str) -> Option<String> {
    let mut blocks = Vec::new();
    let mut offset = 0;

    while let Some(open) = USERSTUFF_OPEN_RE.find_at(html, offset) {
        let inner_start = open.end();
        let inner_end = matching_div_end(html, inner_start).unwrap_or(html.len());

        let text = html_to_text(&html[inner_start..inner_end]);
        if !text.is_empty() {
            blocks.push(text);
        }
        offset = inner_end;
    }

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}

/// Position of the `</div>` closing a div whose content starts at `from`.
fn matching_div_end(html: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for caps in DIV_TAG_RE.captures_iter(&html[from..]) {
        let tag = caps.get(0)?;
        if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
            depth -= 1;
            if depth == 0 {
                return Some(from + tag.start());
            }
        } else {
            depth += 1;
        }
    }
    None
}

/// Convert an HTML fragment into trimmed, non-empty lines of text.
pub fn html_to_text(fragment: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(fragment, "");
    let without_landmarks = LANDMARK_RE.replace_all(&without_comments, "");
    let with_breaks = BREAK_RE.replace_all(&without_landmarks, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_html_entities(&stripped);

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn inline_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    decode_html_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_count(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
