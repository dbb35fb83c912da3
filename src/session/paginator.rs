pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// Shown in place of a work's text when there is nothing to show.
pub const NO_CONTENT_PAGE: &str = "No content available";

/// Split `text` into pages of exactly `chunk_size` characters, except the
/// last page which holds the remainder.
///
/// Boundaries are raw character offsets; words may be split across pages.
/// Empty text yields a single placeholder page. A `chunk_size` of zero is
/// treated as one.
pub fn paginate(text: &str, chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![NO_CONTENT_PAGE.to_string()];
    }

    let chunk_size = chunk_size.max(1);
    let mut pages = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            pages.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pages.push(text[start..].to_string());

    pages
}

/// Pages of the loaded work plus the page being shown.
///
/// `current` is always a valid index: there is at least one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<String>,
    current: usize,
}

impl PageSet {
    pub fn new(text: &str, chunk_size: usize) -> Self {
        Self {
            pages: paginate(text, chunk_size),
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> &str {
        &self.pages[self.current]
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Advance one page. Returns false at the last page.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page. Returns false at the first page.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn position_label(&self) -> String {
        format!("Page {}/{}", self.current + 1, self.pages.len())
    }
}
