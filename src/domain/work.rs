use serde::{Deserialize, Serialize};

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Search-result metadata for a work, before its text is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub title: String,
    pub author: String,
    pub link: String,
    pub summary: String,
    pub kudos: Option<u32>,
    pub date: Option<String>,
    pub complete: Option<bool>,
}

impl WorkSummary {
    pub fn new(title: String, author: String, link: String) -> Self {
        Self {
            title,
            author,
            link,
            summary: String::new(),
            kudos: None,
            date: None,
            complete: None,
        }
    }

    pub fn identity(&self) -> WorkIdentity {
        WorkIdentity::new(self.title.as_str(), self.link.as_str())
            .with_author(self.author.as_str())
    }

    pub fn display_line(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }

    pub fn status_label(&self) -> &'static str {
        match self.complete {
            Some(true) => "Complete",
            Some(false) => "WIP",
            None => "?",
        }
    }
}

/// Enough to fetch a work and label it once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkIdentity {
    pub title: String,
    pub link: String,
    pub author: Option<String>,
}

impl WorkIdentity {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// The work currently held in a session's single loaded slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedWork {
    pub title: String,
    pub author: String,
    pub link: String,
    pub full_text: String,
}

impl LoadedWork {
    pub fn from_identity(identity: WorkIdentity, full_text: String) -> Self {
        Self {
            title: identity.title,
            author: identity
                .author
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            link: identity.link,
            full_text,
        }
    }
}
