use std::fmt;
use std::str::FromStr;

/// Post-fetch ordering or filtering applied by the search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    Kudos,
    Date,
    Complete,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(SortKey::None),
            "kudos" => Ok(SortKey::Kudos),
            "date" => Ok(SortKey::Date),
            "complete" => Ok(SortKey::Complete),
            other => Err(format!(
                "Unknown order: {}. Use kudos, date or complete",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::None => "none",
            SortKey::Kudos => "kudos",
            SortKey::Date => "date",
            SortKey::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Server-side sort column, passed straight through to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSort {
    Kudos,
    Hits,
    Date,
}

impl BackendSort {
    pub fn column(self) -> &'static str {
        match self {
            BackendSort::Kudos => "kudos_count",
            BackendSort::Hits => "hits",
            BackendSort::Date => "revised_at",
        }
    }
}

impl FromStr for BackendSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kudos" => Ok(BackendSort::Kudos),
            "hits" => Ok(BackendSort::Hits),
            "date" => Ok(BackendSort::Date),
            other => Err(format!("Unknown sort: {}. Use kudos, hits or date", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    NotRated,
    General,
    Teen,
    Mature,
    Explicit,
}

impl Rating {
    /// Archive-side rating tag id.
    pub fn id(self) -> u32 {
        match self {
            Rating::NotRated => 9,
            Rating::General => 10,
            Rating::Teen => 11,
            Rating::Mature => 12,
            Rating::Explicit => 13,
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "g" | "general" => Ok(Rating::General),
            "t" | "teen" => Ok(Rating::Teen),
            "m" | "mature" => Ok(Rating::Mature),
            "e" | "explicit" => Ok(Rating::Explicit),
            "nr" | "not-rated" | "notrated" => Ok(Rating::NotRated),
            other => Err(format!("Unknown rating: {}", other)),
        }
    }
}

/// A search request as understood by the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub page: u32,
    pub backend_sort: Option<BackendSort>,
    pub complete_only: bool,
    pub rating: Option<Rating>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
            backend_sort: None,
            complete_only: false,
            rating: None,
        }
    }
}
