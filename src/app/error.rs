use thiserror::Error;

#[derive(Error, Debug)]
pub enum Ao3Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Export(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Work has no readable content")]
    EmptyContent,

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(i64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Where a failure came from, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    Store,
    Export,
    Other,
}

impl Ao3Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Ao3Error::Http(_)
            | Ao3Error::InvalidUrl(_)
            | Ao3Error::Timeout(_)
            | Ao3Error::EmptyContent => FailureKind::Fetch,
            Ao3Error::Database(_) | Ao3Error::Migration(_) | Ao3Error::BookmarkNotFound(_) => {
                FailureKind::Store
            }
            Ao3Error::Zip(_) | Ao3Error::Export(_) => FailureKind::Export,
            Ao3Error::Io(_) | Ao3Error::Config(_) | Ao3Error::Other(_) => FailureKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Ao3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Ao3Error::Timeout(30).kind(), FailureKind::Fetch);
        assert_eq!(Ao3Error::EmptyContent.kind(), FailureKind::Fetch);
        assert_eq!(Ao3Error::BookmarkNotFound(3).kind(), FailureKind::Store);
        assert_eq!(Ao3Error::Export("disk full".into()).kind(), FailureKind::Export);
        assert_eq!(
            Ao3Error::Io(std::io::Error::other("permission denied")).kind(),
            FailureKind::Other
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Ao3Error::Timeout(30).to_string(),
            "Request timed out after 30s"
        );
        assert_eq!(
            Ao3Error::BookmarkNotFound(7).to_string(),
            "Bookmark not found: 7"
        );
    }
}
