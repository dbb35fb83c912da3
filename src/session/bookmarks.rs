use crate::domain::{Bookmark, LoadedWork};

/// Store mutation chosen by [`toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkAction {
    Remove { id: i64, title: String },
    Add { url: String, title: String },
}

/// First bookmark whose url equals `link` exactly.
///
/// No normalization: trailing slashes, query strings and case all count.
pub fn is_bookmarked<'a>(bookmarks: &'a [Bookmark], link: &str) -> Option<&'a Bookmark> {
    bookmarks.iter().find(|b| b.url == link)
}

/// Decide whether bookmarking `work` adds or removes a record.
pub fn toggle(bookmarks: &[Bookmark], work: &LoadedWork) -> BookmarkAction {
    match is_bookmarked(bookmarks, &work.link) {
        Some(existing) => BookmarkAction::Remove {
            id: existing.id,
            title: existing.title.clone(),
        },
        None => BookmarkAction::Add {
            url: work.link.clone(),
            title: work.title.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn bookmark(id: i64, url: &str) -> Bookmark {
        Bookmark {
            id,
            title: format!("Work {}", id),
            url: url.to_string(),
            created_at: Utc::now(),
        }
    }

    fn work(link: &str) -> LoadedWork {
        LoadedWork {
            title: "Hearth".into(),
            author: "alder".into(),
            link: link.into(),
            full_text: "text".into(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let bookmarks = vec![
            bookmark(1, "https://a/works/1"),
            bookmark(2, "https://a/works/2"),
            bookmark(3, "https://a/works/2"),
        ];
        assert_eq!(is_bookmarked(&bookmarks, "https://a/works/2").unwrap().id, 2);
        assert!(is_bookmarked(&bookmarks, "https://a/works/9").is_none());
    }

    #[test]
    fn test_matching_is_exact() {
        let bookmarks = vec![bookmark(1, "https://a/works/1")];
        assert!(is_bookmarked(&bookmarks, "https://a/works/1/").is_none());
        assert!(is_bookmarked(&bookmarks, "https://a/works/1?view_adult=true").is_none());
        assert!(is_bookmarked(&bookmarks, "HTTPS://A/works/1").is_none());
    }

    #[test]
    fn test_toggle_adds_when_absent() {
        let action = toggle(&[], &work("https://a/works/5"));
        assert_eq!(
            action,
            BookmarkAction::Add {
                url: "https://a/works/5".into(),
                title: "Hearth".into()
            }
        );
    }

    #[test]
    fn test_toggle_removes_matching_id() {
        let bookmarks = vec![bookmark(4, "https://a/works/1"), bookmark(7, "https://a/works/5")];
        let action = toggle(&bookmarks, &work("https://a/works/5"));
        assert_eq!(
            action,
            BookmarkAction::Remove {
                id: 7,
                title: "Work 7".into()
            }
        );
    }
}
