use crate::app::{Ao3Error, Result};

/// Hands a link to something outside the client, usually a browser.
pub trait Opener: Send + Sync {
    fn open(&self, link: &str) -> Result<()>;
}

/// Opens links with the system's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserOpener;

impl Opener for BrowserOpener {
    fn open(&self, link: &str) -> Result<()> {
        open::that(link).map_err(|e| Ao3Error::Other(format!("Could not open {}: {}", link, e)))
    }
}
