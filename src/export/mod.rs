pub mod epub;

use std::path::PathBuf;

use crate::app::Result;

pub use epub::EpubExporter;

/// Packages a work into a single file on disk.
pub trait Exporter: Send + Sync {
    /// Write `chapters` in order and return the path of the finished file.
    ///
    /// A failed export must leave any earlier file at the same path intact.
    fn export(
        &self,
        title: &str,
        author: &str,
        chapters: &[String],
        output_name: &str,
    ) -> Result<PathBuf>;
}
