//! Minimal EPUB 3 writer.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::app::{Ao3Error, Result};

use super::Exporter;

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

pub struct EpubExporter {
    output_dir: PathBuf,
}

impl EpubExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination for `output_name` inside the output directory.
    pub fn target_path(&self, output_name: &str) -> PathBuf {
        self.output_dir.join(sanitize_file_name(output_name))
    }
}

impl Exporter for EpubExporter {
    fn export(
        &self,
        title: &str,
        author: &str,
        chapters: &[String],
        output_name: &str,
    ) -> Result<PathBuf> {
        let target = self.target_path(output_name);
        self.write_atomically(&target, title, author, chapters)
            .map_err(|e| Ao3Error::Export(format!("{}: {}", target.display(), e)))?;

        tracing::info!("Wrote {} ({} chapters)", target.display(), chapters.len());
        Ok(target)
    }
}

impl EpubExporter {
    /// Build the archive in a scratch file of its own, then rename it over
    /// `target`. Concurrent exports never share a scratch file, and the
    /// scratch file is removed on drop if anything fails.
    fn write_atomically(
        &self,
        target: &Path,
        title: &str,
        author: &str,
        chapters: &[String],
    ) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix(".ao3-export-")
            .suffix(".partial")
            .tempfile_in(&self.output_dir)?;

        write_epub(scratch.as_file(), title, author, chapters)?;
        scratch.as_file().sync_all()?;
        scratch.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Replace characters that are unsafe in file names and ensure an
/// `.epub` extension.
pub fn sanitize_file_name(name: &str) -> String {
    let mut cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned_lower = cleaned.to_lowercase();
    let stem = cleaned_lower.strip_suffix(".epub").unwrap_or(&cleaned_lower);
    if stem.trim_matches(|c| c == '.' || c == ' ').is_empty() {
        cleaned = "untitled".to_string();
    }
    if !cleaned.to_lowercase().ends_with(".epub") {
        cleaned.push_str(".epub");
    }
    cleaned
}

fn book_identifier(title: &str, author: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(author.as_bytes());
    format!("urn:sha256:{}", hex::encode(hasher.finalize()))
}

fn escape(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn write_epub(file: &fs::File, title: &str, author: &str, chapters: &[String]) -> Result<()> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let deflated = SimpleFileOptions::default();

    // Readers locate the format by an uncompressed mimetype entry at offset 0.
    zip.start_file(
        "mimetype",
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", deflated)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    zip.start_file("OEBPS/content.opf", deflated)?;
    zip.write_all(content_opf(title, author, chapters.len()).as_bytes())?;

    zip.start_file("OEBPS/nav.xhtml", deflated)?;
    zip.write_all(nav_xhtml(title, chapters.len()).as_bytes())?;

    zip.start_file("OEBPS/toc.ncx", deflated)?;
    zip.write_all(toc_ncx(title, author, chapters.len()).as_bytes())?;

    for (i, chapter) in chapters.iter().enumerate() {
        let n = i + 1;
        zip.start_file(format!("OEBPS/chap_{}.xhtml", n), deflated)?;
        zip.write_all(chapter_xhtml(n, chapter).as_bytes())?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}

fn content_opf(title: &str, author: &str, chapter_count: usize) -> String {
    let modified = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let mut manifest = String::new();
    manifest.push_str("    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n");
    manifest.push_str("    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n");
    let mut spine = String::from("    <itemref idref=\"nav\"/>\n");
    for n in 1..=chapter_count {
        manifest.push_str(&format!(
            "    <item id=\"chap_{n}\" href=\"chap_{n}.xhtml\" media-type=\"application/xhtml+xml\"/>\n"
        ));
        spine.push_str(&format!("    <itemref idref=\"chap_{n}\"/>\n"));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="book-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="book-id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{author}</dc:creator>
    <dc:language>en</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
        id = book_identifier(title, author),
        title = escape(title),
        author = escape(author),
    )
}

fn nav_xhtml(title: &str, chapter_count: usize) -> String {
    let items: String = (1..=chapter_count)
        .map(|n| format!("      <li><a href=\"chap_{n}.xhtml\">Chapter {n}</a></li>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="en">
<head><title>{title}</title></head>
<body>
  <nav epub:type="toc" id="toc">
    <ol>
{items}    </ol>
  </nav>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn toc_ncx(title: &str, author: &str, chapter_count: usize) -> String {
    let points: String = (1..=chapter_count)
        .map(|n| {
            format!(
                "    <navPoint id=\"chap_{n}\" playOrder=\"{n}\">\n      <navLabel><text>Chapter {n}</text></navLabel>\n      <content src=\"chap_{n}.xhtml\"/>\n    </navPoint>\n"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{id}"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{points}  </navMap>
</ncx>
"#,
        id = book_identifier(title, author),
        title = escape(title),
    )
}

fn chapter_xhtml(n: usize, text: &str) -> String {
    let paragraphs: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("  <p>{}</p>\n", escape(line)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" lang="en">
<head><title>Chapter {n}</title></head>
<body>
  <h1>Chapter {n}</h1>
{paragraphs}</body>
</html>
"#
    )
}
