//! Source reading: locate an area's PDF and pull its text out through pdfium.
//!
//! Every page yields two views of the same text. `lines` is pdfium's reading
//! order split on newlines and drives the BPT parsers and boundary
//! detection. `spans` are text segments with their top-left origins and
//! drive column clustering for the capability matrices.
//!
//! pdfium is not safe to call from async contexts, so [`read_document`]
//! runs the whole read inside `spawn_blocking`.

use crate::area::{BusinessArea, DocumentFamily};
use crate::error::Mita2JsonError;
use crate::pipeline::images::{collect_page_images, PageImage};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A run of text with its origin in points, measured from the page's
/// top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourcePage {
    /// 1-based page number.
    pub number: usize,
    pub lines: Vec<String>,
    pub spans: Vec<TextSpan>,
}

/// The extracted text of one source PDF.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceDocument {
    /// Path of the source PDF as it was located, recorded in every record's
    /// provenance.
    pub id: String,
    pub pages: Vec<SourcePage>,
}

/// The whole document as one line stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatLines {
    pub lines: Vec<String>,
    /// `page_of[i]` is the 1-based page holding `lines[i]`.
    pub page_of: Vec<usize>,
}

impl FlatLines {
    /// Page of a line index; indices past the end map to the last page.
    pub fn page_at(&self, line: usize) -> usize {
        self.page_of
            .get(line)
            .or_else(|| self.page_of.last())
            .copied()
            .unwrap_or(1)
    }

    /// Inclusive page range covered by the half-open line range.
    pub fn page_span(&self, start: usize, end: usize) -> (usize, usize) {
        let first = self.page_at(start);
        let last = self.page_at(end.saturating_sub(1).max(start));
        (first, last.max(first))
    }
}

impl SourceDocument {
    /// Build a document from plain page texts, one string per page, with no
    /// positioned spans.
    pub fn from_page_texts<S: AsRef<str>>(id: impl Into<String>, pages: &[S]) -> Self {
        Self {
            id: id.into(),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, text)| SourcePage {
                    number: i + 1,
                    lines: split_lines(text.as_ref()),
                    spans: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn page(&self, number: usize) -> Option<&SourcePage> {
        self.pages.iter().find(|p| p.number == number)
    }

    pub fn flatten(&self) -> FlatLines {
        let mut flat = FlatLines::default();
        for page in &self.pages {
            for line in &page.lines {
                flat.lines.push(line.clone());
                flat.page_of.push(page.number);
            }
        }
        flat
    }

    /// True when any page carries positioned spans.
    pub fn has_spans(&self) -> bool {
        self.pages.iter().any(|p| !p.spans.is_empty())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

// ── Locating ─────────────────────────────────────────────────────────────

/// Directory holding the PDFs of one area and family.
pub fn source_dir(source_base: &Path, family: DocumentFamily, area: BusinessArea) -> PathBuf {
    source_base.join(family.dir_name()).join(area.name())
}

/// First `*.pdf` (by file name) in `<source_base>/<bpt|bcm>/<Area Name>/`.
pub fn locate_source(
    source_base: &Path,
    family: DocumentFamily,
    area: BusinessArea,
) -> Result<PathBuf, Mita2JsonError> {
    let dir = source_dir(source_base, family, area);
    let unavailable = || Mita2JsonError::SourceUnavailable {
        area: area.name().to_string(),
        family: family.tag().to_string(),
        dir: dir.clone(),
    };

    let entries = std::fs::read_dir(&dir).map_err(|_| unavailable())?;
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();

    let first = pdfs.into_iter().next().ok_or_else(unavailable)?;
    debug!("Source for {} {}: {}", family, area, first.display());
    Ok(first)
}

// ── Reading ──────────────────────────────────────────────────────────────

/// Bind pdfium from `lib_dir`, then `PDFIUM_LIB_PATH`, then the system
/// library path.
pub fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, Mita2JsonError> {
    let dir = lib_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            .or_else(|_| Pdfium::bind_to_system_library()),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Mita2JsonError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn check_magic(path: &Path) -> Result<(), Mita2JsonError> {
    let file = std::fs::File::open(path).map_err(|e| Mita2JsonError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut head = Vec::with_capacity(4);
    file.take(4)
        .read_to_end(&mut head)
        .map_err(|e| Mita2JsonError::CorruptPdf {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    verify_magic(path, &head)
}

/// A file shorter than the `%PDF` header is not a PDF either.
fn verify_magic(path: &Path, head: &[u8]) -> Result<(), Mita2JsonError> {
    if head == b"%PDF" {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    magic[..head.len().min(4)].copy_from_slice(&head[..head.len().min(4)]);
    Err(Mita2JsonError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Read a PDF's lines and positioned spans.
pub async fn read_document(
    path: &Path,
    pdfium_lib_dir: Option<&Path>,
) -> Result<SourceDocument, Mita2JsonError> {
    let path = path.to_path_buf();
    let lib_dir = pdfium_lib_dir.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || read_document_blocking(&path, lib_dir.as_deref()))
        .await
        .map_err(|e| Mita2JsonError::Internal(format!("Read task panicked: {}", e)))?
}

/// [`read_document`] that also collects embedded images of at least
/// `min_image_px` in the same pdfium pass.
pub async fn read_document_with_images(
    path: &Path,
    pdfium_lib_dir: Option<&Path>,
    min_image_px: u32,
) -> Result<(SourceDocument, Vec<PageImage>), Mita2JsonError> {
    let path = path.to_path_buf();
    let lib_dir = pdfium_lib_dir.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || read_pdf_blocking(&path, lib_dir.as_deref(), Some(min_image_px)))
        .await
        .map_err(|e| Mita2JsonError::Internal(format!("Read task panicked: {}", e)))?
}

/// Blocking implementation of [`read_document`].
pub fn read_document_blocking(
    path: &Path,
    pdfium_lib_dir: Option<&Path>,
) -> Result<SourceDocument, Mita2JsonError> {
    read_pdf_blocking(path, pdfium_lib_dir, None).map(|(doc, _)| doc)
}

/// Bind pdfium and load the PDF once; images are collected only when
/// `min_image_px` is set.
fn read_pdf_blocking(
    path: &Path,
    pdfium_lib_dir: Option<&Path>,
    min_image_px: Option<u32>,
) -> Result<(SourceDocument, Vec<PageImage>), Mita2JsonError> {
    check_magic(path)?;
    let pdfium = bind_pdfium(pdfium_lib_dir)?;

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Mita2JsonError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let id = path.to_string_lossy().into_owned();

    let mut pages = Vec::new();
    let mut images = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let number = idx + 1;
        let page_height = page.height().value;
        let text = page.text().map_err(|e| Mita2JsonError::PageReadFailed {
            path: path.to_path_buf(),
            page: number,
            detail: format!("{:?}", e),
        })?;

        let mut spans = Vec::new();
        for segment in text.segments().iter() {
            let content = segment.text();
            let content = content.trim();
            if content.is_empty() {
                continue;
            }
            let bounds = segment.bounds();
            spans.push(TextSpan {
                text: content.to_string(),
                x: bounds.left().value,
                y: page_height - bounds.top().value,
            });
        }

        if let Some(min_px) = min_image_px {
            images.extend(collect_page_images(&page, number, min_px));
        }

        pages.push(SourcePage {
            number,
            lines: split_lines(&text.all()),
            spans,
        });
    }

    info!("Read '{}': {} pages, {} images", id, pages.len(), images.len());
    Ok((SourceDocument { id, pages }, images))
}
