//! Error types for the edgequake-mita2json library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Mita2JsonError`]: **fatal** for one unit of work: the source PDF for
//!   a business area is missing or unreadable, an output file cannot be
//!   written, or the configuration is invalid. Returned as
//!   `Err(Mita2JsonError)` from the `extract_*` functions.
//!
//! * [`AreaError`]: **non-fatal** for a batch run: one area/family pair
//!   failed but the remaining areas are still processed. Stored inside
//!   [`crate::output::AreaOutcome`] so the batch summary can report it.
//!
//! Heuristic misses (a section that cannot be located, a question without
//! maturity levels) are not errors at all: they yield empty fields and a
//! `warn!` log line.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-mita2json library.
#[derive(Debug, Error)]
pub enum Mita2JsonError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// No PDF exists in the expected source directory for this area/family.
    #[error("No source PDF for {family} '{area}' in '{dir}'\nExpected at least one *.pdf file in that directory.")]
    SourceUnavailable {
        area: String,
        family: String,
        dir: PathBuf,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error while reading a specific page.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    PageReadFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output JSON or image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialised to JSON.
    #[error("Failed to serialise record '{name}': {source}")]
    SerializeFailed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A diagram image could not be encoded.
    #[error("Failed to encode diagram '{path}': {detail}")]
    ImageEncodeFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A business area name or code did not match any known area.
    #[error("Unknown business area '{0}'\nUse a two-letter code (e.g. CM) or a full name (e.g. \"Care Management\").")]
    UnknownArea(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install pdfium system-wide so it is found on the default library path.\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir-containing-libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single area/family extraction inside a batch.
///
/// Stored in [`crate::output::AreaOutcome`]; the batch continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum AreaError {
    /// The source PDF was missing.
    #[error("{family} {area}: no source PDF in {dir}")]
    SourceUnavailable {
        area: String,
        family: String,
        dir: String,
    },

    /// The source PDF could not be read or parsed.
    #[error("{family} {area}: could not read source: {detail}")]
    ReadFailed {
        area: String,
        family: String,
        detail: String,
    },

    /// One or more output files could not be written.
    #[error("{family} {area}: could not write output: {detail}")]
    WriteFailed {
        area: String,
        family: String,
        detail: String,
    },
}

impl AreaError {
    /// Classify a fatal error raised while processing one area/family pair.
    pub fn from_fatal(area: &str, family: &str, err: &Mita2JsonError) -> Self {
        let area = area.to_string();
        let family = family.to_string();
        match err {
            Mita2JsonError::SourceUnavailable { dir, .. } => AreaError::SourceUnavailable {
                area,
                family,
                dir: dir.display().to_string(),
            },
            Mita2JsonError::OutputWriteFailed { .. }
            | Mita2JsonError::SerializeFailed { .. }
            | Mita2JsonError::ImageEncodeFailed { .. } => AreaError::WriteFailed {
                area,
                family,
                detail: err.to_string(),
            },
            _ => AreaError::ReadFailed {
                area,
                family,
                detail: err.to_string(),
            },
        }
    }
}
