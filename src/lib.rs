//! # edgequake-mita2json
//!
//! Convert the MITA 3.0 Business Process Templates (BPT) and Business
//! Capability Matrices (BCM) from PDF into one normalized JSON record per
//! business process.
//!
//! ## Why this crate?
//!
//! The MITA appendices are tables laid out for print. Plain text extraction
//! loses the table structure: section titles, bullets and numbered steps
//! run together with page headers, and the five maturity-level columns of a
//! capability matrix interleave line by line. This crate recovers that
//! structure with deterministic heuristics: section segmentation and list
//! reconstruction for BPT documents, and x/y position clustering of text
//! spans for BCM tables.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (one per business area and family)
//!  │
//!  ├─ 1. Source     locate and read lines + positioned spans (pdfium, spawn_blocking)
//!  ├─ 2. Boundary   split into one slice per business process
//!  ├─ 3. Parse      BPT: sections, lists, numbered steps
//!  │                BCM: column clustering, capability questions
//!  ├─ 4. Assemble   canonical record with provenance
//!  └─ 5. Output     one pretty JSON file per process (atomic write)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_mita2json::{extract_all, BusinessArea, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .areas(vec![BusinessArea::CareManagement])
//!         .source_base("source-pdfs/may-2014-update")
//!         .output_base("data")
//!         .build()?;
//!     let summary = extract_all(&config).await?;
//!     eprintln!("{} records written", summary.stats.files_written);
//!     Ok(())
//! }
//! ```
//!
//! Already have the text? [`extract_document`] runs the parsers on a
//! [`SourceDocument`] with no I/O at all.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mita2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-mita2json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod area;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod stream;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use area::{BusinessArea, CapabilityCategory, DocumentFamily};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, HeuristicPolicy};
pub use error::{AreaError, Mita2JsonError};
pub use extract::{
    extract_all, extract_all_sync, extract_area, extract_document, extract_document_with, write_record,
};
pub use output::{AreaOutcome, AreaReport, ExtractionStats, ExtractionSummary, WriteStatus, WrittenFile};
pub use pipeline::columns::{ColumnLayout, FixedColumnLayout};
pub use pipeline::images::DiagramSource;
pub use pipeline::source::SourceDocument;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{
    BcmRecord, CapabilityQuestion, Diagram, ExtractedRecord, ExtractionMode, MaturityLevels, ProcessDetails,
    ProcessRecord, Provenance, TriggerEvents,
};
pub use stream::extract_stream;
pub use validate::{validate_dir, validate_file, validate_record, validate_value, ValidationReport};
