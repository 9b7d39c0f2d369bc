//! Pipeline stages for MITA PDF-to-JSON extraction.
//!
//! Each submodule implements one step of layout recovery. Everything
//! except [`source`] and [`images`] is pure text processing, so each stage
//! can be tested on hand-written lines without a PDF.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ boundary ─▶ sections ─▶ lists / steps ──────┐
//! source ────┤   (BPT)                                       ├─▶ assemble
//! (pdfium)   └─▶ boundary ─▶ columns ─▶ matrix ──────────────┘
//!                (BCM)       (x → column, y → row)
//! ```
//!
//! 1. [`source`]    locate the area's PDF and read lines and positioned spans;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 2. [`normalize`] line cleanup and page-furniture predicates used everywhere
//! 3. [`boundary`]  split the line stream into one slice per process
//! 4. [`sections`]  find the ten BPT section titles inside a slice
//! 5. [`lists`] and [`steps`] rebuild paragraphs, bullets and numbered steps
//! 6. [`columns`]   cluster BCM spans into table rows by position
//! 7. [`matrix`]    turn rows into capability questions, with a text fallback
//! 8. [`images`]    export BPT diagrams
//! 9. [`assemble`]  build the final records

pub mod assemble;
pub mod boundary;
pub mod columns;
pub mod images;
pub mod lists;
pub mod matrix;
pub mod normalize;
pub mod sections;
pub mod source;
pub mod steps;
