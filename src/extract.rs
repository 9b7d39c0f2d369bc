//! Extraction entry points: one source document in, one JSON file per
//! process out.
//!
//! [`extract_document`] is the pure core. It turns an already-read
//! [`SourceDocument`] into records and touches no files. [`extract_area`]
//! wraps it with source lookup, pdfium reading and atomic output writes.
//! [`extract_all`] runs every area/family pair a config selects and never
//! stops at a failing area: failures are recorded in the summary.
//! For progressive results use [`crate::stream::extract_stream`].

use crate::area::{BusinessArea, DocumentFamily};
use crate::config::ExtractionConfig;
use crate::error::{AreaError, Mita2JsonError};
use crate::output::{
    images_dir, record_path, AreaOutcome, AreaReport, ExtractionSummary, WriteStatus, WrittenFile,
};
use crate::pipeline::assemble::{assemble_bcm, assemble_bpt, parse_process_details, today, RecordContext};
use crate::pipeline::boundary::{detect_bcm_processes, detect_bpt_processes};
use crate::pipeline::images::{DiagramSource, NoDiagrams, ScannedDiagrams};
use crate::pipeline::matrix::{extract_capability_questions, MatrixScope};
use crate::pipeline::source::{locate_source, read_document, read_document_with_images, SourceDocument};
use crate::record::ExtractedRecord;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract every process record from a document that has already been read.
///
/// No I/O and no diagrams. Records come out in document order.
pub fn extract_document(
    doc: &SourceDocument,
    area: BusinessArea,
    family: DocumentFamily,
    config: &ExtractionConfig,
) -> Vec<ExtractedRecord> {
    extract_document_with(doc, area, family, config, &NoDiagrams)
}

/// [`extract_document`] with a diagram source for BPT records.
pub fn extract_document_with(
    doc: &SourceDocument,
    area: BusinessArea,
    family: DocumentFamily,
    config: &ExtractionConfig,
    diagrams: &dyn DiagramSource,
) -> Vec<ExtractedRecord> {
    let ctx = RecordContext {
        area,
        version: config.version.clone(),
        version_date: config.version_date.clone(),
        source_file: doc.id.clone(),
        extracted_date: today(),
    };
    let policy = &config.policy;
    let flat = doc.flatten();

    match family {
        DocumentFamily::Bpt => detect_bpt_processes(&flat.lines, area, policy)
            .into_iter()
            .map(|slice| {
                let pages = flat.page_span(slice.start_line, slice.end_line);
                let details = parse_process_details(slice.lines(&flat.lines), area, &slice.name, policy);
                let found = diagrams.diagrams_for(area.code(), &slice.name, pages);
                debug!("BPT '{}': pages {}-{}, {} diagrams", slice.name, pages.0, pages.1, found.len());
                ExtractedRecord::Bpt(assemble_bpt(&ctx, &slice, details, found, pages))
            })
            .collect(),
        DocumentFamily::Bcm => detect_bcm_processes(&flat.lines, area, policy)
            .into_iter()
            .map(|slice| {
                let pages = flat.page_span(slice.start_line, slice.end_line);
                let scope = MatrixScope {
                    doc,
                    area,
                    process_name: &slice.name,
                    first_page: pages.0,
                    last_page: pages.1,
                };
                let (questions, mode) = extract_capability_questions(
                    &scope,
                    slice.lines(&flat.lines),
                    config.layout.as_ref(),
                    policy,
                );
                debug!("BCM '{}': {} questions ({:?})", slice.name, questions.len(), mode);
                ExtractedRecord::Bcm(assemble_bcm(&ctx, &slice, questions, mode, pages))
            })
            .collect(),
    }
}

/// Write one record as pretty JSON under `output_base`.
///
/// Uses atomic write (temp file + rename). An existing file is left alone
/// unless `overwrite` is set.
pub async fn write_record(
    record: &ExtractedRecord,
    output_base: &Path,
    overwrite: bool,
) -> Result<WrittenFile, Mita2JsonError> {
    let path = record_path(output_base, record);
    let process_name = record.process_name().to_string();

    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|e| Mita2JsonError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    if !overwrite && exists {
        debug!("Keeping existing {}", path.display());
        return Ok(WrittenFile {
            process_name,
            path,
            status: WriteStatus::Skipped,
        });
    }

    let json = serde_json::to_string_pretty(record).map_err(|e| Mita2JsonError::SerializeFailed {
        name: process_name.clone(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Mita2JsonError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Mita2JsonError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| Mita2JsonError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(WrittenFile {
        process_name,
        path,
        status: WriteStatus::Written,
    })
}

/// Extract one area/family pair and write its records.
///
/// # Errors
/// Fatal for this pair only:
/// - No PDF in the source directory
/// - The PDF cannot be opened or read
/// - An output file cannot be written
pub async fn extract_area(
    area: BusinessArea,
    family: DocumentFamily,
    config: &ExtractionConfig,
) -> Result<AreaReport, Mita2JsonError> {
    let start = Instant::now();
    info!("Extracting {} {}", family, area);

    let pdf_path = locate_source(&config.source_base, family, area)?;
    let lib_dir = config.pdfium_lib_dir.as_deref();
    let (doc, diagrams): (SourceDocument, Box<dyn DiagramSource>) =
        if config.with_images && family == DocumentFamily::Bpt {
            let (doc, images) = read_document_with_images(&pdf_path, lib_dir, config.policy.min_image_px).await?;
            let source = ScannedDiagrams::new(images, images_dir(&config.output_base, area));
            debug!("{} {}: {} candidate diagrams", family, area, source.len());
            (doc, Box::new(source) as Box<dyn DiagramSource>)
        } else {
            (read_document(&pdf_path, lib_dir).await?, Box::new(NoDiagrams) as Box<dyn DiagramSource>)
        };

    // Diagram export writes PNG files, so the whole pass runs off the runtime.
    let cfg = config.clone();
    let records = tokio::task::spawn_blocking(move || {
        extract_document_with(&doc, area, family, &cfg, diagrams.as_ref())
    })
    .await
    .map_err(|e| Mita2JsonError::Internal(format!("Extraction task panicked: {}", e)))?;

    if records.is_empty() {
        warn!("{} {}: no processes detected in '{}'", family, area, pdf_path.display());
    }

    let mut files = Vec::with_capacity(records.len());
    for record in &records {
        let written = write_record(record, &config.output_base, config.overwrite).await?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_record(area, family, &written.process_name, written.status);
        }
        files.push(written);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "{} {}: {} records in {}ms",
        family,
        area,
        records.len(),
        duration_ms
    );

    Ok(AreaReport {
        area,
        family,
        source_file: pdf_path,
        records,
        files,
        duration_ms,
    })
}

/// Run one pair and fold any fatal error into its outcome, firing the
/// per-area callbacks.
pub(crate) async fn extract_outcome(
    area: BusinessArea,
    family: DocumentFamily,
    config: &ExtractionConfig,
) -> AreaOutcome {
    if let Some(ref cb) = config.progress_callback {
        cb.on_area_start(area, family);
    }

    let result = extract_area(area, family, config).await.map_err(|e| {
        warn!("{} {} failed: {}", family, area, e);
        AreaError::from_fatal(area.name(), family.tag(), &e)
    });

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(report) => cb.on_area_complete(area, family, report.records.len()),
            Err(e) => cb.on_area_error(area, family, &e.to_string()),
        }
    }

    AreaOutcome { area, family, result }
}

/// Extract every area/family pair selected by `config`.
///
/// Outcomes are returned in the order of [`ExtractionConfig::jobs`],
/// whatever order they finished in.
pub async fn extract_all(config: &ExtractionConfig) -> Result<ExtractionSummary, Mita2JsonError> {
    let start = Instant::now();
    let jobs = config.jobs();
    let total = jobs.len();
    info!("Starting extraction of {} documents", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut outcomes: Vec<AreaOutcome> = stream::iter(jobs.iter().map(|&(area, family)| {
        let cfg = config.clone();
        async move { extract_outcome(area, family, &cfg).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    outcomes.sort_by_key(|o| {
        jobs.iter()
            .position(|&(a, f)| a == o.area && f == o.family)
            .unwrap_or(usize::MAX)
    });

    let summary = ExtractionSummary::from_outcomes(outcomes, start.elapsed().as_millis() as u64);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, summary.stats.areas_succeeded);
    }

    info!(
        "Extraction complete: {}/{} documents, {} records, {} written, {} skipped",
        summary.stats.areas_succeeded,
        total,
        summary.stats.records_total,
        summary.stats.files_written,
        summary.stats.files_skipped
    );
    Ok(summary)
}

/// Synchronous wrapper around [`extract_all`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_all_sync(config: &ExtractionConfig) -> Result<ExtractionSummary, Mita2JsonError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Mita2JsonError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_all(config))
}
