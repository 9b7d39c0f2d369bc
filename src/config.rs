//! Configuration types for MITA PDF-to-JSON extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. The config is constructed once
//! and passed by reference into every stage; nothing in the pipeline reads
//! global state.
//!
//! The heuristic window sizes that the layout recovery relies on live in
//! [`HeuristicPolicy`], and the BCM column geometry sits behind the
//! [`ColumnLayout`] trait so a different table layout can be plugged in
//! without touching the row or question logic.

use crate::area::{BusinessArea, DocumentFamily};
use crate::error::Mita2JsonError;
use crate::pipeline::columns::{ColumnLayout, FixedColumnLayout};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_mita2json::{BusinessArea, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .areas(vec![BusinessArea::CareManagement])
///     .output_base("out")
///     .overwrite(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.areas.len(), 1);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Root of the source tree. Default: `source-pdfs/may-2014-update`.
    ///
    /// The PDF for an area is the first `*.pdf` in
    /// `<source_base>/<bpt|bcm>/<Area Name>/`.
    pub source_base: PathBuf,

    /// Root of the output tree. Default: `data`.
    pub output_base: PathBuf,

    /// Business areas to process. Default: all nine.
    pub areas: Vec<BusinessArea>,

    /// Document families to process. Default: both.
    pub families: Vec<DocumentFamily>,

    /// Export embedded process diagrams for BPT records. Default: false.
    pub with_images: bool,

    /// Replace existing output files. Default: false (existing files are kept).
    pub overwrite: bool,

    /// Documents processed at once by the batch runners. Default: 1.
    pub concurrency: usize,

    /// Version tag written into records and file names. Default: `3.0`.
    pub version: String,

    /// Human-readable version date. Default: `May 2014`.
    pub version_date: String,

    /// Directory holding the pdfium shared library.
    /// If None, `PDFIUM_LIB_PATH` is consulted, then the system library.
    pub pdfium_lib_dir: Option<PathBuf>,

    /// Heuristic window sizes and thresholds.
    pub policy: HeuristicPolicy,

    /// Column geometry for BCM maturity tables.
    pub layout: Arc<dyn ColumnLayout>,

    /// Optional progress callback for batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            source_base: PathBuf::from("source-pdfs/may-2014-update"),
            output_base: PathBuf::from("data"),
            areas: BusinessArea::ALL.to_vec(),
            families: DocumentFamily::ALL.to_vec(),
            with_images: false,
            overwrite: false,
            concurrency: 1,
            version: "3.0".to_string(),
            version_date: "May 2014".to_string(),
            pdfium_lib_dir: None,
            policy: HeuristicPolicy::default(),
            layout: Arc::new(FixedColumnLayout::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("source_base", &self.source_base)
            .field("output_base", &self.output_base)
            .field("areas", &self.areas)
            .field("families", &self.families)
            .field("with_images", &self.with_images)
            .field("overwrite", &self.overwrite)
            .field("concurrency", &self.concurrency)
            .field("version", &self.version)
            .field("pdfium_lib_dir", &self.pdfium_lib_dir)
            .field("policy", &self.policy)
            .field("layout", &self.layout)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Every (area, family) pair selected by this config, in stable order.
    pub fn jobs(&self) -> Vec<(BusinessArea, DocumentFamily)> {
        let mut jobs = Vec::with_capacity(self.areas.len() * self.families.len());
        for &family in &self.families {
            for &area in &self.areas {
                jobs.push((area, family));
            }
        }
        jobs
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn source_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_base = dir.into();
        self
    }

    pub fn output_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_base = dir.into();
        self
    }

    pub fn areas(mut self, areas: Vec<BusinessArea>) -> Self {
        self.config.areas = areas;
        self
    }

    pub fn families(mut self, families: Vec<DocumentFamily>) -> Self {
        self.config.families = families;
        self
    }

    pub fn with_images(mut self, v: bool) -> Self {
        self.config.with_images = v;
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn version_date(mut self, date: impl Into<String>) -> Self {
        self.config.version_date = date.into();
        self
    }

    pub fn pdfium_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_dir = Some(dir.into());
        self
    }

    pub fn policy(mut self, policy: HeuristicPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn layout(mut self, layout: Arc<dyn ColumnLayout>) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Mita2JsonError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Mita2JsonError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.areas.is_empty() {
            return Err(Mita2JsonError::InvalidConfig(
                "At least one business area must be selected".into(),
            ));
        }
        if c.families.is_empty() {
            return Err(Mita2JsonError::InvalidConfig(
                "At least one document family must be selected".into(),
            ));
        }
        if c.version.trim().is_empty() {
            return Err(Mita2JsonError::InvalidConfig("Version tag must not be empty".into()));
        }
        c.policy.validate()?;
        Ok(self.config)
    }
}

// ── Heuristic policy ─────────────────────────────────────────────────────

/// Window sizes and thresholds used by the layout-recovery heuristics.
///
/// The defaults are tuned to the May 2014 (v3.0) appendices. Each field is
/// independent; override with struct-update syntax:
///
/// ```rust
/// use edgequake_mita2json::HeuristicPolicy;
///
/// let policy = HeuristicPolicy { row_proximity: 12.0, ..HeuristicPolicy::default() };
/// assert_eq!(policy.name_lookback_lines, 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicPolicy {
    /// Lines scanned backward from a `Description` title for the process
    /// name and category banner. Default: 10.
    pub name_lookback_lines: usize,

    /// Lines a BPT process ends before the next process's `Description`
    /// title (the next process's banner sits in between). Default: 5.
    pub process_end_backoff: usize,

    /// A `Description` title further than this many lines into a section is
    /// checked as the start of a new process. Default: 5.
    pub early_description_guard: usize,

    /// Lines scanned after a BCM name candidate for its category banner or
    /// `Capability` table header. Default: 5.
    pub bcm_lookahead_lines: usize,

    /// Lines from the `Performance Measures` title that may hold its
    /// content. Default: 50.
    pub performance_window: usize,

    /// Maximum y distance (points) between spans of the same table row.
    /// Default: 15.0.
    pub row_proximity: f32,

    /// Lines collected after a question in text-only fallback mode.
    /// Default: 50.
    pub fallback_level_lines: usize,

    /// Character cap on the level text collected in fallback mode.
    /// Default: 500.
    pub fallback_level_max_chars: usize,

    /// Lines skipped after each fallback question. Default: 20.
    pub fallback_skip_lines: usize,

    /// Minimum width and height (pixels) of an exported diagram. Default: 200.
    pub min_image_px: u32,
}

impl HeuristicPolicy {
    pub const NAME_LOOKBACK_LINES: usize = 10;
    pub const PROCESS_END_BACKOFF: usize = 5;
    pub const EARLY_DESCRIPTION_GUARD: usize = 5;
    pub const BCM_LOOKAHEAD_LINES: usize = 5;
    pub const PERFORMANCE_WINDOW: usize = 50;
    pub const ROW_PROXIMITY: f32 = 15.0;
    pub const FALLBACK_LEVEL_LINES: usize = 50;
    pub const FALLBACK_LEVEL_MAX_CHARS: usize = 500;
    pub const FALLBACK_SKIP_LINES: usize = 20;
    pub const MIN_IMAGE_PX: u32 = 200;

    fn validate(&self) -> Result<(), Mita2JsonError> {
        if self.row_proximity.is_nan() || self.row_proximity <= 0.0 {
            return Err(Mita2JsonError::InvalidConfig(format!(
                "Row proximity must be > 0, got {}",
                self.row_proximity
            )));
        }
        if self.name_lookback_lines == 0 || self.bcm_lookahead_lines == 0 {
            return Err(Mita2JsonError::InvalidConfig(
                "Look-back and look-ahead windows must be ≥ 1".into(),
            ));
        }
        if self.performance_window == 0 || self.fallback_level_lines == 0 {
            return Err(Mita2JsonError::InvalidConfig(
                "Content windows must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self {
            name_lookback_lines: Self::NAME_LOOKBACK_LINES,
            process_end_backoff: Self::PROCESS_END_BACKOFF,
            early_description_guard: Self::EARLY_DESCRIPTION_GUARD,
            bcm_lookahead_lines: Self::BCM_LOOKAHEAD_LINES,
            performance_window: Self::PERFORMANCE_WINDOW,
            row_proximity: Self::ROW_PROXIMITY,
            fallback_level_lines: Self::FALLBACK_LEVEL_LINES,
            fallback_level_max_chars: Self::FALLBACK_LEVEL_MAX_CHARS,
            fallback_skip_lines: Self::FALLBACK_SKIP_LINES,
            min_image_px: Self::MIN_IMAGE_PX,
        }
    }
}
