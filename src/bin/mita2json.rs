//! CLI binary for edgequake-mita2json.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use edgequake_mita2json::{
    extract_all, validate_dir, validate_record, BusinessArea, DocumentFamily, ExtractionConfig,
    ExtractionProgressCallback, ExtractionSummary, ProgressCallback, ValidationReport, WriteStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over all documents plus a log line per
/// finished area. Areas may finish out of order when `--concurrency > 1`.
struct CliProgressCallback {
    bar: ProgressBar,
    written: AtomicUsize,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            written: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_jobs: usize) {
        self.bar.set_length(total_jobs as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>2}/{len} documents  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_jobs} documents…"))
        ));
    }

    fn on_area_start(&self, area: BusinessArea, family: DocumentFamily) {
        self.bar.set_message(format!("{family} {area}"));
    }

    fn on_record(&self, _area: BusinessArea, _family: DocumentFamily, _name: &str, status: WriteStatus) {
        match status {
            WriteStatus::Written => self.written.fetch_add(1, Ordering::SeqCst),
            WriteStatus::Skipped => self.skipped.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn on_area_complete(&self, area: BusinessArea, family: DocumentFamily, record_count: usize) {
        self.bar.println(format!(
            "  {} {} {:<40} {}",
            green("✓"),
            family,
            area.name(),
            dim(&format!("{record_count:>3} records")),
        ));
        self.bar.inc(1);
    }

    fn on_area_error(&self, area: BusinessArea, family: DocumentFamily, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {} {:<40} {}",
            red("✗"),
            family,
            area.name(),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_jobs: usize, succeeded: usize) {
        let failed = total_jobs.saturating_sub(succeeded);
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}/{} documents  {} files written  {} kept{}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&succeeded.to_string()),
            total_jobs,
            bold(&self.written.load(Ordering::SeqCst).to_string()),
            self.skipped.load(Ordering::SeqCst),
            if failed == 0 {
                String::new()
            } else {
                format!("  ({} failed)", red(&failed.to_string()))
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One business area, both families
  mita2json --area "Care Management"

  # Every area, BCM only, replacing earlier output
  mita2json --all --family bcm --overwrite

  # BPT with process diagrams, then check the records
  mita2json --area EE --family bpt --with-images --validate

  # Check files already on disk without extracting
  mita2json --validate-only --output-dir data

BUSINESS AREAS:
  BR  Business Relationship Management     OM  Operations Management
  CM  Care Management                      PE  Performance Management
  CO  Contractor Management                PL  Plan Management
  EE  Eligibility and Enrollment Management PM  Provider Management
  FM  Financial Management

LAYOUT:
  Sources:  <source-dir>/<bpt|bcm>/<Area Name>/*.pdf  (first PDF by name)
  Output:   <output-dir>/<bpt|bcm>/<area_dir>/<CODE>_<Process_Name>_<BPT|BCM>_v3.0.json
  Diagrams: <output-dir>/bpt/<area_dir>/images/

ENVIRONMENT VARIABLES:
  MITA2JSON_*       Every flag has an env fallback (e.g. MITA2JSON_SOURCE_DIR)
  PDFIUM_LIB_PATH   Directory containing the pdfium shared library
  RUST_LOG          Override the log filter
"#;

/// Convert MITA BPT and BCM PDFs into normalized JSON records.
#[derive(Parser, Debug)]
#[command(
    name = "mita2json",
    version,
    about = "Convert MITA business process templates and capability matrices from PDF to JSON",
    long_about = "Extract one JSON record per business process from the MITA 3.0 Business \
Process Template (BPT) and Business Capability Matrix (BCM) PDFs. Tables are recovered from \
text layout; no network access or model calls are involved.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("selection").args(["areas", "all", "validate_only"]).required(true))
)]
struct Cli {
    /// Business area by code or name (repeatable).
    #[arg(long = "area", env = "MITA2JSON_AREAS", value_delimiter = ',', value_parser = parse_area)]
    areas: Vec<BusinessArea>,

    /// Process all nine business areas.
    #[arg(long, env = "MITA2JSON_ALL")]
    all: bool,

    /// Document family to extract.
    #[arg(long, env = "MITA2JSON_FAMILY", value_enum, default_value = "both")]
    family: FamilyArg,

    /// Export embedded process diagrams for BPT records.
    #[arg(long, env = "MITA2JSON_WITH_IMAGES")]
    with_images: bool,

    /// Replace existing JSON files.
    #[arg(long, env = "MITA2JSON_OVERWRITE")]
    overwrite: bool,

    /// Root of the source PDF tree.
    #[arg(long, env = "MITA2JSON_SOURCE_DIR", default_value = "source-pdfs/may-2014-update")]
    source_dir: PathBuf,

    /// Root of the JSON output tree.
    #[arg(long, env = "MITA2JSON_OUTPUT_DIR", default_value = "data")]
    output_dir: PathBuf,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Documents processed at once.
    #[arg(short, long, env = "MITA2JSON_CONCURRENCY", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..=32))]
    concurrency: u16,

    /// Validate every extracted record and report issues.
    #[arg(long, env = "MITA2JSON_VALIDATE")]
    validate: bool,

    /// Validate the JSON files under --output-dir and exit.
    #[arg(long)]
    validate_only: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "MITA2JSON_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MITA2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MITA2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MITA2JSON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Bpt,
    Bcm,
    Both,
}

impl FamilyArg {
    fn families(self) -> Vec<DocumentFamily> {
        match self {
            FamilyArg::Bpt => vec![DocumentFamily::Bpt],
            FamilyArg::Bcm => vec![DocumentFamily::Bcm],
            FamilyArg::Both => DocumentFamily::ALL.to_vec(),
        }
    }
}

fn parse_area(s: &str) -> Result<BusinessArea, String> {
    s.parse::<BusinessArea>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the bar, so they are off while it shows.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.validate_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Validate-only mode ───────────────────────────────────────────────
    if cli.validate_only {
        let reports = validate_dir(&cli.output_dir);
        if reports.is_empty() {
            anyhow::bail!("No JSON files found under {}", cli.output_dir.display());
        }
        print_validation(&reports, &cli)?;
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let summary = extract_all(&config).await.context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&summary);
    }

    if cli.validate {
        let reports: Vec<ValidationReport> = summary
            .outcomes
            .iter()
            .filter_map(|o| o.report())
            .flat_map(|r| r.records.iter().map(validate_record))
            .collect();
        print_validation(&reports, &cli)?;
    }

    if summary.stats.areas_total > 0 && summary.stats.areas_succeeded == 0 {
        anyhow::bail!("No document could be extracted");
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let areas = if cli.all {
        BusinessArea::ALL.to_vec()
    } else {
        cli.areas.clone()
    };

    let mut builder = ExtractionConfig::builder()
        .source_base(&cli.source_dir)
        .output_base(&cli.output_dir)
        .areas(areas)
        .families(cli.family.families())
        .with_images(cli.with_images)
        .overwrite(cli.overwrite)
        .concurrency(cli.concurrency as usize);

    if let Some(ref dir) = cli.pdfium_lib {
        builder = builder.pdfium_lib_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &ExtractionSummary) {
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => eprintln!(
                "{} {} {:<40} {:>3} records  {:>3} written  {:>3} kept  {}ms",
                green("✓"),
                outcome.family,
                outcome.area.name(),
                report.records.len(),
                report.written(),
                report.skipped(),
                report.duration_ms
            ),
            Err(e) => eprintln!("{} {}", red("✗"), e),
        }
    }
    let s = &summary.stats;
    eprintln!(
        "Extracted {}/{} documents: {} BPT records, {} BCM records ({} questions) in {}ms",
        s.areas_succeeded, s.areas_total, s.bpt_records, s.bcm_records, s.capability_questions, s.total_duration_ms
    );
}

fn print_validation(reports: &[ValidationReport], cli: &Cli) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(reports).context("Failed to serialise validation")?;
        println!("{json}");
        return Ok(());
    }

    let with_issues = reports.iter().filter(|r| !r.is_valid()).count();
    let warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();

    for report in reports {
        if report.is_valid() && (report.warnings.is_empty() || !cli.verbose) {
            continue;
        }
        eprintln!("{}", bold(&report.target));
        for issue in &report.issues {
            eprintln!("  {} {}", red("✗"), issue);
        }
        if cli.verbose {
            for warning in &report.warnings {
                eprintln!("  {} {}", yellow("!"), dim(warning));
            }
        }
    }

    if !cli.quiet {
        eprintln!(
            "{} {} records validated  {} with issues  {} warnings",
            if with_issues == 0 { green("✔") } else { red("✘") },
            bold(&reports.len().to_string()),
            with_issues,
            warnings
        );
    }
    Ok(())
}
