//! Progress-callback trait for per-area extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as each business-area document is read, parsed and written.
//!
//! # Example
//!
//! ```rust
//! use edgequake_mita2json::{BusinessArea, DocumentFamily, ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     records: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_area_complete(&self, area: BusinessArea, family: DocumentFamily, record_count: usize) {
//!         let total = self.records.fetch_add(record_count, Ordering::SeqCst) + record_count;
//!         eprintln!("{family} {area}: {record_count} records ({total} so far)");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { records: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::area::{BusinessArea, DocumentFamily};
use crate::output::WriteStatus;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each area/family pair.
///
/// All methods default to no-ops. With `concurrency > 1`, area events may
/// arrive concurrently from different tasks, so implementations must
/// synchronise any shared state.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_run_start(&self, total_jobs: usize) {
        let _ = total_jobs;
    }

    fn on_area_start(&self, area: BusinessArea, family: DocumentFamily) {
        let _ = (area, family);
    }

    /// Called for every record once its file is written or skipped.
    fn on_record(&self, area: BusinessArea, family: DocumentFamily, process_name: &str, status: WriteStatus) {
        let _ = (area, family, process_name, status);
    }

    fn on_area_complete(&self, area: BusinessArea, family: DocumentFamily, record_count: usize) {
        let _ = (area, family, record_count);
    }

    /// Called when an area fails; the run continues with the next one.
    fn on_area_error(&self, area: BusinessArea, family: DocumentFamily, error: &str) {
        let _ = (area, family, error);
    }

    fn on_run_complete(&self, total_jobs: usize, succeeded: usize) {
        let _ = (total_jobs, succeeded);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Alias for the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        records: AtomicUsize,
        errors: Mutex<Vec<String>>,
        succeeded: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_area_start(&self, _area: BusinessArea, _family: DocumentFamily) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record(&self, _area: BusinessArea, _family: DocumentFamily, _name: &str, status: WriteStatus) {
            if status == WriteStatus::Written {
                self.records.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_area_error(&self, area: BusinessArea, _family: DocumentFamily, error: &str) {
            self.errors.lock().unwrap().push(format!("{area}: {error}"));
        }

        fn on_run_complete(&self, _total_jobs: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_area_start(BusinessArea::CareManagement, DocumentFamily::Bpt);
        cb.on_record(BusinessArea::CareManagement, DocumentFamily::Bpt, "Establish Case", WriteStatus::Written);
        cb.on_area_error(BusinessArea::PlanManagement, DocumentFamily::Bcm, "missing");
        cb.on_area_complete(BusinessArea::CareManagement, DocumentFamily::Bpt, 1);
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_area_start(BusinessArea::CareManagement, DocumentFamily::Bpt);
        tracker.on_record(BusinessArea::CareManagement, DocumentFamily::Bpt, "A B", WriteStatus::Written);
        tracker.on_record(BusinessArea::CareManagement, DocumentFamily::Bpt, "C D", WriteStatus::Skipped);
        tracker.on_area_error(BusinessArea::PlanManagement, DocumentFamily::Bcm, "no source");
        tracker.on_run_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.records.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.lock().unwrap()[0], "Plan Management: no source");
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(18);
    }
}
