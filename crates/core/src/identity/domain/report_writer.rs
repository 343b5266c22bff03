use std::path::Path;

use crate::identity::domain::session_report::SessionReport;

/// Persists the end-of-run report.
pub trait ReportWriter {
    fn write(&self, path: &Path, report: &SessionReport) -> Result<(), Box<dyn std::error::Error>>;
}
