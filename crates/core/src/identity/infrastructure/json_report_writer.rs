use std::fs;
use std::path::{Path, PathBuf};

use crate::identity::domain::report_writer::ReportWriter;
use crate::identity::domain::session_report::SessionReport;

/// Writes the report as pretty-printed JSON.
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn write(&self, path: &Path, report: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        log::info!("Metadata saved to {}", path.display());
        Ok(())
    }
}

/// Default report location: `<stem>_metadata.json` next to the input.
pub fn metadata_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_metadata.json"))
}
