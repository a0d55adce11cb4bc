//! Dated on-disk report storage.

use std::path::{Path, PathBuf};

use tracing::info;

use super::error::ReportError;
use super::model::RunReport;
use super::render::render_markdown;

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_MARKDOWN: &str = "report.md";

/// Stores reports as `<dir>/<YYYY-MM-DD>/report.{json,md}`.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory a report started at `report.started_at` is stored in.
    pub fn dated_dir(&self, report: &RunReport) -> PathBuf {
        self.dir
            .join(report.started_at.format("%Y-%m-%d").to_string())
    }

    /// Write the JSON and Markdown forms; a later run on the same day
    /// replaces them. Returns the dated directory.
    pub fn persist(&self, report: &RunReport) -> Result<PathBuf, ReportError> {
        let dir = self.dated_dir(report);
        std::fs::create_dir_all(&dir).map_err(|e| ReportError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let mut json = serde_json::to_string_pretty(report)?;
        json.push('\n');
        let markdown = render_markdown(report)?;

        for (name, contents) in [(REPORT_JSON, json), (REPORT_MARKDOWN, markdown)] {
            let path = dir.join(name);
            std::fs::write(&path, contents).map_err(|e| ReportError::Io { path, source: e })?;
        }

        info!(path = %dir.display(), "Persisted run report");
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn persists_under_dated_directory() {
        let tmp = TempDir::new().unwrap();
        let store = ReportStore::new(tmp.path());
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();
        let mut report = RunReport::start(at, false);
        report.record_error(Some("nyc"), "boom");
        let report = report.finish(at);

        let dir = store.persist(&report).unwrap();
        assert_eq!(dir, tmp.path().join("2024-06-01"));

        let json = std::fs::read_to_string(dir.join(REPORT_JSON)).unwrap();
        let reloaded: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, report);
        assert!(std::fs::read_to_string(dir.join(REPORT_MARKDOWN)).unwrap().contains("boom"));
    }
}
