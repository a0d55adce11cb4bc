//! Markdown rendering of run reports.

use askama::Template;

use super::error::ReportError;
use super::model::{CityReport, RunReport};

/// Markdown report document.
#[derive(Template)]
#[template(path = "report.md")]
pub struct ReportTemplate {
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub errors: Vec<String>,
    pub cities: Vec<CityView>,
}

/// City section view model.
#[derive(Debug, Clone)]
pub struct CityView {
    pub city: String,
    pub source: String,
    pub lines_processed: String,
    pub new_stations: Vec<String>,
    pub updated_stations: Vec<String>,
    pub removed_stations: Vec<String>,
    pub line_errors: Vec<String>,
    pub color_warnings: Vec<String>,
    pub unregistered_lines: Vec<String>,
    pub verification_notes: Vec<String>,
    pub error: Option<String>,
}

impl CityView {
    pub fn from_report(c: &CityReport) -> Self {
        let lines: Vec<&str> = c.lines_processed.iter().map(|l| l.as_str()).collect();
        Self {
            city: c.city.clone(),
            source: c.source.clone().unwrap_or_else(|| "-".to_string()),
            lines_processed: if lines.is_empty() {
                "none".to_string()
            } else {
                lines.join(", ")
            },
            new_stations: c
                .new_stations
                .iter()
                .map(|s| format!("#{} {} ({}) at {}", s.id, s.name, s.line, s.coordinate))
                .collect(),
            updated_stations: c
                .updated_stations
                .iter()
                .map(|s| format!("#{} {} ({}) moved {} -> {}", s.id, s.name, s.line, s.from, s.to))
                .collect(),
            removed_stations: c
                .removed_stations
                .iter()
                .map(|s| format!("#{} {} ({})", s.id, s.name, s.line))
                .collect(),
            line_errors: c
                .line_errors
                .iter()
                .map(|e| format!("{}: {}", e.line, e.message))
                .collect(),
            color_warnings: c.color_warnings.clone(),
            unregistered_lines: c
                .unregistered_lines
                .iter()
                .map(|u| match (&u.suggestion, u.score) {
                    (Some(line), Some(score)) => {
                        format!("{} ({}), maybe {} (score {:.2})", u.name, u.element, line, score)
                    }
                    _ => format!("{} ({})", u.name, u.element),
                })
                .collect(),
            verification_notes: c.verification_notes.clone(),
            error: c.error.clone(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.new_stations.is_empty()
            && self.updated_stations.is_empty()
            && self.removed_stations.is_empty()
            && self.line_errors.is_empty()
            && self.color_warnings.is_empty()
            && self.unregistered_lines.is_empty()
            && self.verification_notes.is_empty()
            && self.error.is_none()
    }
}

/// Render a report as Markdown.
pub fn render_markdown(report: &RunReport) -> Result<String, ReportError> {
    let template = ReportTemplate {
        started_at: report.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        finished_at: report
            .finished_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unfinished".to_string()),
        dry_run: report.dry_run,
        errors: report.errors.clone(),
        cities: report.cities.iter().map(CityView::from_report).collect(),
    };
    Ok(template.render()?)
}
