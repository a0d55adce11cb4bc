//! Run reports.
//!
//! The report collects, per city, the lines processed, station changes,
//! line and colour warnings, unregistered lines and verification notes.
//! It is persisted as JSON and Markdown in a dated directory and can be
//! handed to a [`Notifier`].

mod error;
mod model;
mod notify;
mod render;
mod store;

pub use error::{NotifyError, ReportError};
pub use model::{
    CityReport, LineErrorEntry, RunReport, StationEntry, UnregisteredEntry, UpdatedEntry,
};
pub use notify::{LogNotifier, Notifier};
pub use render::{CityView, ReportTemplate, render_markdown};
pub use store::{REPORT_JSON, REPORT_MARKDOWN, ReportStore};
