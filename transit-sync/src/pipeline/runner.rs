//! The sequential city loop.
//!
//! Cities are processed one after another: the Overpass API enforces a
//! global rate limit, and each city's cache entry and artifacts are only
//! touched by its own step. A failing or panicking city is recorded in the
//! report and the loop moves on, so a run always ends with a report.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactWriter, build_dataset};
use crate::domain::{CanonicalStation, RawElement};
use crate::overpass::{FetchOrigin, Fetcher, OverpassSource, ResponseCache, build_query};
use crate::registry::{Registry, RegistryStore};
use crate::report::{CityReport, LineErrorEntry, RunReport, UnregisteredEntry};
use crate::verify::{NoVerifier, StationVerifier};

use super::config::RunOptions;
use super::error::CityError;
use super::lines::{assemble_line, color_warnings, find_unregistered_lines};
use super::reconcile::{PriorStore, reconcile};
use super::stations::{LineStations, locate_stations};

/// The sync pipeline with its collaborators.
pub struct Pipeline<S, C, P, V = NoVerifier> {
    registries: RegistryStore,
    fetcher: Fetcher<S, C>,
    writer: ArtifactWriter,
    prior: P,
    verifier: V,
    options: RunOptions,
}

impl<S, C, P> Pipeline<S, C, P, NoVerifier>
where
    S: OverpassSource,
    C: ResponseCache,
    P: PriorStore,
{
    pub fn new(
        registries: RegistryStore,
        fetcher: Fetcher<S, C>,
        writer: ArtifactWriter,
        prior: P,
        options: RunOptions,
    ) -> Self {
        Self {
            registries,
            fetcher,
            writer,
            prior,
            verifier: NoVerifier,
            options,
        }
    }
}

impl<S, C, P, V> Pipeline<S, C, P, V>
where
    S: OverpassSource,
    C: ResponseCache,
    P: PriorStore,
    V: StationVerifier,
{
    /// Replace the station verifier; only used when `options.verify` is set.
    pub fn with_verifier<W: StationVerifier>(self, verifier: W) -> Pipeline<S, C, P, W> {
        Pipeline {
            registries: self.registries,
            fetcher: self.fetcher,
            writer: self.writer,
            prior: self.prior,
            verifier,
            options: self.options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &Fetcher<S, C> {
        &self.fetcher
    }

    /// Sync every city in scope and return the finished report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::start(Utc::now(), self.options.dry_run);

        let cities = match self.registries.cities() {
            Ok(cities) => cities,
            Err(e) => {
                error!(error = %e, "Cannot list registries");
                report.record_error(None, e.to_string());
                return report.finish(Utc::now());
            }
        };

        if let Some(wanted) = &self.options.cities {
            for city in wanted.iter().filter(|c| !cities.contains(c)) {
                warn!(city = %city, "No registry for requested city");
                report.record_error(Some(city.as_str()), "no registry document");
            }
        }

        for city in cities.iter().filter(|c| self.options.includes(c)) {
            info!(city = %city, "Syncing city");
            let mut city_report = CityReport::new(city);
            let outcome = AssertUnwindSafe(self.sync_city(city, &mut city_report))
                .catch_unwind()
                .await;
            report.cities.push(city_report);

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(city = %city, error = %e, "City sync failed");
                    report.record_error(Some(city.as_str()), e.to_string());
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(city = %city, panic = %message, "City sync panicked");
                    report.record_error(Some(city.as_str()), format!("internal error: {message}"));
                }
            }
        }

        let (new, updated, removed) = report.counts();
        info!(
            cities = report.cities.len(),
            errors = report.errors.len(),
            new,
            updated,
            removed,
            "Run finished"
        );
        report.finish(Utc::now())
    }

    /// Sync one city, appending what happens to `report`.
    ///
    /// Entries recorded before a failure stay in the report.
    pub async fn sync_city(&self, city: &str, report: &mut CityReport) -> Result<(), CityError> {
        let registry = self.registries.load(city)?;
        let today = self.options.today.unwrap_or_else(|| Utc::now().date_naive());

        let query = build_query(&registry, self.options.query_timeout_secs);
        let fetched = self
            .fetcher
            .fetch_city(city, &query, self.options.use_cache)
            .await?;
        report.source = Some(
            match fetched.origin {
                FetchOrigin::Cache => "cache",
                FetchOrigin::Network => "network",
            }
            .to_string(),
        );

        let (line_elements, points): (Vec<&RawElement>, Vec<&RawElement>) = fetched
            .elements
            .iter()
            .filter(|el| el.is_line_shaped() || el.is_point())
            .partition(|el| el.is_line_shaped());

        let mut matched = Vec::new();
        for (index, spec) in registry.lines.iter().enumerate() {
            let order = registry.line_order(index);
            match assemble_line(spec, order, &line_elements, &registry.local_languages) {
                Ok(line) => {
                    report.lines_processed.push(spec.id.clone());
                    report.color_warnings.extend(color_warnings(&line));
                    matched.push(line);
                }
                Err(shortfall) => {
                    warn!(city, line = %spec.id, reason = %shortfall, "Line skipped");
                    report.line_errors.push(LineErrorEntry {
                        line: spec.id.clone(),
                        message: shortfall.to_string(),
                    });
                }
            }
        }

        let unregistered =
            find_unregistered_lines(&line_elements, &registry, self.options.min_suggestion_score);
        report
            .unregistered_lines
            .extend(unregistered.iter().map(UnregisteredEntry::from));

        let located: Vec<LineStations> = matched
            .iter()
            .map(|line| locate_stations(line, &points, &registry, today))
            .collect();

        let prior = self.prior.load(city)?;
        let reconciliation = reconcile(&located, &prior.stations);
        report.record_diff(&reconciliation.diff);

        if self.options.verify {
            self.verify_new(&registry, &reconciliation.diff.new, report)
                .await;
        }

        let dataset = build_dataset(&registry, &matched, reconciliation.stations, &prior);
        if self.options.dry_run {
            info!(city, "Dry run, artifacts not written");
        } else {
            self.writer.write(city, &dataset)?;
        }

        info!(
            city,
            lines = matched.len(),
            stations = dataset.stations.len(),
            new = report.new_stations.len(),
            updated = report.updated_stations.len(),
            removed = report.removed_stations.len(),
            "City synced"
        );
        Ok(())
    }

    /// Check new stations; the first service failure ends verification for
    /// the city.
    async fn verify_new(
        &self,
        registry: &Registry,
        stations: &[CanonicalStation],
        report: &mut CityReport,
    ) {
        for station in stations {
            match self
                .verifier
                .verify(&station.name, station.coordinate, &registry.bbox)
                .await
            {
                Ok(Some(note)) => report.verification_notes.push(note),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Verification unavailable");
                    report
                        .verification_notes
                        .push(format!("verification unavailable: {e}"));
                    break;
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
