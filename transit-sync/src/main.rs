use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_sync::artifacts::ArtifactWriter;
use transit_sync::config::SyncConfig;
use transit_sync::domain::BoundingBox;
use transit_sync::overpass::{BulkFetcher, DiskCache, Fetcher, OverpassClient, OverpassConfig};
use transit_sync::pipeline::Pipeline;
use transit_sync::registry::RegistryStore;
use transit_sync::report::{LogNotifier, Notifier, ReportStore, render_markdown};
use transit_sync::seed::seed_city;
use transit_sync::verify::{NominatimConfig, NominatimVerifier};

/// Keep city transit artifacts in step with OpenStreetMap.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Only process these cities (comma-separated); defaults to every registry
    #[arg(long, global = true, value_delimiter = ',')]
    cities: Vec<String>,

    /// Compute everything but write nothing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Directory holding the per-city registry documents
    #[arg(long, global = true)]
    registry_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, PartialEq)]
enum Command {
    /// Sync every city in scope (the default)
    Sync,
    /// Write a draft registry for a new city from OSM route relations
    Seed {
        city: String,
        /// south,west,north,east
        #[arg(value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,
        #[arg(required = true)]
        relations: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("transit_sync=info")),
        )
        .init();

    let mut config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if !args.cities.is_empty() {
        config = config.with_cities(args.cities);
    }
    if args.dry_run {
        config = config.with_dry_run(true);
    }
    if let Some(dir) = args.registry_dir {
        config.registry_dir = dir;
    }

    let mut overpass_config = OverpassConfig::new();
    if let Some(url) = &config.overpass_url {
        overpass_config = overpass_config.with_base_url(url);
    }
    let client = match OverpassClient::new(overpass_config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Overpass client");
            return ExitCode::FAILURE;
        }
    };

    match args.command.unwrap_or(Command::Sync) {
        Command::Sync => sync(config, client).await,
        Command::Seed {
            city,
            bbox,
            relations,
        } => seed(&config, client, &city, bbox, &relations).await,
    }
}

async fn sync(config: SyncConfig, client: OverpassClient) -> ExitCode {
    let writer = ArtifactWriter::new(&config.output_dir, &config.public_dir);
    let pipeline = Pipeline::new(
        RegistryStore::open(&config.registry_dir),
        Fetcher::new(client, DiskCache::new(&config.cache_dir)),
        writer.clone(),
        writer,
        config.run_options(),
    );

    let report = if config.verify {
        let mut nominatim = NominatimConfig::new();
        if let Some(url) = &config.nominatim_url {
            nominatim = nominatim.with_base_url(url);
        }
        match NominatimVerifier::new(nominatim) {
            Ok(verifier) => pipeline.with_verifier(verifier).run().await,
            Err(e) => {
                warn!(error = %e, "Verifier unavailable, running without verification");
                pipeline.run().await
            }
        }
    } else {
        pipeline.run().await
    };

    let store = ReportStore::new(&config.report_dir);
    if let Err(e) = store.persist(&report) {
        error!(error = %e, "Failed to persist run report");
        return ExitCode::FAILURE;
    }

    if config.notify {
        match render_markdown(&report) {
            Ok(body) => {
                if let Err(e) = LogNotifier.send(&report.subject(), &body).await {
                    warn!(error = %e, "Report delivery failed");
                }
            }
            Err(e) => warn!(error = %e, "Failed to render report for delivery"),
        }
    }

    info!(subject = %report.subject(), "Done");
    ExitCode::SUCCESS
}

async fn seed(
    config: &SyncConfig,
    client: OverpassClient,
    city: &str,
    bbox: BoundingBox,
    relations: &[i64],
) -> ExitCode {
    let store = RegistryStore::open(&config.registry_dir);
    match seed_city(&store, &BulkFetcher::new(client), city, bbox, relations).await {
        Ok(outcome) => {
            for (id, reason) in &outcome.skipped {
                warn!(element = %id, reason = %reason, "Relation left out of draft");
            }
            info!(path = %outcome.path.display(), lines = outcome.registry.lines.len(), "Seeded");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(city, error = %e, "Seeding failed");
            ExitCode::FAILURE
        }
    }
}

/// Parse `south,west,north,east`.
fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("{value:?}: {e}"))?;
    let [south, west, north, east] = parts.as_slice() else {
        return Err(format!("expected four numbers south,west,north,east, got {}", parts.len()));
    };
    BoundingBox::new(*south, *west, *north, *east).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_sync() {
        let args = Args::try_parse_from(["transit-sync"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.cities.is_empty());

        let args = Args::try_parse_from(["transit-sync", "sync", "--cities", "nyc,paris", "--dry-run"])
            .unwrap();
        assert_eq!(args.command, Some(Command::Sync));
        assert_eq!(args.cities, vec!["nyc", "paris"]);
        assert!(args.dry_run);
    }

    #[test]
    fn seed_parses_bbox_and_relations() {
        let args = Args::try_parse_from([
            "transit-sync",
            "seed",
            "nyc",
            "40.70,-74.02,40.78,-73.95",
            "10",
            "11",
        ])
        .unwrap();
        let Some(Command::Seed {
            city,
            bbox,
            relations,
        }) = args.command
        else {
            panic!("expected seed");
        };
        assert_eq!(city, "nyc");
        assert_eq!(bbox, BoundingBox::new(40.70, -74.02, 40.78, -73.95).unwrap());
        assert_eq!(relations, vec![10, 11]);
    }

    #[test]
    fn seed_rejects_bad_input() {
        for argv in [
            vec!["transit-sync", "seed", "nyc", "40.70,-74.02,40.78", "10"],
            vec!["transit-sync", "seed", "nyc", "40.78,-74.02,40.70,-73.95", "10"],
            vec!["transit-sync", "seed", "nyc", "40.70,-74.02,40.78,-73.95"],
            vec!["transit-sync", "seed", "nyc", "40.70,-74.02,40.78,-73.95", "ten"],
            vec!["transit-sync", "unknown"],
        ] {
            assert!(Args::try_parse_from(&argv).is_err(), "{argv:?}");
        }
    }
}
