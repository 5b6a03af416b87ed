//! Car park and public transport import, linked to the nearest stored trail.

use super::fetcher::{OverpassFetcher, OverpassTransport};
use super::overpass::{car_parks_query, parse_element, transport_query};
use super::parking::{CarParkCandidate, TransportCandidate};
use super::proximity::find_nearest_trail;
use super::report::{ImportReport, SkipReason};
use crate::config::ServiceImportConfig;
use crate::db::{StoreError, TrailStore};
use crate::domain::TrailSummary;

const CAR_PARK_PROGRESS_EVERY: usize = 50;
const TRANSPORT_PROGRESS_EVERY: usize = 100;

/// Logs "Processing n/total" on every `every`-th counted element
struct Progress {
    every: usize,
    total: usize,
    seen: usize,
}

impl Progress {
    fn new(every: usize, total: usize) -> Self {
        Self {
            every: every.max(1),
            total,
            seen: 0,
        }
    }

    /// Counts one element; true when a progress line was logged
    fn tick(&mut self) -> bool {
        self.seen += 1;
        if self.seen % self.every != 0 {
            return false;
        }
        tracing::info!("Processing {}/{}", self.seen, self.total);
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceImportReport {
    pub car_parks: ImportReport,
    pub transport: ImportReport,
}

impl ServiceImportReport {
    pub fn log_summary(&self) {
        self.car_parks.log_summary();
        self.transport.log_summary();
    }
}

/// Imports car parks, then transport stops.
///
/// The trail snapshot is loaded once and shared by both phases; failing to
/// load it aborts the run.
pub async fn import_services<T: OverpassTransport>(
    fetcher: &OverpassFetcher<T>,
    store: &dyn TrailStore,
    config: &ServiceImportConfig,
) -> Result<ServiceImportReport, StoreError> {
    let trails = store.load_trail_snapshot().await?;
    tracing::info!("Loaded {} trails for linking", trails.len());

    let car_parks = import_car_parks(fetcher, store, config, &trails).await;
    let transport = import_transport(fetcher, store, config, &trails).await;

    Ok(ServiceImportReport {
        car_parks,
        transport,
    })
}

pub async fn import_car_parks<T: OverpassTransport>(
    fetcher: &OverpassFetcher<T>,
    store: &dyn TrailStore,
    config: &ServiceImportConfig,
    trails: &[TrailSummary],
) -> ImportReport {
    tracing::info!("Importing car parks");

    let Some(response) = fetcher.fetch(&car_parks_query(&config.bbox)).await else {
        tracing::error!("Car park download failed, skipping car parks");
        return ImportReport::abandoned("car parks");
    };
    let mut report = ImportReport::new("car parks", response.len());
    tracing::info!("Found {} potential parking spots", response.len());

    let mut progress = Progress::new(CAR_PARK_PROGRESS_EVERY, report.downloaded);

    for value in &response.elements {
        let element = match parse_element(value) {
            Ok(element) => element,
            Err(e) => {
                tracing::debug!("Skipping malformed element: {}", e);
                report.record_skip(SkipReason::Malformed);
                continue;
            }
        };

        let candidate = CarParkCandidate::from_element(&element);
        if !matches!(candidate, Err(SkipReason::NotPublic)) {
            progress.tick();
        }

        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(reason) => {
                tracing::debug!("Skipping {} {}: {}", element.element_type, element.id, reason);
                report.record_skip(reason);
                continue;
            }
        };

        let Some(trail) = find_nearest_trail(candidate.latitude, candidate.longitude, trails)
            .within(config.search_radius_km)
        else {
            report.record_skip(SkipReason::NoNearbyTrail);
            continue;
        };

        let car_park = candidate.link(trail.id);
        match store.upsert_car_park(&car_park).await {
            Ok(_) => {
                tracing::debug!("Linked {} to {}", car_park.name, trail.name);
                report.record_saved();
            }
            Err(e) => {
                tracing::warn!("Failed to save car park {}: {}", car_park.name, e);
                report.record_failed_save();
            }
        }
    }

    report
}

pub async fn import_transport<T: OverpassTransport>(
    fetcher: &OverpassFetcher<T>,
    store: &dyn TrailStore,
    config: &ServiceImportConfig,
    trails: &[TrailSummary],
) -> ImportReport {
    tracing::info!("Importing transport links");

    let Some(response) = fetcher.fetch(&transport_query(&config.bbox)).await else {
        tracing::error!("Transport download failed, skipping transport links");
        return ImportReport::abandoned("transport");
    };
    let mut report = ImportReport::new("transport", response.len());
    tracing::info!("Found {} stations/stops", response.len());

    let mut progress = Progress::new(TRANSPORT_PROGRESS_EVERY, report.downloaded);

    for value in &response.elements {
        progress.tick();

        let element = match parse_element(value) {
            Ok(element) => element,
            Err(e) => {
                tracing::debug!("Skipping malformed element: {}", e);
                report.record_skip(SkipReason::Malformed);
                continue;
            }
        };

        let candidate = match TransportCandidate::from_element(&element) {
            Ok(candidate) => candidate,
            Err(reason) => {
                tracing::debug!("Skipping {} {}: {}", element.element_type, element.id, reason);
                report.record_skip(reason);
                continue;
            }
        };

        let Some(trail) = find_nearest_trail(candidate.latitude, candidate.longitude, trails)
            .within(config.search_radius_km)
        else {
            report.record_skip(SkipReason::NoNearbyTrail);
            continue;
        };

        let link = candidate.link(trail.id);
        match store.upsert_transport_link(&link).await {
            Ok(_) => report.record_saved(),
            Err(e) => {
                tracing::warn!("Failed to save transport link {}: {}", link.name, e);
                report.record_failed_save();
            }
        }
    }

    report
}
