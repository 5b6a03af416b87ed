//! Trail import pipeline: download, filter, rebuild geometry, score, upsert.

use super::elevation::ElevationLookup;
use super::fetcher::{OverpassFetcher, OverpassTransport};
use super::geometry::{self, TrailGeometry};
use super::metrics::{calculate_metrics, estimate_elevation_gain, round_to};
use super::overpass::{parse_element, trails_query, OverpassElement};
use super::report::{ImportReport, SkipReason};
use crate::config::TrailImportConfig;
use crate::db::TrailStore;
use crate::domain::NewTrail;

pub const UNKNOWN_TRAIL_NAME: &str = "Unknown";

/// Name fragments marking generic rights-of-way rather than named trails
const EXCLUDED_NAME_FRAGMENTS: [&str; 2] = ["Public Footpath", "Bridleway"];

/// `highway` values that belong to roads
const ROAD_HIGHWAYS: [&str; 3] = ["residential", "service", "primary"];

/// A trail that passed every filter and only needs metrics
#[derive(Debug, Clone)]
pub struct TrailDraft {
    pub name: String,
    pub geometry: TrailGeometry,
    pub length_km: f64,
}

/// Pure per-element step: decides whether `element` becomes a trail.
pub fn prepare_trail(
    element: &OverpassElement,
    config: &TrailImportConfig,
) -> Result<TrailDraft, SkipReason> {
    let tags = &element.tags;
    let name = tags.get_or("name", UNKNOWN_TRAIL_NAME);

    if EXCLUDED_NAME_FRAGMENTS.iter().any(|f| name.contains(f)) {
        return Err(SkipReason::ExcludedName);
    }
    if tags
        .get("highway")
        .is_some_and(|highway| ROAD_HIGHWAYS.contains(&highway))
    {
        return Err(SkipReason::RoadHighway);
    }

    let geometry = geometry::reconstruct(element).ok_or(SkipReason::NoGeometry)?;

    let centroid = geometry.centroid;
    if !(-90.0..=90.0).contains(&centroid.y) || !(-180.0..=180.0).contains(&centroid.x) {
        return Err(SkipReason::InvalidCoordinates);
    }

    let length_km = geometry.length_km();
    if length_km < config.min_length_km {
        return Err(SkipReason::TooShort);
    }
    if config.skip_extreme_trails && length_km > config.max_length_km {
        return Err(SkipReason::TooLong);
    }

    Ok(TrailDraft {
        name: name.to_string(),
        geometry,
        length_km,
    })
}

/// Adds elevation gain and metrics to a draft.
pub async fn build_trail(
    draft: TrailDraft,
    elevation: Option<&dyn ElevationLookup>,
    sample_stride: usize,
) -> NewTrail {
    let elevation_gain_m =
        estimate_elevation_gain(&draft.geometry.raw_points, sample_stride, elevation).await;
    let metrics = calculate_metrics(draft.length_km, elevation_gain_m);

    NewTrail {
        name: draft.name,
        latitude: draft.geometry.centroid.y,
        longitude: draft.geometry.centroid.x,
        path: draft.geometry.lines,
        length_km: round_to(draft.length_km, 2),
        elevation_gain_m,
        region: draft.geometry.region.to_string(),
        difficulty: metrics.difficulty,
        estimated_duration: metrics.estimated_duration,
    }
}

/// Runs the whole trail phase against `store`.
///
/// A failed download abandons the phase; everything after that is handled
/// per element.
pub async fn import_trails<T: OverpassTransport>(
    fetcher: &OverpassFetcher<T>,
    elevation: Option<&dyn ElevationLookup>,
    store: &dyn TrailStore,
    config: &TrailImportConfig,
    sample_stride: usize,
) -> ImportReport {
    tracing::info!("Importing trails in bbox {}", config.bbox);

    let query = trails_query(&config.bbox, &config.name_keywords);
    let Some(response) = fetcher.fetch(&query).await else {
        tracing::error!("Trail download failed, skipping trail import");
        return ImportReport::abandoned("trails");
    };

    let mut report = ImportReport::new("trails", response.len());
    tracing::info!("Processing {} elements", response.len());

    for value in &response.elements {
        let element = match parse_element(value) {
            Ok(element) => element,
            Err(e) => {
                tracing::debug!("Skipping malformed element: {}", e);
                report.record_skip(SkipReason::Malformed);
                continue;
            }
        };

        let draft = match prepare_trail(&element, config) {
            Ok(draft) => draft,
            Err(reason) => {
                tracing::debug!("Skipping {} {}: {}", element.element_type, element.id, reason);
                report.record_skip(reason);
                continue;
            }
        };

        let trail = build_trail(draft, elevation, sample_stride).await;

        match store.upsert_trail(&trail).await {
            Ok(_) => {
                tracing::info!(
                    "+ {} ({:.1} km) - {} [{}]",
                    trail.name,
                    trail.length_km,
                    trail.difficulty,
                    trail.estimated_duration
                );
                report.record_saved();
            }
            Err(e) => {
                tracing::warn!("Failed to save trail {}: {}", trail.name, e);
                report.record_failed_save();
            }
        }
    }

    report
}
