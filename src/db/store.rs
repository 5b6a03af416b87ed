use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewCarPark, NewTrail, NewTransportLink, TrailSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Keyed writes and the trail snapshot the importers need.
///
/// Every upsert is idempotent on its key fields and returns the row id.
#[async_trait]
pub trait TrailStore: Send + Sync {
    /// Keyed by `name`
    async fn upsert_trail(&self, trail: &NewTrail) -> Result<i64, StoreError>;

    /// All trails, ordered by id
    async fn load_trail_snapshot(&self) -> Result<Vec<TrailSummary>, StoreError>;

    /// Keyed by `(name, trail_id)`
    async fn upsert_car_park(&self, car_park: &NewCarPark) -> Result<i64, StoreError>;

    /// Keyed by `(name, trail_id, transport_type)`
    async fn upsert_transport_link(&self, link: &NewTransportLink) -> Result<i64, StoreError>;
}

pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), StoreError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(StoreError::Invalid(format!(
            "coordinates out of range: ({}, {})",
            latitude, longitude
        )));
    }
    Ok(())
}

pub(crate) fn validate_trail(trail: &NewTrail) -> Result<(), StoreError> {
    validate_coordinates(trail.latitude, trail.longitude)?;
    if trail.name.is_empty() {
        return Err(StoreError::Invalid("trail name is empty".into()));
    }
    if !(trail.length_km >= 0.0) || !(trail.elevation_gain_m >= 0.0) {
        return Err(StoreError::Invalid(format!(
            "negative metrics for {}: length {} km, gain {} m",
            trail.name, trail.length_km, trail.elevation_gain_m
        )));
    }
    Ok(())
}
