use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::store::{validate_coordinates, validate_trail, StoreError, TrailStore};
use crate::domain::{
    CarPark, Difficulty, NewCarPark, NewTrail, NewTransportLink, Trail, TrailSummary,
    TransportLink, TransportType,
};

/// Tables the `clear` command can empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Trails,
    CarParks,
    TransportLinks,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trails => "trails",
            Self::CarParks => "car_parks",
            Self::TransportLinks => "transport_links",
        }
    }
}

#[derive(Debug, FromRow)]
struct TrailRow {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    path: Option<String>,
    length_km: f64,
    elevation_gain_m: f64,
    region: String,
    difficulty: String,
    estimated_duration: String,
    popularity: f64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TrailRow> for Trail {
    type Error = StoreError;

    fn try_from(row: TrailRow) -> Result<Self, Self::Error> {
        let difficulty = Difficulty::parse(&row.difficulty)
            .ok_or_else(|| StoreError::Invalid(format!("unknown difficulty {}", row.difficulty)))?;
        let path = row
            .path
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(|e| StoreError::Invalid(format!("bad path geojson: {}", e)))?;

        Ok(Trail {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            path,
            length_km: row.length_km,
            elevation_gain_m: row.elevation_gain_m,
            region: row.region,
            difficulty,
            estimated_duration: row.estimated_duration,
            popularity: row.popularity,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CarParkRow {
    id: i64,
    trail_id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    capacity: Option<i32>,
    is_free: Option<bool>,
    has_disabled_parking: Option<bool>,
}

impl From<CarParkRow> for CarPark {
    fn from(row: CarParkRow) -> Self {
        CarPark {
            id: row.id,
            trail_id: row.trail_id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            capacity: row.capacity.and_then(|c| u32::try_from(c).ok()),
            is_free: row.is_free,
            has_disabled_parking: row.has_disabled_parking,
        }
    }
}

#[derive(Debug, FromRow)]
struct TransportLinkRow {
    id: i64,
    trail_id: i64,
    name: String,
    transport_type: String,
    latitude: f64,
    longitude: f64,
}

impl TryFrom<TransportLinkRow> for TransportLink {
    type Error = StoreError;

    fn try_from(row: TransportLinkRow) -> Result<Self, Self::Error> {
        let transport_type = TransportType::parse(&row.transport_type).ok_or_else(|| {
            StoreError::Invalid(format!("unknown transport type {}", row.transport_type))
        })?;

        Ok(TransportLink {
            id: row.id,
            trail_id: row.trail_id,
            name: row.name,
            transport_type,
            latitude: row.latitude,
            longitude: row.longitude,
        })
    }
}

const TRAIL_COLUMNS: &str = "id, name, latitude, longitude, \
     ST_AsGeoJSON(path::geometry) as path, \
     length_km, elevation_gain_m, region, difficulty, estimated_duration, \
     popularity, updated_at";

/// Insert or refresh a trail by name. Popularity is left as stored.
pub async fn upsert_trail(pool: &PgPool, trail: &NewTrail) -> Result<i64, StoreError> {
    validate_trail(trail)?;
    let path = trail
        .path_geojson()
        .map(|geometry| serde_json::to_string(&geometry))
        .transpose()
        .map_err(|e| StoreError::Invalid(format!("bad path geojson: {}", e)))?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO trails (name, latitude, longitude, path, length_km, elevation_gain_m, \
         region, difficulty, estimated_duration) \
         VALUES ($1, $2, $3, ST_SetSRID(ST_GeomFromGeoJSON($4), 4326)::geography, \
         $5, $6, $7, $8, $9) \
         ON CONFLICT (name) DO UPDATE SET \
         latitude = EXCLUDED.latitude, \
         longitude = EXCLUDED.longitude, \
         path = EXCLUDED.path, \
         length_km = EXCLUDED.length_km, \
         elevation_gain_m = EXCLUDED.elevation_gain_m, \
         region = EXCLUDED.region, \
         difficulty = EXCLUDED.difficulty, \
         estimated_duration = EXCLUDED.estimated_duration, \
         updated_at = NOW() \
         RETURNING id",
    )
    .bind(&trail.name)
    .bind(trail.latitude)
    .bind(trail.longitude)
    .bind(path)
    .bind(trail.length_km)
    .bind(trail.elevation_gain_m)
    .bind(&trail.region)
    .bind(trail.difficulty.as_str())
    .bind(&trail.estimated_duration)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn load_trail_snapshot(pool: &PgPool) -> Result<Vec<TrailSummary>, StoreError> {
    let rows: Vec<(i64, String, f64, f64)> =
        sqlx::query_as("SELECT id, name, latitude, longitude FROM trails ORDER BY id")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, latitude, longitude)| TrailSummary {
            id,
            name,
            latitude,
            longitude,
        })
        .collect())
}

pub async fn upsert_car_park(pool: &PgPool, car_park: &NewCarPark) -> Result<i64, StoreError> {
    validate_coordinates(car_park.latitude, car_park.longitude)?;
    let capacity = car_park
        .capacity
        .map(i32::try_from)
        .transpose()
        .map_err(|_| StoreError::Invalid(format!("capacity too large for {}", car_park.name)))?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO car_parks (name, trail_id, latitude, longitude, capacity, is_free, \
         has_disabled_parking) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (name, trail_id) DO UPDATE SET \
         latitude = EXCLUDED.latitude, \
         longitude = EXCLUDED.longitude, \
         capacity = EXCLUDED.capacity, \
         is_free = EXCLUDED.is_free, \
         has_disabled_parking = EXCLUDED.has_disabled_parking \
         RETURNING id",
    )
    .bind(&car_park.name)
    .bind(car_park.trail_id)
    .bind(car_park.latitude)
    .bind(car_park.longitude)
    .bind(capacity)
    .bind(car_park.is_free)
    .bind(car_park.has_disabled_parking)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn upsert_transport_link(
    pool: &PgPool,
    link: &NewTransportLink,
) -> Result<i64, StoreError> {
    validate_coordinates(link.latitude, link.longitude)?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO transport_links (name, trail_id, transport_type, latitude, longitude) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (name, trail_id, transport_type) DO UPDATE SET \
         latitude = EXCLUDED.latitude, \
         longitude = EXCLUDED.longitude \
         RETURNING id",
    )
    .bind(&link.name)
    .bind(link.trail_id)
    .bind(link.transport_type.as_str())
    .bind(link.latitude)
    .bind(link.longitude)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn find_trail_by_name(pool: &PgPool, name: &str) -> Result<Option<Trail>, StoreError> {
    let row: Option<TrailRow> =
        sqlx::query_as(&format!("SELECT {} FROM trails WHERE name = $1", TRAIL_COLUMNS))
            .bind(name)
            .fetch_optional(pool)
            .await?;

    row.map(Trail::try_from).transpose()
}

pub async fn find_car_parks_for_trail(
    pool: &PgPool,
    trail_id: i64,
) -> Result<Vec<CarPark>, StoreError> {
    let rows: Vec<CarParkRow> = sqlx::query_as(
        "SELECT id, trail_id, name, latitude, longitude, capacity, is_free, has_disabled_parking \
         FROM car_parks WHERE trail_id = $1 ORDER BY id",
    )
    .bind(trail_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CarPark::from).collect())
}

pub async fn find_transport_links_for_trail(
    pool: &PgPool,
    trail_id: i64,
) -> Result<Vec<TransportLink>, StoreError> {
    let rows: Vec<TransportLinkRow> = sqlx::query_as(
        "SELECT id, trail_id, name, transport_type, latitude, longitude \
         FROM transport_links WHERE trail_id = $1 ORDER BY id",
    )
    .bind(trail_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TransportLink::try_from).collect()
}

pub async fn count_rows(pool: &PgPool, table: Table) -> Result<i64, StoreError> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table.name()))
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Deletes every row and restarts the id sequence; returns the rows removed.
///
/// Clearing trails cascades to car parks and transport links.
pub async fn clear_table(pool: &PgPool, table: Table) -> Result<i64, StoreError> {
    let mut tx = pool.begin().await?;

    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table.name()))
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(&format!(
        "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
        table.name()
    ))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(count)
}

/// [`TrailStore`] backed by PostgreSQL/PostGIS
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrailStore for PgStore {
    async fn upsert_trail(&self, trail: &NewTrail) -> Result<i64, StoreError> {
        upsert_trail(&self.pool, trail).await
    }

    async fn load_trail_snapshot(&self) -> Result<Vec<TrailSummary>, StoreError> {
        load_trail_snapshot(&self.pool).await
    }

    async fn upsert_car_park(&self, car_park: &NewCarPark) -> Result<i64, StoreError> {
        upsert_car_park(&self.pool, car_park).await
    }

    async fn upsert_transport_link(&self, link: &NewTransportLink) -> Result<i64, StoreError> {
        upsert_transport_link(&self.pool, link).await
    }
}
