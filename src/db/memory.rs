use std::sync::Mutex;

use async_trait::async_trait;

use super::store::{validate_coordinates, validate_trail, StoreError, TrailStore};
use crate::domain::{CarPark, NewCarPark, NewTrail, NewTransportLink, TransportLink, TrailSummary};

#[derive(Debug, Default)]
struct Tables {
    trails: Vec<(i64, NewTrail)>,
    car_parks: Vec<CarPark>,
    transport_links: Vec<TransportLink>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with the same key semantics as the database, used for
/// dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trails(&self) -> Vec<(i64, NewTrail)> {
        self.lock().trails.clone()
    }

    pub fn trail_by_name(&self, name: &str) -> Option<NewTrail> {
        self.lock()
            .trails
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(_, t)| t.clone())
    }

    pub fn car_parks(&self) -> Vec<CarPark> {
        self.lock().car_parks.clone()
    }

    pub fn transport_links(&self) -> Vec<TransportLink> {
        self.lock().transport_links.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TrailStore for MemoryStore {
    async fn upsert_trail(&self, trail: &NewTrail) -> Result<i64, StoreError> {
        validate_trail(trail)?;
        let mut tables = self.lock();

        if let Some((id, existing)) = tables.trails.iter_mut().find(|(_, t)| t.name == trail.name) {
            *existing = trail.clone();
            return Ok(*id);
        }

        let id = tables.allocate_id();
        tables.trails.push((id, trail.clone()));
        Ok(id)
    }

    async fn load_trail_snapshot(&self) -> Result<Vec<TrailSummary>, StoreError> {
        let mut trails: Vec<TrailSummary> = self
            .lock()
            .trails
            .iter()
            .map(|(id, t)| TrailSummary {
                id: *id,
                name: t.name.clone(),
                latitude: t.latitude,
                longitude: t.longitude,
            })
            .collect();
        trails.sort_by_key(|t| t.id);
        Ok(trails)
    }

    async fn upsert_car_park(&self, car_park: &NewCarPark) -> Result<i64, StoreError> {
        validate_coordinates(car_park.latitude, car_park.longitude)?;
        let mut tables = self.lock();

        if !tables.trails.iter().any(|(id, _)| *id == car_park.trail_id) {
            return Err(StoreError::Invalid(format!("unknown trail {}", car_park.trail_id)));
        }

        let record = |id| CarPark {
            id,
            trail_id: car_park.trail_id,
            name: car_park.name.clone(),
            latitude: car_park.latitude,
            longitude: car_park.longitude,
            capacity: car_park.capacity,
            is_free: car_park.is_free,
            has_disabled_parking: car_park.has_disabled_parking,
        };

        if let Some(existing) = tables
            .car_parks
            .iter_mut()
            .find(|c| c.name == car_park.name && c.trail_id == car_park.trail_id)
        {
            *existing = record(existing.id);
            return Ok(existing.id);
        }

        let id = tables.allocate_id();
        tables.car_parks.push(record(id));
        Ok(id)
    }

    async fn upsert_transport_link(&self, link: &NewTransportLink) -> Result<i64, StoreError> {
        validate_coordinates(link.latitude, link.longitude)?;
        let mut tables = self.lock();

        if !tables.trails.iter().any(|(id, _)| *id == link.trail_id) {
            return Err(StoreError::Invalid(format!("unknown trail {}", link.trail_id)));
        }

        let record = |id| TransportLink {
            id,
            trail_id: link.trail_id,
            name: link.name.clone(),
            transport_type: link.transport_type,
            latitude: link.latitude,
            longitude: link.longitude,
        };

        if let Some(existing) = tables.transport_links.iter_mut().find(|t| {
            t.name == link.name
                && t.trail_id == link.trail_id
                && t.transport_type == link.transport_type
        }) {
            *existing = record(existing.id);
            return Ok(existing.id);
        }

        let id = tables.allocate_id();
        tables.transport_links.push(record(id));
        Ok(id)
    }
}
