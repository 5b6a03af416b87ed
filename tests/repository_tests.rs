use geo::{coord, LineString, MultiLineString};
use serial_test::serial;
use sqlx::{postgres::PgPoolOptions, PgPool};

use trail_import::db::repository::{self, Table};
use trail_import::db::run_migrations;
use trail_import::domain::{Difficulty, NewCarPark, NewTrail, NewTransportLink, TransportType};

// Returns None (and the test passes vacuously) when no database is configured
async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping repository test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    run_migrations(&pool).await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE TABLE trails RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate tables");

    Some(pool)
}

fn test_trail(name: &str, length_km: f64) -> NewTrail {
    let path = MultiLineString::new(vec![LineString::new(vec![
        coord! { x: -1.81, y: 53.36 },
        coord! { x: -1.81, y: 53.37 },
        coord! { x: -1.81, y: 53.38 },
    ])]);

    NewTrail {
        name: name.to_string(),
        latitude: 53.37,
        longitude: -1.81,
        path,
        length_km,
        elevation_gain_m: 120.0,
        region: "Peak District".to_string(),
        difficulty: Difficulty::Easy,
        estimated_duration: "40 mins".to_string(),
    }
}

fn test_car_park(name: &str, trail_id: i64, capacity: Option<u32>) -> NewCarPark {
    NewCarPark {
        name: name.to_string(),
        trail_id,
        latitude: 53.371,
        longitude: -1.811,
        capacity,
        is_free: Some(false),
        has_disabled_parking: None,
    }
}

#[tokio::test]
#[serial]
async fn test_upsert_trail_is_idempotent() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let first = repository::upsert_trail(&pool, &test_trail("Edale Skyline Walk", 2.22))
        .await
        .unwrap();
    let second = repository::upsert_trail(&pool, &test_trail("Edale Skyline Walk", 3.5))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(repository::count_rows(&pool, Table::Trails).await.unwrap(), 1);

    let stored = repository::find_trail_by_name(&pool, "Edale Skyline Walk")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.length_km, 3.5);
    assert_eq!(stored.difficulty, Difficulty::Easy);
    assert_eq!(stored.region, "Peak District");

    let path = stored.path.unwrap();
    assert_eq!(path["type"], "MultiLineString");
    assert_eq!(path["coordinates"][0].as_array().unwrap().len(), 3);
}

#[tokio::test]
#[serial]
async fn test_reimport_keeps_popularity() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let id = repository::upsert_trail(&pool, &test_trail("Mam Tor Loop", 5.0))
        .await
        .unwrap();
    sqlx::query("UPDATE trails SET popularity = 4.5 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    repository::upsert_trail(&pool, &test_trail("Mam Tor Loop", 5.2))
        .await
        .unwrap();

    let stored = repository::find_trail_by_name(&pool, "Mam Tor Loop")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.popularity, 4.5);
    assert_eq!(stored.length_km, 5.2);
}

#[tokio::test]
#[serial]
async fn test_snapshot_ordered_by_id() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    for name in ["Stanage Edge Walk", "Ladybower Reservoir Circuit", "Bamford Edge Walk"] {
        repository::upsert_trail(&pool, &test_trail(name, 4.0))
            .await
            .unwrap();
    }

    let snapshot = repository::load_trail_snapshot(&pool).await.unwrap();
    let ids: Vec<i64> = snapshot.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(snapshot[0].name, "Stanage Edge Walk");
}

#[tokio::test]
#[serial]
async fn test_upsert_services_by_key() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let trail_id = repository::upsert_trail(&pool, &test_trail("Edale Skyline Walk", 2.22))
        .await
        .unwrap();

    let first = repository::upsert_car_park(&pool, &test_car_park("Edale Car Park", trail_id, Some(80)))
        .await
        .unwrap();
    let second =
        repository::upsert_car_park(&pool, &test_car_park("Edale Car Park", trail_id, Some(120)))
            .await
            .unwrap();
    assert_eq!(first, second);

    let car_parks = repository::find_car_parks_for_trail(&pool, trail_id)
        .await
        .unwrap();
    assert_eq!(car_parks.len(), 1);
    assert_eq!(car_parks[0].capacity, Some(120));
    assert_eq!(car_parks[0].is_free, Some(false));

    // Same name, different type is a separate link
    for transport_type in [TransportType::Bus, TransportType::Train, TransportType::Bus] {
        let link = NewTransportLink {
            name: "Edale".to_string(),
            trail_id,
            transport_type,
            latitude: 53.365,
            longitude: -1.815,
        };
        repository::upsert_transport_link(&pool, &link).await.unwrap();
    }

    let links = repository::find_transport_links_for_trail(&pool, trail_id)
        .await
        .unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].transport_type, TransportType::Bus);
    assert_eq!(links[1].transport_type, TransportType::Train);
}

#[tokio::test]
#[serial]
async fn test_clear_trails_cascades() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let trail_id = repository::upsert_trail(&pool, &test_trail("Edale Skyline Walk", 2.22))
        .await
        .unwrap();
    repository::upsert_car_park(&pool, &test_car_park("Edale Car Park", trail_id, None))
        .await
        .unwrap();

    let removed = repository::clear_table(&pool, Table::Trails).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(repository::count_rows(&pool, Table::CarParks).await.unwrap(), 0);

    // Identity restarts
    let id = repository::upsert_trail(&pool, &test_trail("Mam Tor Loop", 5.0))
        .await
        .unwrap();
    assert_eq!(id, 1);
}

#[tokio::test]
#[serial]
async fn test_upsert_rejects_invalid_coordinates() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let mut trail = test_trail("Nowhere Walk", 2.0);
    trail.latitude = 95.0;

    assert!(repository::upsert_trail(&pool, &trail).await.is_err());
    assert_eq!(repository::count_rows(&pool, Table::Trails).await.unwrap(), 0);
}
