use anyhow::{Context, Result};
use async_trait::async_trait;
use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::config::ElevationConfig;

/// Source of ground elevations for a list of points
#[async_trait]
pub trait ElevationLookup: Send + Sync {
    /// Elevations in metres, one per input point (x = lon, y = lat)
    async fn lookup(&self, points: &[Coord<f64>]) -> Result<Vec<f64>>;
}

#[derive(Serialize)]
struct LookupRequest {
    locations: Vec<LookupLocation>,
}

#[derive(Serialize)]
struct LookupLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Deserialize)]
struct LookupResult {
    elevation: f64,
}

/// Client for an Open-Elevation compatible `/api/v1/lookup` endpoint
pub struct OpenElevationClient {
    client: reqwest::Client,
    url: String,
}

impl OpenElevationClient {
    pub fn new(config: &ElevationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build elevation HTTP client")?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl ElevationLookup for OpenElevationClient {
    async fn lookup(&self, points: &[Coord<f64>]) -> Result<Vec<f64>> {
        let request = LookupRequest {
            locations: points
                .iter()
                .map(|c| LookupLocation {
                    latitude: c.y,
                    longitude: c.x,
                })
                .collect(),
        };

        let response: LookupResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Elevation request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse elevation response")?;

        Ok(response.results.into_iter().map(|r| r.elevation).collect())
    }
}
