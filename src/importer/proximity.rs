use super::distance::great_circle_distance_km;
use crate::domain::TrailSummary;

/// Candidates further than this in latitude are skipped (~5.5 km)
pub const LAT_PREFILTER_DEGREES: f64 = 0.05;
/// Candidates further than this in longitude are skipped (~6 km around 53°N)
pub const LON_PREFILTER_DEGREES: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestTrail<'a> {
    pub trail: Option<&'a TrailSummary>,
    /// Infinity when no trail survived the prefilter
    pub distance_km: f64,
}

impl<'a> NearestTrail<'a> {
    /// The trail, if it lies within `radius_km`
    pub fn within(&self, radius_km: f64) -> Option<&'a TrailSummary> {
        self.trail.filter(|_| self.distance_km <= radius_km)
    }
}

/// Closest trail centroid to (lat, lon).
///
/// A cheap degree-box check runs before the haversine distance. Ties keep
/// the first trail in iteration order.
pub fn find_nearest_trail(lat: f64, lon: f64, trails: &[TrailSummary]) -> NearestTrail<'_> {
    let mut nearest = NearestTrail {
        trail: None,
        distance_km: f64::INFINITY,
    };

    for trail in trails {
        if (trail.latitude - lat).abs() > LAT_PREFILTER_DEGREES {
            continue;
        }
        if (trail.longitude - lon).abs() > LON_PREFILTER_DEGREES {
            continue;
        }

        let distance = great_circle_distance_km(lat, lon, trail.latitude, trail.longitude);
        if distance < nearest.distance_km {
            nearest = NearestTrail {
                trail: Some(trail),
                distance_km: distance,
            };
        }
    }

    nearest
}
