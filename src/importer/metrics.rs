use geo::Coord;

use super::elevation::ElevationLookup;
use crate::domain::Difficulty;

/// Naismith's rule: 1 hour per 5 km plus 1 hour per 600 m of ascent
pub const WALKING_SPEED_KMH: f64 = 5.0;
pub const ASCENT_METRES_PER_HOUR: f64 = 600.0;
/// Hiking hours per day for multi-day estimates
pub const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TrailMetrics {
    pub difficulty: Difficulty,
    pub estimated_duration: String,
}

/// Rough elevation gain: range of elevations over every `stride`-th point.
///
/// Degrades to 0 when there is nothing to sample, no lookup is configured,
/// or the lookup fails.
pub async fn estimate_elevation_gain(
    points: &[Coord<f64>],
    stride: usize,
    lookup: Option<&dyn ElevationLookup>,
) -> f64 {
    let Some(lookup) = lookup else {
        return 0.0;
    };

    let sampled: Vec<Coord<f64>> = points.iter().step_by(stride.max(1)).copied().collect();
    if sampled.is_empty() {
        return 0.0;
    }

    match lookup.lookup(&sampled).await {
        Ok(elevations) => elevation_range(&elevations),
        Err(e) => {
            tracing::debug!("Elevation lookup failed, using 0: {:#}", e);
            0.0
        }
    }
}

/// max - min, rounded to 2 decimals; 0 for no samples
fn elevation_range(elevations: &[f64]) -> f64 {
    let finite = elevations.iter().copied().filter(|e| e.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), e| {
        (min.min(e), max.max(e))
    });
    if min > max {
        return 0.0;
    }
    round_to(max - min, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn estimate_hours(length_km: f64, elevation_gain_m: f64) -> f64 {
    length_km / WALKING_SPEED_KMH + elevation_gain_m / ASCENT_METRES_PER_HOUR
}

pub fn format_duration(hours: f64) -> String {
    if hours < 1.0 {
        format!("{} mins", (hours * 60.0).floor() as i64)
    } else if hours > 24.0 {
        format!("{} days", (hours / HOURS_PER_DAY).ceil() as i64)
    } else {
        format!("{:.1} hours", round_to(hours, 1))
    }
}

/// First matching rule wins
pub fn classify_difficulty(length_km: f64, elevation_gain_m: f64) -> Difficulty {
    // metres climbed per km
    let steepness = if length_km > 0.0 {
        elevation_gain_m / length_km
    } else {
        0.0
    };

    if length_km > 40.0 {
        Difficulty::MultiDayTrek
    } else if steepness > 50.0 {
        Difficulty::Hard
    } else if length_km > 15.0 {
        Difficulty::Challenging
    } else if length_km > 8.0 {
        Difficulty::Moderate
    } else {
        Difficulty::Easy
    }
}

pub fn calculate_metrics(length_km: f64, elevation_gain_m: f64) -> TrailMetrics {
    TrailMetrics {
        difficulty: classify_difficulty(length_km, elevation_gain_m),
        estimated_duration: format_duration(estimate_hours(length_km, elevation_gain_m)),
    }
}
