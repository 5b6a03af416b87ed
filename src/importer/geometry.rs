//! Rebuilds trail geometry from fragmented OSM ways.

use std::collections::HashMap;

use geo::{Centroid, Coord, LineString, MultiLineString};
use thiserror::Error;

use super::distance::path_length_km;
use super::overpass::OverpassElement;

/// Latitude separating the two regions the service covers
pub const REGION_SPLIT_LATITUDE: f64 = 53.65;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("line {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Geometry of one trail after merging
#[derive(Debug, Clone)]
pub struct TrailGeometry {
    pub lines: MultiLineString<f64>,
    /// Member points in download order, before merging
    pub raw_points: Vec<Coord<f64>>,
    /// (x = lon, y = lat)
    pub centroid: Coord<f64>,
    pub region: &'static str,
    /// False when merging failed and the raw member lines were kept
    pub merged: bool,
}

impl TrailGeometry {
    pub fn length_km(&self) -> f64 {
        self.lines.0.iter().map(|line| path_length_km(&line.0)).sum()
    }
}

pub fn region_name(latitude: f64) -> &'static str {
    if latitude < REGION_SPLIT_LATITUDE {
        "Peak District"
    } else {
        "Leeds & Yorkshire"
    }
}

/// Member ways of a relation, or the way itself; lines under 2 points are dropped
pub fn collect_polylines(element: &OverpassElement) -> Vec<LineString<f64>> {
    let to_line = |points: &[super::overpass::OverpassPoint]| {
        LineString::new(points.iter().map(|p| p.to_coord()).collect())
    };

    let lines: Vec<LineString<f64>> = match element.element_type.as_str() {
        "relation" => element
            .members
            .iter()
            .flatten()
            .filter(|m| m.member_type == "way")
            .filter_map(|m| m.geometry.as_deref())
            .map(to_line)
            .collect(),
        "way" => element.geometry.as_deref().map(to_line).into_iter().collect(),
        _ => Vec::new(),
    };

    lines.into_iter().filter(|line| line.0.len() >= 2).collect()
}

/// Collects and merges an element's lines; `None` when it has no usable line
pub fn reconstruct(element: &OverpassElement) -> Option<TrailGeometry> {
    let raw_lines = collect_polylines(element);
    if raw_lines.is_empty() {
        return None;
    }

    let (lines, merged) = match merge_lines(&raw_lines) {
        Ok(lines) => (lines, true),
        Err(e) => {
            // Overlapping raw members are double counted in the length
            let usable: Vec<LineString<f64>> = raw_lines
                .iter()
                .filter(|line| is_finite_line(line))
                .cloned()
                .collect();
            tracing::warn!(
                "Line merge failed for element {}: {}; keeping {} of {} raw lines",
                element.id,
                e,
                usable.len(),
                raw_lines.len()
            );
            if usable.is_empty() {
                return None;
            }
            (MultiLineString::new(usable), false)
        }
    };

    let raw_points: Vec<Coord<f64>> = raw_lines
        .iter()
        .filter(|line| is_finite_line(line))
        .flat_map(|line| line.0.iter().copied())
        .collect();

    let centroid = lines
        .centroid()
        .map(|p| p.0)
        .unwrap_or_else(|| mean_coord(&raw_points));

    Some(TrailGeometry {
        region: region_name(centroid.y),
        lines,
        raw_points,
        centroid,
        merged,
    })
}

fn is_finite_line(line: &LineString<f64>) -> bool {
    line.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

fn mean_coord(points: &[Coord<f64>]) -> Coord<f64> {
    let n = points.len().max(1) as f64;
    let (x, y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    Coord { x: x / n, y: y / n }
}

/// Fixed-point key so endpoints match despite float noise (7 dp, sub-metre)
fn coord_key(coord: &Coord<f64>) -> (i64, i64) {
    let x = (coord.x * 10_000_000.0).round() as i64;
    let y = (coord.y * 10_000_000.0).round() as i64;
    (x, y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    Finish,
}

/// Coalesces lines that meet end to end into continuous chains.
///
/// Chains only pass through endpoints shared by exactly two line ends, so
/// junctions of three or more ways stay split. Duplicate members (same
/// points, either direction) are dissolved first.
pub fn merge_lines(lines: &[LineString<f64>]) -> Result<MultiLineString<f64>, GeometryError> {
    for (idx, line) in lines.iter().enumerate() {
        if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GeometryError::NonFinite(idx));
        }
    }

    let mut unique: Vec<&LineString<f64>> = Vec::new();
    for line in lines.iter().filter(|l| l.0.len() >= 2) {
        let keys: Vec<(i64, i64)> = line.0.iter().map(coord_key).collect();
        let duplicate = unique.iter().any(|seen| {
            let seen_keys: Vec<(i64, i64)> = seen.0.iter().map(coord_key).collect();
            seen_keys == keys || seen_keys.iter().rev().eq(keys.iter())
        });
        if !duplicate {
            unique.push(line);
        }
    }

    let mut endpoints: HashMap<(i64, i64), Vec<(usize, End)>> = HashMap::new();
    for (idx, line) in unique.iter().enumerate() {
        if let (Some(first), Some(last)) = (line.0.first(), line.0.last()) {
            endpoints.entry(coord_key(first)).or_default().push((idx, End::Start));
            endpoints.entry(coord_key(last)).or_default().push((idx, End::Finish));
        }
    }

    let mut used = vec![false; unique.len()];
    let mut chains = Vec::new();

    for seed in 0..unique.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut chain: Vec<Coord<f64>> = unique[seed].0.clone();

        // Extend forward from the tail, then backward from the head
        while let Some((next, end)) = next_line(&chain, &endpoints, &used, true) {
            used[next] = true;
            let coords = &unique[next].0;
            match end {
                End::Start => chain.extend(coords.iter().skip(1).copied()),
                End::Finish => chain.extend(coords.iter().rev().skip(1).copied()),
            }
        }
        while let Some((next, end)) = next_line(&chain, &endpoints, &used, false) {
            used[next] = true;
            let coords = &unique[next].0;
            let mut head: Vec<Coord<f64>> = match end {
                End::Finish => coords[..coords.len() - 1].to_vec(),
                End::Start => coords.iter().rev().take(coords.len() - 1).copied().collect(),
            };
            head.extend(chain);
            chain = head;
        }

        chains.push(LineString::new(chain));
    }

    tracing::debug!("Merged {} lines into {} chains", lines.len(), chains.len());

    Ok(MultiLineString::new(chains))
}

/// Unused line continuing the chain at its tail (`at_tail`) or head
fn next_line(
    chain: &[Coord<f64>],
    endpoints: &HashMap<(i64, i64), Vec<(usize, End)>>,
    used: &[bool],
    at_tail: bool,
) -> Option<(usize, End)> {
    let (first, last) = (chain.first()?, chain.last()?);
    let key = coord_key(if at_tail { last } else { first });

    // Closed loop
    if coord_key(first) == coord_key(last) {
        return None;
    }

    let ends = endpoints.get(&key)?;
    if ends.len() != 2 {
        return None;
    }
    ends.iter().copied().find(|&(idx, _)| !used[idx])
}
