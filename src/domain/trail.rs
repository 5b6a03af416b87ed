use chrono::{DateTime, Utc};
use geo::MultiLineString;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Hard,
    #[serde(rename = "Multi-day Trek")]
    MultiDayTrek,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Challenging => "Challenging",
            Self::Hard => "Hard",
            Self::MultiDayTrek => "Multi-day Trek",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Easy" => Some(Self::Easy),
            "Moderate" => Some(Self::Moderate),
            "Challenging" => Some(Self::Challenging),
            "Hard" => Some(Self::Hard),
            "Multi-day Trek" => Some(Self::MultiDayTrek),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trail produced by the importer, upserted by `name`
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrail {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Empty when geometry reconstruction produced nothing storable
    pub path: MultiLineString<f64>,
    pub length_km: f64,
    pub elevation_gain_m: f64,
    pub region: String,
    pub difficulty: Difficulty,
    pub estimated_duration: String,
}

impl NewTrail {
    /// GeoJSON geometry of the path, or `None` for an empty path
    pub fn path_geojson(&self) -> Option<Geometry> {
        if self.path.0.is_empty() {
            return None;
        }
        Some(Geometry::new(Value::from(&self.path)))
    }
}

/// Minimal trail view held in memory by the proximity linker
#[derive(Debug, Clone, PartialEq)]
pub struct TrailSummary {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Trail as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// GeoJSON MultiLineString
    pub path: Option<serde_json::Value>,
    pub length_km: f64,
    pub elevation_gain_m: f64,
    pub region: String,
    pub difficulty: Difficulty,
    pub estimated_duration: String,
    pub popularity: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Trail {
    /// Map feature of the stored path, or of the centroid when no path is stored
    pub fn to_feature(&self) -> Feature {
        let geometry = self
            .path
            .clone()
            .and_then(|path| serde_json::from_value::<Geometry>(path).ok())
            .unwrap_or_else(|| Geometry::new(Value::Point(vec![self.longitude, self.latitude])));

        let mut properties = serde_json::Map::new();
        properties.insert("name".to_string(), serde_json::json!(self.name));
        properties.insert("region".to_string(), serde_json::json!(self.region));
        properties.insert("length_km".to_string(), serde_json::json!(self.length_km));
        properties.insert(
            "elevation_gain_m".to_string(),
            serde_json::json!(self.elevation_gain_m),
        );
        properties.insert("difficulty".to_string(), serde_json::json!(self.difficulty));
        properties.insert(
            "estimated_duration".to_string(),
            serde_json::json!(self.estimated_duration),
        );
        properties.insert("popularity".to_string(), serde_json::json!(self.popularity));
        properties.insert(
            "centroid".to_string(),
            serde_json::json!([self.longitude, self.latitude]),
        );

        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: Some(Id::Number(self.id.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    pub fn to_feature_collection(trails: &[Trail]) -> FeatureCollection {
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("total_count".to_string(), serde_json::json!(trails.len()));

        FeatureCollection {
            bbox: None,
            features: trails.iter().map(Trail::to_feature).collect(),
            foreign_members: Some(foreign_members),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, LineString};

    fn sample_trail() -> Trail {
        Trail {
            id: 1,
            name: "Kinder Scout Circular".to_string(),
            latitude: 53.385,
            longitude: -1.872,
            path: Some(serde_json::json!({
                "type": "MultiLineString",
                "coordinates": [[[-1.87, 53.38], [-1.88, 53.39]]]
            })),
            length_km: 12.4,
            elevation_gain_m: 410.0,
            region: "Peak District".to_string(),
            difficulty: Difficulty::Moderate,
            estimated_duration: "3.2 hours".to_string(),
            popularity: 0.0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(Difficulty::MultiDayTrek.to_string(), "Multi-day Trek");
        assert_eq!(Difficulty::parse("Challenging"), Some(Difficulty::Challenging));
        assert_eq!(Difficulty::parse("Extreme"), None);
        assert_eq!(
            serde_json::to_value(Difficulty::MultiDayTrek).unwrap(),
            "Multi-day Trek"
        );
    }

    #[test]
    fn test_path_geojson() {
        let trail = NewTrail {
            name: "Edge Walk".to_string(),
            latitude: 53.3,
            longitude: -1.6,
            path: MultiLineString::new(vec![LineString::new(vec![
                coord! { x: -1.6, y: 53.3 },
                coord! { x: -1.61, y: 53.31 },
            ])]),
            length_km: 1.6,
            elevation_gain_m: 0.0,
            region: "Peak District".to_string(),
            difficulty: Difficulty::Easy,
            estimated_duration: "19 mins".to_string(),
        };

        let geojson = serde_json::to_value(trail.path_geojson().unwrap()).unwrap();
        assert_eq!(geojson["type"], "MultiLineString");
        assert_eq!(geojson["coordinates"][0][1][0], -1.61);
        assert_eq!(geojson["coordinates"][0][1][1], 53.31);

        let empty = NewTrail {
            path: MultiLineString::new(vec![]),
            ..trail
        };
        assert!(empty.path_geojson().is_none());
    }

    #[test]
    fn test_to_feature() {
        let feature = serde_json::to_value(sample_trail().to_feature()).unwrap();

        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["id"], 1);
        assert_eq!(feature["geometry"]["type"], "MultiLineString");
        assert_eq!(feature["properties"]["name"], "Kinder Scout Circular");
        assert_eq!(feature["properties"]["difficulty"], "Moderate");
        assert_eq!(feature["properties"]["centroid"][0], -1.872);
    }

    #[test]
    fn test_to_feature_without_path_falls_back_to_point() {
        let trail = Trail {
            path: None,
            ..sample_trail()
        };
        let feature = serde_json::to_value(trail.to_feature()).unwrap();
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"][1], 53.385);
    }

    #[test]
    fn test_to_feature_collection() {
        let collection =
            serde_json::to_value(Trail::to_feature_collection(&[sample_trail(), sample_trail()]))
                .unwrap();
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["total_count"], 2);
        assert_eq!(collection["features"].as_array().unwrap().len(), 2);
    }
}
