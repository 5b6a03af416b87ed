//! Overpass element model and query templates.

use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;

use crate::config::Bbox;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct OverpassPoint {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassPoint {
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(default)]
    pub geometry: Option<Vec<OverpassPoint>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub tags: Tags,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<OverpassPoint>,
    pub geometry: Option<Vec<OverpassPoint>>,
    pub members: Option<Vec<OverpassMember>>,
}

impl OverpassElement {
    /// Node coordinates, falling back to the `center` emitted for ways by `out center`
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.center.map(|c| (c.lat, c.lon)),
        }
    }

    /// Node coordinates only
    pub fn node_coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

/// OSM tags with explicit default-on-missing accessors
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Tags(HashMap<String, String>);

impl Tags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key`, treating an empty string as absent
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Parsed Overpass body; elements stay raw so one malformed element cannot
/// reject the whole download.
#[derive(Debug, Clone, Default)]
pub struct OverpassResponse {
    pub elements: Vec<serde_json::Value>,
}

impl OverpassResponse {
    pub fn from_value(value: serde_json::Value) -> Self {
        let elements = match value {
            serde_json::Value::Object(mut map) => match map.remove("elements") {
                Some(serde_json::Value::Array(elements)) => elements,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

pub fn parse_element(value: &serde_json::Value) -> Result<OverpassElement, serde_json::Error> {
    OverpassElement::deserialize(value)
}

/// Hiking route relations plus named paths/tracks, with full geometry
pub fn trails_query(bbox: &Bbox, name_keywords: &str) -> String {
    let bbox = bbox.to_overpass();
    format!(
        "[out:json][timeout:300];\
         (\
         relation[\"route\"~\"hiking|foot\"][\"name\"]{bbox};\
         way[\"highway\"~\"path|track\"][\"name\"~\"{name_keywords}\"]{bbox};\
         );\
         out geom;"
    )
}

pub fn car_parks_query(bbox: &Bbox) -> String {
    let bbox = bbox.to_overpass();
    format!(
        "[out:json][timeout:180];\
         (\
         node[\"amenity\"=\"parking\"][\"access\"!=\"private\"]{bbox};\
         way[\"amenity\"=\"parking\"][\"access\"!=\"private\"]{bbox};\
         );\
         out center;"
    )
}

pub fn transport_query(bbox: &Bbox) -> String {
    let bbox = bbox.to_overpass();
    format!(
        "[out:json][timeout:180];\
         (\
         node[\"railway\"=\"station\"]{bbox};\
         node[\"highway\"=\"bus_stop\"]{bbox};\
         );\
         out body;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_accessors() {
        let tags: Tags = [("name", "Stanage Edge"), ("fee", ""), ("access", "yes")]
            .into_iter()
            .collect();

        assert_eq!(tags.get("name"), Some("Stanage Edge"));
        assert_eq!(tags.get("fee"), Some(""));
        assert_eq!(tags.non_empty("fee"), None);
        assert_eq!(tags.get_or("highway", "none"), "none");
        assert!(tags.is("access", "yes"));
        assert!(!tags.is("access", "no"));
    }

    #[test]
    fn test_parse_way_element() {
        let value = json!({
            "type": "way",
            "id": 42,
            "tags": {"name": "Ladybower Reservoir Walk", "highway": "track"},
            "geometry": [{"lat": 53.38, "lon": -1.70}, {"lat": 53.39, "lon": -1.71}]
        });

        let element = parse_element(&value).unwrap();
        assert_eq!(element.element_type, "way");
        assert_eq!(element.id, 42);
        assert_eq!(element.tags.get("highway"), Some("track"));
        assert_eq!(element.geometry.unwrap()[1].to_coord().x, -1.71);
    }

    #[test]
    fn test_parse_element_without_tags() {
        let value = json!({"type": "node", "id": 7, "lat": 53.5, "lon": -1.5});
        let element = parse_element(&value).unwrap();
        assert_eq!(element.tags, Tags::default());
        assert_eq!(element.node_coordinates(), Some((53.5, -1.5)));
    }

    #[test]
    fn test_coordinates_fall_back_to_center() {
        let value = json!({
            "type": "way",
            "id": 9,
            "center": {"lat": 53.41, "lon": -1.62}
        });
        let element = parse_element(&value).unwrap();
        assert_eq!(element.coordinates(), Some((53.41, -1.62)));
        assert_eq!(element.node_coordinates(), None);
    }

    #[test]
    fn test_malformed_element_is_an_error() {
        let value = json!({"type": "node", "lat": "north"});
        assert!(parse_element(&value).is_err());
    }

    #[test]
    fn test_response_without_elements() {
        assert!(OverpassResponse::from_value(json!({"remark": "timeout"})).is_empty());
        assert_eq!(
            OverpassResponse::from_value(json!({"elements": [{}, {}]})).len(),
            2
        );
    }

    #[test]
    fn test_trails_query_embeds_bbox_and_keywords() {
        let query = trails_query(&Bbox::default(), "Walk|Edge");
        assert!(query.contains(&Bbox::default().to_overpass()));
        assert!(query.contains("[\"name\"~\"Walk|Edge\"]"));
        assert!(query.ends_with("out geom;"));
    }

    #[test]
    fn test_service_queries() {
        assert!(car_parks_query(&Bbox::default()).contains("\"amenity\"=\"parking\""));
        assert!(transport_query(&Bbox::default()).contains("\"highway\"=\"bus_stop\""));
    }
}
