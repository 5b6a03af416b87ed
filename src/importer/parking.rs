//! Interpretation of car park and transport stop tags.

use super::overpass::{OverpassElement, Tags};
use super::report::SkipReason;
use crate::domain::{NewCarPark, NewTransportLink, TransportType};

pub const UNNAMED_CAR_PARK: &str = "Unnamed Car Park";

/// `access` values meaning the public cannot park
const RESTRICTED_ACCESS: &[&str] = &[
    "private",
    "customers",
    "no",
    "permit",
    "delivery",
    "residence",
    "employees",
];

/// Name fragments that mark a car park as restricted
const RESTRICTED_NAME_WORDS: &[&str] = &[
    "staff",
    "private",
    "residents",
    "permit holders",
    "reserved",
    "customer",
    "school",
    "university",
    "college",
    "surgery",
    "clinic",
    "hotel",
    "guests only",
    "employees",
    "supermarket",
    "retail park",
];

const NEGATIVE_VALUES: &[&str] = &["no", "0", "none"];

/// False if the car park looks private, restricted or customer-only
pub fn is_public_parking(tags: &Tags) -> bool {
    let access = tags.get_or("access", "yes").to_lowercase();
    if RESTRICTED_ACCESS.contains(&access.as_str()) {
        return false;
    }

    let name = tags.get_or("name", "").to_lowercase();
    !RESTRICTED_NAME_WORDS.iter().any(|word| name.contains(word))
}

/// Digits-only capacity, otherwise unknown
pub fn parse_capacity(tags: &Tags) -> Option<u32> {
    let value = tags.non_empty("capacity")?;
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// `fee=no` is free, any other fee value is paid, no fee tag is unknown
pub fn parse_is_free(tags: &Tags) -> Option<bool> {
    tags.non_empty("fee")
        .map(|fee| fee.eq_ignore_ascii_case("no"))
}

/// From `disabled_parking`, falling back to `capacity:disabled`
pub fn parse_disabled_parking(tags: &Tags) -> Option<bool> {
    let value = tags
        .non_empty("disabled_parking")
        .or_else(|| tags.non_empty("capacity:disabled"))?;
    Some(!NEGATIVE_VALUES.contains(&value.to_lowercase().as_str()))
}

/// Stations win over bus stops when a node carries both tags
pub fn classify_transport(tags: &Tags) -> Option<TransportType> {
    if tags.is("railway", "station") {
        Some(TransportType::Train)
    } else if tags.is("highway", "bus_stop") {
        Some(TransportType::Bus)
    } else {
        None
    }
}

/// Car park attributes before linking to a trail
#[derive(Debug, Clone, PartialEq)]
pub struct CarParkCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: Option<u32>,
    pub is_free: Option<bool>,
    pub has_disabled_parking: Option<bool>,
}

impl CarParkCandidate {
    pub fn from_element(element: &OverpassElement) -> Result<Self, SkipReason> {
        let tags = &element.tags;
        if !is_public_parking(tags) {
            return Err(SkipReason::NotPublic);
        }

        let (latitude, longitude) = element
            .coordinates()
            .ok_or(SkipReason::MissingCoordinates)?;

        Ok(Self {
            name: tags.get_or("name", UNNAMED_CAR_PARK).to_string(),
            latitude,
            longitude,
            capacity: parse_capacity(tags),
            is_free: parse_is_free(tags),
            has_disabled_parking: parse_disabled_parking(tags),
        })
    }

    pub fn link(self, trail_id: i64) -> NewCarPark {
        NewCarPark {
            name: self.name,
            trail_id,
            latitude: self.latitude,
            longitude: self.longitude,
            capacity: self.capacity,
            is_free: self.is_free,
            has_disabled_parking: self.has_disabled_parking,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportCandidate {
    pub name: String,
    pub transport_type: TransportType,
    pub latitude: f64,
    pub longitude: f64,
}

impl TransportCandidate {
    pub fn from_element(element: &OverpassElement) -> Result<Self, SkipReason> {
        let (latitude, longitude) = element
            .node_coordinates()
            .ok_or(SkipReason::MissingCoordinates)?;

        let transport_type =
            classify_transport(&element.tags).ok_or(SkipReason::UnknownTransportType)?;

        let name = element
            .tags
            .get("name")
            .map(str::to_string)
            .unwrap_or_else(|| transport_type.default_stop_name());

        Ok(Self {
            name,
            transport_type,
            latitude,
            longitude,
        })
    }

    pub fn link(self, trail_id: i64) -> NewTransportLink {
        NewTransportLink {
            name: self.name,
            trail_id,
            transport_type: self.transport_type,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::overpass::parse_element;
    use serde_json::json;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_access_denylist() {
        assert!(!is_public_parking(&tags(&[("access", "private")])));
        assert!(!is_public_parking(&tags(&[("access", "Customers")])));
        assert!(!is_public_parking(&tags(&[("access", "permit")])));
        assert!(is_public_parking(&tags(&[("access", "yes")])));
        assert!(is_public_parking(&tags(&[("access", "permissive")])));
    }

    #[test]
    fn test_name_denylist() {
        assert!(!is_public_parking(&tags(&[("name", "Tesco Retail Park")])));
        assert!(!is_public_parking(&tags(&[("name", "Hotel Guests Only")])));
        assert!(!is_public_parking(&tags(&[("name", "STAFF PARKING")])));
        assert!(is_public_parking(&tags(&[("name", "Main Street Car Park")])));
        assert!(is_public_parking(&tags(&[])));
    }

    #[test]
    fn test_capacity() {
        assert_eq!(parse_capacity(&tags(&[("capacity", "42")])), Some(42));
        assert_eq!(parse_capacity(&tags(&[("capacity", "about 40")])), None);
        assert_eq!(parse_capacity(&tags(&[("capacity", "-3")])), None);
        assert_eq!(parse_capacity(&tags(&[("capacity", "")])), None);
        assert_eq!(parse_capacity(&tags(&[])), None);
    }

    #[test]
    fn test_fee() {
        assert_eq!(parse_is_free(&tags(&[("fee", "no")])), Some(true));
        assert_eq!(parse_is_free(&tags(&[("fee", "No")])), Some(true));
        assert_eq!(parse_is_free(&tags(&[("fee", "yes")])), Some(false));
        assert_eq!(parse_is_free(&tags(&[("fee", "interval")])), Some(false));
        assert_eq!(parse_is_free(&tags(&[])), None);
    }

    #[test]
    fn test_disabled_parking() {
        assert_eq!(parse_disabled_parking(&tags(&[("disabled_parking", "yes")])), Some(true));
        assert_eq!(parse_disabled_parking(&tags(&[("disabled_parking", "None")])), Some(false));
        assert_eq!(parse_disabled_parking(&tags(&[("capacity:disabled", "0")])), Some(false));
        assert_eq!(parse_disabled_parking(&tags(&[("capacity:disabled", "4")])), Some(true));
        assert_eq!(
            parse_disabled_parking(&tags(&[("disabled_parking", ""), ("capacity:disabled", "2")])),
            Some(true)
        );
        assert_eq!(parse_disabled_parking(&tags(&[])), None);
    }

    #[test]
    fn test_classify_transport() {
        assert_eq!(
            classify_transport(&tags(&[("railway", "station")])),
            Some(TransportType::Train)
        );
        assert_eq!(
            classify_transport(&tags(&[("highway", "bus_stop")])),
            Some(TransportType::Bus)
        );
        assert_eq!(
            classify_transport(&tags(&[("railway", "station"), ("highway", "bus_stop")])),
            Some(TransportType::Train)
        );
        assert_eq!(classify_transport(&tags(&[("railway", "halt")])), None);
    }

    #[test]
    fn test_car_park_from_way_center() {
        let element = parse_element(&json!({
            "type": "way",
            "id": 11,
            "center": {"lat": 53.37, "lon": -1.69},
            "tags": {"amenity": "parking", "fee": "yes", "capacity": "120"}
        }))
        .unwrap();

        let candidate = CarParkCandidate::from_element(&element).unwrap();
        assert_eq!(candidate.name, UNNAMED_CAR_PARK);
        assert_eq!(candidate.capacity, Some(120));
        assert_eq!(candidate.is_free, Some(false));
        assert_eq!(candidate.has_disabled_parking, None);

        let linked = candidate.link(9);
        assert_eq!(linked.trail_id, 9);
        assert_eq!(linked.latitude, 53.37);
    }

    #[test]
    fn test_car_park_rejections() {
        let private = parse_element(&json!({
            "type": "node", "id": 1, "lat": 53.3, "lon": -1.6,
            "tags": {"amenity": "parking", "access": "private"}
        }))
        .unwrap();
        assert_eq!(
            CarParkCandidate::from_element(&private),
            Err(SkipReason::NotPublic)
        );

        let nowhere = parse_element(&json!({
            "type": "way", "id": 2, "tags": {"amenity": "parking"}
        }))
        .unwrap();
        assert_eq!(
            CarParkCandidate::from_element(&nowhere),
            Err(SkipReason::MissingCoordinates)
        );
    }

    #[test]
    fn test_transport_candidate() {
        let stop = parse_element(&json!({
            "type": "node", "id": 3, "lat": 53.35, "lon": -1.65,
            "tags": {"highway": "bus_stop"}
        }))
        .unwrap();
        let candidate = TransportCandidate::from_element(&stop).unwrap();
        assert_eq!(candidate.name, "Bus Stop");
        assert_eq!(candidate.transport_type, TransportType::Bus);

        let station = parse_element(&json!({
            "type": "node", "id": 4, "lat": 53.34, "lon": -1.63,
            "tags": {"railway": "station", "name": "Hathersage"}
        }))
        .unwrap();
        let candidate = TransportCandidate::from_element(&station).unwrap();
        assert_eq!(candidate.name, "Hathersage");
        assert_eq!(candidate.link(2).transport_type, TransportType::Train);

        let other = parse_element(&json!({
            "type": "node", "id": 5, "lat": 53.34, "lon": -1.63,
            "tags": {"amenity": "bench"}
        }))
        .unwrap();
        assert_eq!(
            TransportCandidate::from_element(&other),
            Err(SkipReason::UnknownTransportType)
        );
    }
}
