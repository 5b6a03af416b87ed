use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransportType {
    Bus,
    Train,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bus => "Bus",
            Self::Train => "Train",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Bus" => Some(Self::Bus),
            "Train" => Some(Self::Train),
            _ => None,
        }
    }

    /// Name used when the stop carries no `name` tag
    pub fn default_stop_name(&self) -> String {
        format!("{} Stop", self.as_str())
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Car park linked to its nearest trail, upserted by `(name, trail_id)`
#[derive(Debug, Clone, PartialEq)]
pub struct NewCarPark {
    pub name: String,
    pub trail_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: Option<u32>,
    /// `None` when the fee tag is absent
    pub is_free: Option<bool>,
    pub has_disabled_parking: Option<bool>,
}

/// Transport stop linked to its nearest trail, upserted by `(name, trail_id, transport_type)`
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransportLink {
    pub name: String,
    pub trail_id: i64,
    pub transport_type: TransportType,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarPark {
    pub id: i64,
    pub trail_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: Option<u32>,
    pub is_free: Option<bool>,
    pub has_disabled_parking: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportLink {
    pub id: i64,
    pub trail_id: i64,
    pub name: String,
    pub transport_type: TransportType,
    pub latitude: f64,
    pub longitude: f64,
}
