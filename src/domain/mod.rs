pub mod service;
pub mod trail;

pub use service::{CarPark, NewCarPark, NewTransportLink, TransportLink, TransportType};
pub use trail::{Difficulty, NewTrail, Trail, TrailSummary};
