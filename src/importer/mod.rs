pub mod distance;
pub mod elevation;
pub mod fetcher;
pub mod geometry;
pub mod metrics;
pub mod overpass;
pub mod parking;
pub mod proximity;
pub mod report;
pub mod services;
pub mod trails;

pub use fetcher::{HttpTransport, OverpassFetcher, OverpassTransport};
pub use report::{ImportReport, SkipReason};
pub use services::{import_services, ServiceImportReport};
pub use trails::import_trails;
