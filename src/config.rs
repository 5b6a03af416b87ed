use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass.kumi.systems/api/interpreter";
pub const DEFAULT_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";
pub const DEFAULT_USER_AGENT: &str = "LeedsHikingApp/1.0";
pub const DEFAULT_REFERER: &str = "http://localhost:8000/";

/// Peak District / Leeds area, as `min_lon,min_lat,max_lon,max_lat`.
pub const DEFAULT_BBOX: &str = "-2.10,53.15,-1.30,54.00";

pub const DEFAULT_TRAIL_KEYWORDS: &str =
    "Walk|Trail|Way|Loop|Circuit|Circular|Reservoir|Edge|Pike|Tor";

/// Geographic bounding box in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bbox {
    /// Overpass QL bbox filter: `(south,west,north,east)`
    pub fn to_overpass(&self) -> String {
        format!(
            "({}, {}, {}, {})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

impl Default for Bbox {
    fn default() -> Self {
        Self {
            min_lon: -2.10,
            min_lat: 53.15,
            max_lon: -1.30,
            max_lat: 54.00,
        }
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl FromStr for Bbox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err("Invalid bbox format. Expected: min_lon,min_lat,max_lon,max_lat".into());
        }

        let coords: Result<Vec<f64>, _> = parts.iter().map(|p| p.trim().parse::<f64>()).collect();
        let coords = coords.map_err(|_| "Invalid bbox coordinates".to_string())?;
        let (min_lon, min_lat, max_lon, max_lat) = (coords[0], coords[1], coords[2], coords[3]);

        if min_lon >= max_lon || min_lat >= max_lat {
            return Err("Invalid bbox range".into());
        }
        if min_lon < -180.0 || max_lon > 180.0 || min_lat < -90.0 || max_lat > 90.0 {
            return Err("bbox out of valid range".into());
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

/// Retry budget for Overpass downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait after an HTTP 429
    pub rate_limit_delay: Duration,
    /// Wait after any other failure
    pub failure_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay: Duration::from_secs(15),
            failure_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub overpass_url: String,
    pub user_agent: String,
    pub referer: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout: Duration,
    /// Every n-th point of a trail is sent to the lookup
    pub sample_stride: usize,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_ELEVATION_URL.to_string(),
            timeout: Duration::from_secs(2),
            sample_stride: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailImportConfig {
    pub bbox: Bbox,
    /// Regex alternation matched against way names
    pub name_keywords: String,
    pub min_length_km: f64,
    pub skip_extreme_trails: bool,
    pub max_length_km: f64,
}

impl Default for TrailImportConfig {
    fn default() -> Self {
        Self {
            bbox: Bbox::default(),
            name_keywords: DEFAULT_TRAIL_KEYWORDS.to_string(),
            min_length_km: 1.5,
            skip_extreme_trails: true,
            max_length_km: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceImportConfig {
    pub bbox: Bbox,
    /// Max distance to link a car park or stop to a trail
    pub search_radius_km: f64,
}

impl Default for ServiceImportConfig {
    fn default() -> Self {
        Self {
            bbox: Bbox::default(),
            search_radius_km: 1.0,
        }
    }
}

/// Command line / environment options for the Overpass client
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Overpass interpreter endpoint
    #[arg(long, env = "OVERPASS_URL", default_value = DEFAULT_OVERPASS_URL)]
    pub overpass_url: String,

    /// User-Agent sent to Overpass
    #[arg(long, env = "OVERPASS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Total download attempts before a phase is skipped
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
}

impl FetchArgs {
    pub fn to_config(&self) -> FetchConfig {
        FetchConfig {
            overpass_url: self.overpass_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                ..RetryPolicy::default()
            },
            ..FetchConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ElevationArgs {
    /// Skip elevation lookups (elevation gain is stored as 0)
    #[arg(long)]
    pub no_elevation: bool,

    /// Elevation lookup endpoint
    #[arg(long, env = "ELEVATION_URL", default_value = DEFAULT_ELEVATION_URL)]
    pub elevation_url: String,
}

impl ElevationArgs {
    pub fn to_config(&self) -> ElevationConfig {
        ElevationConfig {
            enabled: !self.no_elevation,
            url: self.elevation_url.clone(),
            ..ElevationConfig::default()
        }
    }
}
