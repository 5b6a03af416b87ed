use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Why an element did not become a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error)]
pub enum SkipReason {
    #[error("malformed element")]
    Malformed,
    #[error("excluded name")]
    ExcludedName,
    #[error("road highway")]
    RoadHighway,
    #[error("no usable geometry")]
    NoGeometry,
    #[error("coordinates out of range")]
    InvalidCoordinates,
    #[error("too short")]
    TooShort,
    #[error("too long")]
    TooLong,
    #[error("not public parking")]
    NotPublic,
    #[error("missing coordinates")]
    MissingCoordinates,
    #[error("no trail within search radius")]
    NoNearbyTrail,
    #[error("not a bus stop or station")]
    UnknownTransportType,
}

/// Tally of one import phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub phase: &'static str,
    pub downloaded: usize,
    pub saved: usize,
    pub failed_saves: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Download gave up; nothing was processed
    pub abandoned: bool,
}

impl ImportReport {
    pub fn new(phase: &'static str, downloaded: usize) -> Self {
        Self {
            phase,
            downloaded,
            ..Self::default()
        }
    }

    pub fn abandoned(phase: &'static str) -> Self {
        Self {
            phase,
            abandoned: true,
            ..Self::default()
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn record_saved(&mut self) {
        self.saved += 1;
    }

    pub fn record_failed_save(&mut self) {
        self.failed_saves += 1;
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn log_summary(&self) {
        if self.abandoned {
            tracing::error!("{}: download failed, phase skipped", self.phase);
            return;
        }

        tracing::info!("{}", self);
        for (reason, count) in &self.skipped {
            tracing::debug!("  skipped ({}): {}", reason, count);
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.abandoned {
            return write!(f, "{}: skipped (download failed)", self.phase);
        }
        write!(
            f,
            "{}: saved {} of {} downloaded ({} skipped, {} failed saves)",
            self.phase,
            self.saved,
            self.downloaded,
            self.total_skipped(),
            self.failed_saves
        )
    }
}
