//! Ordering and date-window filtering of reconciliation results.
//!
//! Records are ordered newest first by their [`TxDiscrepancy::sort_timestamp`]. A [`ReportWindow`] is half-open:
//! a record is kept when `from <= timestamp < until`, so consecutive windows never report a record twice.

use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::{audit_types::TxDiscrepancy, reconciler::ReconcileError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    from: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl ReportWindow {
    /// Creates the window `[from, until)`. `from` must not be later than `until`; a reversed pair almost certainly
    /// means the two bounds were swapped by the caller.
    pub fn new(from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self, ReconcileError> {
        if from > until {
            return Err(ReconcileError::InvalidWindow { from, until });
        }
        Ok(Self { from, until })
    }

    /// A window that contains every representable timestamp.
    pub fn unbounded() -> Self {
        Self { from: DateTime::<Utc>::MIN_UTC, until: DateTime::<Utc>::MAX_UTC }
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from <= timestamp && timestamp < self.until
    }
}

impl Display for ReportWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.from, self.until)
    }
}

/// Sort `records` newest first, then drop those outside `window`. The sort is stable, so records with equal
/// timestamps keep the order the matcher produced them in.
pub fn order_and_filter(mut records: Vec<TxDiscrepancy>, window: &ReportWindow) -> Vec<TxDiscrepancy> {
    records.sort_by(|a, b| b.sort_timestamp().cmp(&a.sort_timestamp()));
    records.retain(|r| r.sort_timestamp().map(|ts| window.contains(ts)).unwrap_or(false));
    records
}
