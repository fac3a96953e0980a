use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("No fee schedule is in force for tx {hash} at {timestamp}. Check the fee schedule table.")]
    NoFeeSchedule { hash: String, timestamp: DateTime<Utc> },
    #[error("The report window is empty: it starts at {from}, after it ends at {until}.")]
    InvalidWindow { from: DateTime<Utc>, until: DateTime<Utc> },
}
