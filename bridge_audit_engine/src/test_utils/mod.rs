//! Fixtures for exercising the reconciler in tests.
use bridge_audit_common::Amount;
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;

use crate::{audit_types::AuditTx, fees::FeeSchedule};

pub const BRIDGE_CHAIN_INDEX: &str = "1007961752909";

pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// Midnight UTC on the given day of May 2023.
pub fn may(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, day, 0, 0, 0).single().unwrap_or_default()
}

/// A source transfer of `amount` to `target`, made at `timestamp`.
pub fn source_tx(hash: &str, target: &str, amount: u64, timestamp: DateTime<Utc>) -> AuditTx {
    AuditTx::new(hash, Amount::from(amount), timestamp)
        .with_target(target)
        .with_memo(format!("{target}:{BRIDGE_CHAIN_INDEX}"))
}

/// The relay's payout for the source transfer `source_hash`, made `delay_secs` after `source_time`.
pub fn dest_tx(
    hash: &str,
    target: &str,
    amount: u64,
    source_hash: &str,
    source_time: DateTime<Utc>,
    delay_secs: i64,
) -> AuditTx {
    AuditTx::new(hash, Amount::from(amount), source_time + Duration::seconds(delay_secs))
        .with_target(target)
        .with_memo(format!("{BRIDGE_CHAIN_INDEX}:{source_hash}:0"))
}

/// A single zero-fee schedule that accepts any amount below 10^15, in force from 2022.
pub fn zero_fee_schedules() -> Vec<FeeSchedule> {
    let from = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).single().unwrap_or_default();
    vec![FeeSchedule::zero_fee(from, Amount::from(1_000_000_000_000_000u64))]
}

/// The 0.1% schedule with a 0.007 to 0.05 fee and a 0.008 to 100 amount range, in force from 2022.
pub fn ratio_fee_schedules() -> Vec<FeeSchedule> {
    let from = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).single().unwrap_or_default();
    FeeSchedule::new(
        from,
        1,
        Amount::from(7_000u64),
        Amount::from(50_000u64),
        Amount::from(8_000u64),
        Amount::from(100_000_000u64),
    )
    .map(|s| vec![s])
    .unwrap_or_default()
}
