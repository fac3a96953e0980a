//! # Bridge fee schedules
//!
//! The relay deducts a fee from every transfer before crediting the destination account. The fee policy changed
//! several times over the lifetime of the bridge, so each policy is captured as a [`FeeSchedule`] that becomes
//! effective at a given instant and stays in force until a later schedule supersedes it.
//!
//! For a transfer of `amount` minor units:
//!
//! ```text
//!    fee = clamp(floor(amount * fee_ratio_per_mille / 1000), min_fee, max_fee)
//!    amount_after_fee = amount - fee
//! ```
//!
//! Only transfers with `min_amount <= amount <= max_amount` are eligible for bridging at all.

use std::{collections::BTreeSet, path::Path};

use bridge_audit_common::Amount;
use chrono::{DateTime, TimeZone, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reconciler::ReconcileError;

const PER_MILLE: u64 = 1000;

#[derive(Debug, Error)]
pub enum FeeScheduleError {
    #[error("Invalid fee schedule effective from {effective_from}: {reason}")]
    InvalidSchedule { effective_from: DateTime<Utc>, reason: String },
    #[error("More than one fee schedule is effective from {0}")]
    DuplicateEffectiveFrom(DateTime<Utc>),
    #[error("Could not read the fee schedule table. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not parse the fee schedule table. {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    effective_from: DateTime<Utc>,
    /// Proportional fee in thousandths, so that 1 means 0.1%.
    fee_ratio_per_mille: u64,
    min_fee: Amount,
    max_fee: Amount,
    min_amount: Amount,
    max_amount: Amount,
}

#[derive(Deserialize)]
struct RawFeeSchedule {
    effective_from: DateTime<Utc>,
    fee_ratio_per_mille: u64,
    min_fee: Amount,
    max_fee: Amount,
    min_amount: Amount,
    max_amount: Amount,
}

impl<'de> Deserialize<'de> for FeeSchedule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawFeeSchedule::deserialize(deserializer)?;
        FeeSchedule::new(
            raw.effective_from,
            raw.fee_ratio_per_mille,
            raw.min_fee,
            raw.max_fee,
            raw.min_amount,
            raw.max_amount,
        )
        .map_err(serde::de::Error::custom)
    }
}

impl FeeSchedule {
    pub fn new(
        effective_from: DateTime<Utc>,
        fee_ratio_per_mille: u64,
        min_fee: Amount,
        max_fee: Amount,
        min_amount: Amount,
        max_amount: Amount,
    ) -> Result<Self, FeeScheduleError> {
        if min_fee > max_fee {
            return Err(FeeScheduleError::InvalidSchedule {
                effective_from,
                reason: format!("min_fee ({min_fee}) is greater than max_fee ({max_fee})"),
            });
        }
        if min_amount > max_amount {
            return Err(FeeScheduleError::InvalidSchedule {
                effective_from,
                reason: format!("min_amount ({min_amount}) is greater than max_amount ({max_amount})"),
            });
        }
        Ok(Self { effective_from, fee_ratio_per_mille, min_fee, max_fee, min_amount, max_amount })
    }

    /// A schedule that charges nothing and accepts every amount up to `max_amount`.
    pub fn zero_fee(effective_from: DateTime<Utc>, max_amount: Amount) -> Self {
        Self {
            effective_from,
            fee_ratio_per_mille: 0,
            min_fee: Amount::zero(),
            max_fee: Amount::zero(),
            min_amount: Amount::zero(),
            max_amount,
        }
    }

    pub fn effective_from(&self) -> DateTime<Utc> {
        self.effective_from
    }

    pub fn fee_ratio_per_mille(&self) -> u64 {
        self.fee_ratio_per_mille
    }

    pub fn min_fee(&self) -> &Amount {
        &self.min_fee
    }

    pub fn max_fee(&self) -> &Amount {
        &self.max_fee
    }

    pub fn min_amount(&self) -> &Amount {
        &self.min_amount
    }

    pub fn max_amount(&self) -> &Amount {
        &self.max_amount
    }

    /// The fee the relay charges for a transfer of `amount`, clamped to `[min_fee, max_fee]`.
    pub fn fee_for(&self, amount: &Amount) -> Amount {
        // PER_MILLE is non-zero, so the division always succeeds
        let fee = amount.mul_u64(self.fee_ratio_per_mille).div_u64(PER_MILLE).unwrap_or_default();
        let fee = if fee > self.max_fee { self.max_fee.clone() } else { fee };
        if fee < self.min_fee {
            self.min_fee.clone()
        } else {
            fee
        }
    }

    /// The amount the destination account should receive. Floors at zero if the fee exceeds the amount, which cannot
    /// happen for an in-range amount unless `min_fee > min_amount`.
    pub fn amount_after_fee(&self, amount: &Amount) -> Amount {
        amount.saturating_sub(&self.fee_for(amount))
    }

    pub fn is_in_range(&self, amount: &Amount) -> bool {
        &self.min_amount <= amount && amount <= &self.max_amount
    }
}

/// Select the schedule in force at `timestamp`: the one with the latest `effective_from` that is not after
/// `timestamp`. The order of `schedules` does not matter.
///
/// A timestamp that predates every schedule is a configuration error, since there is no fee policy to verify the
/// transfer against.
pub fn select_schedule<'a>(
    schedules: &'a [FeeSchedule],
    hash: &str,
    timestamp: DateTime<Utc>,
) -> Result<&'a FeeSchedule, ReconcileError> {
    let schedule = schedules
        .iter()
        .filter(|s| s.effective_from <= timestamp)
        .max_by_key(|s| s.effective_from)
        .ok_or_else(|| ReconcileError::NoFeeSchedule { hash: hash.to_string(), timestamp })?;
    trace!("💸️ Tx {hash} at {timestamp} uses the fee schedule effective from {}", schedule.effective_from);
    Ok(schedule)
}

/// Reads a JSON array of fee schedules. Every schedule is validated as it is parsed, and no two schedules may become
/// effective at the same instant.
pub fn load_fee_schedules<P: AsRef<Path>>(path: P) -> Result<Vec<FeeSchedule>, FeeScheduleError> {
    let data = std::fs::read_to_string(path)?;
    let schedules = serde_json::from_str::<Vec<FeeSchedule>>(&data)?;
    check_unique_effective_dates(&schedules)?;
    Ok(schedules)
}

/// Two schedules sharing an `effective_from` would make [`select_schedule`] depend on their order.
pub fn check_unique_effective_dates(schedules: &[FeeSchedule]) -> Result<(), FeeScheduleError> {
    let mut seen = BTreeSet::new();
    match schedules.iter().find(|s| !seen.insert(s.effective_from)) {
        Some(dup) => Err(FeeScheduleError::DuplicateEffectiveFrom(dup.effective_from)),
        None => Ok(()),
    }
}

/// The fee policy history of the bridge, in six-decimal minor units.
pub fn default_fee_schedules() -> Vec<FeeSchedule> {
    let schedule = |from: DateTime<Utc>, min_fee: u64, max_fee: u64, min_amount: u64, max_amount: u64| FeeSchedule {
        effective_from: from,
        fee_ratio_per_mille: 1,
        min_fee: Amount::from(min_fee),
        max_fee: Amount::from(max_fee),
        min_amount: Amount::from(min_amount),
        max_amount: Amount::from(max_amount),
    };
    vec![
        // 0.1%, fee 2.4 to 477, amount 4.8 to 2,400,000
        schedule(utc(2023, 1, 1, 0), 2_400_000, 477_000_000, 4_800_000, 2_400_000_000_000),
        // 0.1%, fee 0.007 to 0.05, amount 0.008 to 100
        schedule(utc(2023, 3, 17, 13), 7_000, 50_000, 8_000, 100_000_000),
        // the first policy again
        schedule(utc(2023, 3, 24, 17), 2_400_000, 477_000_000, 4_800_000, 2_400_000_000_000),
    ]
}

fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single().unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    fn ratio_schedule() -> FeeSchedule {
        FeeSchedule::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            1,
            Amount::from(7000u64),
            Amount::from(50000u64),
            Amount::zero(),
            Amount::from(u64::MAX),
        )
        .unwrap()
    }

    #[test]
    fn min_fee_applies() {
        let s = ratio_schedule();
        assert_eq!(s.amount_after_fee(&Amount::from(1_000_000u64)), Amount::from(993_000u64));
    }

    #[test]
    fn max_fee_applies() {
        let s = ratio_schedule();
        assert_eq!(s.amount_after_fee(&Amount::from(100_000_000_000u64)), Amount::from(99_999_950_000u64));
    }

    #[test]
    fn proportional_fee_applies() {
        let s = ratio_schedule();
        assert_eq!(s.fee_for(&Amount::from(10_000_000u64)), Amount::from(10_000u64));
        assert_eq!(s.amount_after_fee(&Amount::from(10_000_000u64)), Amount::from(9_990_000u64));
    }

    #[test]
    fn proportional_fee_rounds_down() {
        let s = FeeSchedule::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            3,
            Amount::zero(),
            Amount::from(u64::MAX),
            Amount::zero(),
            Amount::from(u64::MAX),
        )
        .unwrap();
        // 3 * 999 / 1000 = 2.997
        assert_eq!(s.fee_for(&Amount::from(999u64)), Amount::from(2u64));
    }

    #[test]
    fn fee_larger_than_amount_floors_at_zero() {
        let s = ratio_schedule();
        assert_eq!(s.amount_after_fee(&Amount::from(10u64)), Amount::zero());
    }

    #[test]
    fn invalid_schedules_are_rejected() {
        let from = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let err = FeeSchedule::new(from, 0, Amount::from(1000u64), Amount::zero(), Amount::zero(), Amount::from(10u64));
        assert!(matches!(err, Err(FeeScheduleError::InvalidSchedule { .. })));
        let err = FeeSchedule::new(from, 0, Amount::zero(), Amount::zero(), Amount::from(10u64), Amount::from(1u64));
        assert!(matches!(err, Err(FeeScheduleError::InvalidSchedule { .. })));
    }

    #[test]
    fn range_check_is_inclusive() {
        let s = FeeSchedule::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            0,
            Amount::zero(),
            Amount::zero(),
            Amount::from(1000u64),
            Amount::from(10000u64),
        )
        .unwrap();
        assert!(!s.is_in_range(&Amount::from(999u64)));
        assert!(s.is_in_range(&Amount::from(1000u64)));
        assert!(s.is_in_range(&Amount::from(10000u64)));
        assert!(!s.is_in_range(&Amount::from(10001u64)));
    }

    #[test]
    fn selects_latest_effective_schedule() {
        let schedules = default_fee_schedules();
        let early = Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap();
        let middle = Utc.with_ymd_and_hms(2023, 3, 20, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(select_schedule(&schedules, "h", early).unwrap(), &schedules[0]);
        assert_eq!(select_schedule(&schedules, "h", middle).unwrap(), &schedules[1]);
        assert_eq!(select_schedule(&schedules, "h", late).unwrap(), &schedules[2]);
        // exactly at the switch-over instant, the new schedule is already in force
        let switch = Utc.with_ymd_and_hms(2023, 3, 17, 13, 0, 0).unwrap();
        assert_eq!(select_schedule(&schedules, "h", switch).unwrap(), &schedules[1]);
        // order of the table is irrelevant
        let reversed = schedules.iter().rev().cloned().collect::<Vec<_>>();
        assert_eq!(select_schedule(&reversed, "h", middle).unwrap(), &schedules[1]);
    }

    #[test]
    fn no_schedule_is_an_error() {
        let schedules = default_fee_schedules();
        let too_early = Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 59).unwrap();
        let err = select_schedule(&schedules, "H9", too_early).unwrap_err();
        assert!(matches!(err, ReconcileError::NoFeeSchedule { ref hash, .. } if hash == "H9"));
        assert!(select_schedule(&[], "H9", too_early).is_err());
    }

    #[test]
    fn schedules_from_json() {
        let json = r#"[{
            "effective_from": "2023-03-17T13:00:00Z",
            "fee_ratio_per_mille": 1,
            "min_fee": "7000",
            "max_fee": "50000",
            "min_amount": "8000",
            "max_amount": "100000000"
        }]"#;
        let schedules = serde_json::from_str::<Vec<FeeSchedule>>(json).unwrap();
        assert_eq!(schedules[0], default_fee_schedules()[1]);
        let invalid = r#"[{
            "effective_from": "2023-03-17T13:00:00Z",
            "fee_ratio_per_mille": 1,
            "min_fee": "70000",
            "max_fee": "50000",
            "min_amount": "8000",
            "max_amount": "100000000"
        }]"#;
        assert!(serde_json::from_str::<Vec<FeeSchedule>>(invalid).is_err());
    }

    #[test]
    fn shared_effective_dates_are_rejected() {
        assert!(check_unique_effective_dates(&default_fee_schedules()).is_ok());
        let mut schedules = default_fee_schedules();
        schedules.push(ratio_schedule());
        let err = check_unique_effective_dates(&schedules).unwrap_err();
        assert!(matches!(err, FeeScheduleError::DuplicateEffectiveFrom(ts) if ts == ratio_schedule().effective_from()));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&schedules).unwrap();
        std::io::Write::write_all(&mut file, json.as_bytes()).unwrap();
        let err = load_fee_schedules(file.path()).unwrap_err();
        assert!(matches!(err, FeeScheduleError::DuplicateEffectiveFrom(_)));

        let mut good = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&default_fee_schedules()).unwrap();
        std::io::Write::write_all(&mut good, json.as_bytes()).unwrap();
        assert_eq!(load_fee_schedules(good.path()).unwrap(), default_fee_schedules());
    }
}
