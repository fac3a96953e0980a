//! Correlation of source and destination transfers.
//!
//! Every destination transfer names the source transfer it pays out in its memo (see [`crate::helpers`]), so the
//! matcher indexes destination transfers by that correlation id and source transfers by their own hash, then walks
//! the source side. Each transfer on either ledger ends up in exactly one record, with two exceptions that are
//! controlled by `include_all`: clean matches and out-of-range source transfers are only reported when it is set.
//!
//! The indices live for the duration of a single call. They are ordered maps, so the output of
//! [`find_discrepancies`] depends only on its inputs.

use std::collections::{btree_map::Entry, BTreeMap};

use log::*;

use crate::{
    audit_types::{AuditTx, CorrelationId, DiscrepancyKind, TxDiscrepancy},
    fees::{select_schedule, FeeSchedule},
    helpers::decode_correlation_id,
    reconciler::ReconcileError,
};

/// Pair `source` with `destination` transfers and classify every transfer.
///
/// The returned records are in no particular order; use [`super::window::order_and_filter`] to sort them.
///
/// Fails if a source transfer predates every fee schedule, since its expected payout cannot be determined.
pub fn find_discrepancies(
    source: &[AuditTx],
    destination: &[AuditTx],
    schedules: &[FeeSchedule],
    include_all: bool,
) -> Result<Vec<TxDiscrepancy>, ReconcileError> {
    let mut records = Vec::new();
    let mut destination_by_id = index_destination(destination, &mut records);
    let source_by_hash = index_source(source);

    for (id, src) in source_by_hash {
        let schedule = select_schedule(schedules, &src.hash, src.timestamp)?;
        if !schedule.is_in_range(&src.amount) {
            trace!("🔎️ Tx {} amount {} is outside the bridgeable range. Skipping.", src.hash, src.amount);
            if include_all {
                records.push(TxDiscrepancy::source_only(src, DiscrepancyKind::AmountOutOfRange));
            }
            continue;
        }
        let Some(dst) = destination_by_id.remove(&id) else {
            debug!("🔎️ Tx {} was never paid out on the destination ledger", src.hash);
            records.push(TxDiscrepancy::source_only(src, DiscrepancyKind::OrphanSource));
            continue;
        };
        if src.target_address != dst.target_address {
            debug!(
                "🔎️ Tx {} targets {}, but {} paid out to {}",
                src.hash, src.target_address, dst.hash, dst.target_address
            );
            records.push(TxDiscrepancy::new(Some(src), Some(dst), DiscrepancyKind::MismatchedTargetAddress, None));
            continue;
        }
        let expected = schedule.amount_after_fee(&src.amount);
        if expected != dst.amount {
            debug!("🔎️ Tx {} should have paid out {expected}, but {} paid out {}", src.hash, dst.hash, dst.amount);
            records.push(TxDiscrepancy::new(Some(src), Some(dst), DiscrepancyKind::AmountMismatch, Some(expected)));
        } else if include_all {
            records.push(TxDiscrepancy::new(Some(src), Some(dst), DiscrepancyKind::CleanMatch, Some(expected)));
        }
    }

    for (_, dst) in destination_by_id {
        debug!("🔎️ Tx {} pays out a source transfer that does not exist", dst.hash);
        records.push(TxDiscrepancy::destination_only(dst, DiscrepancyKind::OrphanDest));
    }
    Ok(records)
}

/// Index destination transfers by the correlation id in their memo. Transfers with an undecodable memo, and any
/// transfer whose id was already claimed by an earlier one (in input order), are classified immediately.
fn index_destination(destination: &[AuditTx], records: &mut Vec<TxDiscrepancy>) -> BTreeMap<CorrelationId, AuditTx> {
    let mut index = BTreeMap::new();
    for tx in destination {
        let Some(id) = decode_correlation_id(&tx.memo) else {
            debug!("🔎️ Tx {} has an invalid memo: '{}'", tx.hash, tx.memo);
            records.push(TxDiscrepancy::destination_only(tx.clone(), DiscrepancyKind::InvalidMemoOnDest));
            continue;
        };
        match index.entry(id) {
            Entry::Vacant(e) => {
                e.insert(tx.clone());
            },
            Entry::Occupied(e) => {
                let first: &AuditTx = e.get();
                debug!("🔎️ Tx {} claims source tx {}, which {} already claimed", tx.hash, e.key(), first.hash);
                let kind = DiscrepancyKind::DuplicatedCorrelationIdOnDest;
                records.push(TxDiscrepancy::destination_only(tx.clone(), kind));
            },
        }
    }
    index
}

/// Index source transfers by normalised hash. A hash appearing twice with identical contents is a harmless overlap in
/// the fetched pages and is collapsed. A hash appearing twice with different contents should not happen on a real
/// ledger; the later record wins and a warning is logged.
fn index_source(source: &[AuditTx]) -> BTreeMap<CorrelationId, AuditTx> {
    let mut index = BTreeMap::new();
    for tx in source {
        if let Some(previous) = index.insert(CorrelationId::from_hash(&tx.hash), tx.clone()) {
            if &previous != tx {
                warn!("🔎️ Source tx {} appears twice with different contents. Using the later record.", tx.hash);
            }
        }
    }
    index
}

#[cfg(test)]
mod test {
    use bridge_audit_common::Amount;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    fn zero_fee() -> Vec<FeeSchedule> {
        vec![FeeSchedule::zero_fee(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(), Amount::from(1_000_000u64))]
    }

    fn src(hash: &str, target: &str, amount: u64) -> AuditTx {
        AuditTx::new(hash, Amount::from(amount), ts()).with_target(target).with_memo(format!("{target}:1111"))
    }

    fn dst(hash: &str, target: &str, amount: u64, source_hash: &str) -> AuditTx {
        AuditTx::new(hash, Amount::from(amount), ts()).with_target(target).with_memo(format!("1111:{source_hash}:0"))
    }

    #[test]
    fn destination_duplicates_keep_first_in_input_order() {
        let mut records = Vec::new();
        let malformed = AuditTx::new("D3", Amount::from(1u64), ts()).with_memo("bad");
        let index = index_destination(&[dst("D1", "a", 1, "H1"), dst("D2", "b", 1, "h1"), malformed], &mut records);
        assert_eq!(index.len(), 1);
        assert_eq!(index[&CorrelationId::from_hash("H1")].hash, "D1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, DiscrepancyKind::DuplicatedCorrelationIdOnDest);
        assert_eq!(records[0].destination.as_ref().unwrap().hash, "D2");
        assert_eq!(records[1].kind, DiscrepancyKind::InvalidMemoOnDest);
        assert_eq!(records[1].destination.as_ref().unwrap().hash, "D3");
    }

    #[test]
    fn empty_correlation_id_is_an_invalid_memo() {
        let payout = AuditTx::new("D1", Amount::from(1u64), ts()).with_memo("1111::0");
        let records = find_discrepancies(&[], &[payout], &zero_fee(), false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiscrepancyKind::InvalidMemoOnDest);
    }

    #[test]
    fn source_duplicates_last_wins() {
        let index = index_source(&[src("h1", "a", 1), src("H1", "b", 2)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index[&CorrelationId::from_hash("H1")].target_address, "b");
    }

    #[test]
    fn hash_case_does_not_matter() {
        let records =
            find_discrepancies(&[src("abc", "a", 10)], &[dst("D1", "a", 10, "0xABC")], &zero_fee(), true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiscrepancyKind::CleanMatch);
        assert_eq!(records[0].expected_amount, Some(Amount::from(10u64)));
    }

    #[test]
    fn out_of_range_source_leaves_destination_unmatched() {
        let records =
            find_discrepancies(&[src("H1", "a", 2_000_000)], &[dst("D1", "a", 10, "H1")], &zero_fee(), true).unwrap();
        let kinds = records.iter().map(|r| r.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![DiscrepancyKind::AmountOutOfRange, DiscrepancyKind::OrphanDest]);
    }

    #[test]
    fn missing_schedule_fails_the_run() {
        let early = AuditTx::new("H1", Amount::from(1u64), Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        let err = find_discrepancies(&[early], &[], &zero_fee(), false).unwrap_err();
        assert!(matches!(err, ReconcileError::NoFeeSchedule { .. }));
    }
}
