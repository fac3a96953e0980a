use std::collections::HashSet;

use bridge_audit_common::Amount;
use bridge_audit_engine::{
    audit_types::{AuditTx, DiscrepancyKind},
    fees::FeeSchedule,
    test_utils::*,
    Reconciler,
    ReportWindow,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn schedule(ratio: u64, min_fee: u64, extra_fee: u64) -> FeeSchedule {
    FeeSchedule::new(
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        ratio,
        Amount::from(min_fee),
        Amount::from(min_fee + extra_fee),
        Amount::zero(),
        Amount::from(u64::MAX),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn fee_stays_within_bounds(
        ratio in 0u64..1000,
        min_fee in 0u64..100_000,
        extra in 0u64..1_000_000,
        amount in any::<u64>(),
    ) {
        let s = schedule(ratio, min_fee, extra);
        let fee = s.fee_for(&Amount::from(amount));
        prop_assert!(&fee >= s.min_fee());
        prop_assert!(&fee <= s.max_fee());
        prop_assert!(s.amount_after_fee(&Amount::from(amount)) <= Amount::from(amount));
    }

    #[test]
    fn after_fee_amount_never_decreases(
        ratio in 0u64..1000,
        min_fee in 0u64..100_000,
        extra in 0u64..1_000_000,
        a in 0u64..1u64 << 48,
        b in 0u64..1u64 << 48,
    ) {
        let s = schedule(ratio, min_fee, extra);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(s.amount_after_fee(&Amount::from(lo)) <= s.amount_after_fee(&Amount::from(hi)));
    }

    /// With `include_all`, every transfer on either ledger appears in exactly one record.
    #[test]
    fn every_transfer_in_exactly_one_record(
        sources in prop::collection::vec((0usize..12, 0u8..3, 1u64..1000, 1u32..28), 0..12),
        payouts in prop::collection::vec((0usize..16, 0u8..3, 1u64..1000, 0i64..86_400, any::<bool>()), 0..16),
    ) {
        let targets = ["A", "B", "C"];
        let source = sources
            .iter()
            .enumerate()
            .map(|(i, (_, t, amount, day))| source_tx(&format!("H{i}"), targets[*t as usize], *amount, may(*day)))
            .collect::<Vec<AuditTx>>();
        let destination = payouts
            .iter()
            .enumerate()
            .map(|(i, (h, t, amount, delay, valid))| {
                let tx = dest_tx(&format!("D{i}"), targets[*t as usize], *amount, &format!("H{h}"), may(1), *delay);
                if *valid { tx } else { tx.with_memo("not a memo") }
            })
            .collect::<Vec<AuditTx>>();
        let records = Reconciler::new(zero_fee_schedules(), ReportWindow::unbounded())
            .include_all(true)
            .run(&source, &destination)
            .unwrap();

        let source_hashes =
            records.iter().filter_map(|r| r.source.as_ref()).map(|t| t.hash.clone()).collect::<Vec<_>>();
        let dest_hashes =
            records.iter().filter_map(|r| r.destination.as_ref()).map(|t| t.hash.clone()).collect::<Vec<_>>();
        prop_assert_eq!(source_hashes.len(), source.len());
        prop_assert_eq!(dest_hashes.len(), destination.len());
        prop_assert_eq!(source_hashes.iter().collect::<HashSet<_>>().len(), source.len());
        prop_assert_eq!(dest_hashes.iter().collect::<HashSet<_>>().len(), destination.len());
        for r in &records {
            if r.kind == DiscrepancyKind::CleanMatch {
                prop_assert_eq!(r.source_amount(), r.destination_amount());
            }
        }
    }
}
