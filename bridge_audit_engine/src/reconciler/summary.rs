//! Aggregate accounting totals for a reconciliation run.
//!
//! The summary is meant to be built from an unfiltered-by-kind result set, i.e. one produced with `include_all`
//! set, since clean matches carry the burnt, paid-out and fee totals.

use std::fmt::Display;

use bridge_audit_common::{Amount, REPORT_DECIMALS};
use serde::{Deserialize, Serialize};

use crate::audit_types::{AuditTx, DiscrepancyKind, TxDiscrepancy};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Credits to the destination bridge account from the funding account.
    pub income_amount: Amount,
    /// Payouts made by the relay for cleanly matched transfers.
    pub outcome_amount: Amount,
    /// Current balance of the destination bridge account, as reported by the ledger.
    pub dest_balance: Amount,
    /// Amount sent into the bridge on the source ledger.
    pub burnt_amount: Amount,
    pub orphan_count: usize,
    pub orphan_amount: Amount,
    /// Outstanding supply of the bridged token on the source ledger.
    pub source_supply: Amount,
    /// Fees retained by the relay on cleanly matched transfers.
    pub fees_amount: Amount,
    /// Number of discrepancies other than orphan source transfers.
    pub non_orphan_discrepancy_count: usize,
}

/// Walk `discrepancies` once and total them up. `dest_balance` and `source_supply` are carried through unchanged.
pub fn build_summary(
    discrepancies: &[TxDiscrepancy],
    incoming: &[AuditTx],
    dest_balance: Amount,
    source_supply: Amount,
) -> Summary {
    let mut summary = Summary {
        income_amount: incoming.iter().map(|tx| &tx.amount).sum(),
        dest_balance,
        source_supply,
        ..Default::default()
    };
    for record in discrepancies {
        match record.kind {
            DiscrepancyKind::CleanMatch => {
                let burnt = record.source_amount();
                let paid = record.destination_amount();
                summary.fees_amount += burnt.saturating_sub(&paid);
                summary.burnt_amount += burnt;
                summary.outcome_amount += paid;
            },
            DiscrepancyKind::AmountOutOfRange => {
                summary.burnt_amount += record.source_amount();
            },
            DiscrepancyKind::OrphanSource => {
                let burnt = record.source_amount();
                summary.burnt_amount += &burnt;
                summary.orphan_amount += burnt;
                summary.orphan_count += 1;
            },
            _ => summary.non_orphan_discrepancy_count += 1,
        }
    }
    summary
}

/// The source hashes of all orphan source transfers, e.g. to ask the relay to rescan them.
pub fn orphan_source_hashes(discrepancies: &[TxDiscrepancy]) -> Vec<String> {
    discrepancies
        .iter()
        .filter(|r| r.kind == DiscrepancyKind::OrphanSource)
        .filter_map(|r| r.source.as_ref().map(|tx| tx.hash.clone()))
        .collect()
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = |a: &Amount| a.to_decimal_string(REPORT_DECIMALS);
        writeln!(
            f,
            "Destination [IncomeAmount: {}, OutcomeAmount: {}, Balance: {}]",
            d(&self.income_amount),
            d(&self.outcome_amount),
            d(&self.dest_balance)
        )?;
        writeln!(
            f,
            "Source      [Burnt: {}, Supply: {}, OrphanTxs: {}, OrphanTxAmount: {}]",
            d(&self.burnt_amount),
            d(&self.source_supply),
            self.orphan_count,
            d(&self.orphan_amount)
        )?;
        writeln!(f, "Fees: {}", d(&self.fees_amount))?;
        write!(f, "NonOrphanDiscrepancies: {}", self.non_orphan_discrepancy_count)
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn tx(amount: u64) -> AuditTx {
        AuditTx::new("h", Amount::from(amount), Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
    }

    fn pair(source: u64, dest: u64, kind: DiscrepancyKind) -> TxDiscrepancy {
        TxDiscrepancy::new(Some(tx(source)), Some(tx(dest)), kind, None)
    }

    #[test]
    fn totals() {
        let discrepancies = vec![
            pair(100, 90, DiscrepancyKind::CleanMatch),
            pair(90, 80, DiscrepancyKind::CleanMatch),
            TxDiscrepancy::source_only(tx(25), DiscrepancyKind::OrphanSource),
            TxDiscrepancy::source_only(tx(10), DiscrepancyKind::OrphanSource),
            pair(10, 11, DiscrepancyKind::AmountMismatch),
            TxDiscrepancy::source_only(tx(7), DiscrepancyKind::AmountOutOfRange),
            TxDiscrepancy::destination_only(tx(3), DiscrepancyKind::OrphanDest),
        ];
        let incoming = vec![tx(350), tx(20)];
        let summary = build_summary(&discrepancies, &incoming, Amount::from(333u64), Amount::from(555u64));
        assert_eq!(
            summary,
            Summary {
                income_amount: Amount::from(370u64),
                outcome_amount: Amount::from(170u64),
                dest_balance: Amount::from(333u64),
                burnt_amount: Amount::from(232u64),
                orphan_count: 2,
                orphan_amount: Amount::from(35u64),
                source_supply: Amount::from(555u64),
                fees_amount: Amount::from(20u64),
                non_orphan_discrepancy_count: 2,
            }
        );
    }

    #[test]
    fn empty_input() {
        let summary = build_summary(&[], &[], Amount::zero(), Amount::from(1u64));
        assert_eq!(summary.source_supply, Amount::from(1u64));
        assert_eq!(summary.burnt_amount, Amount::zero());
        assert_eq!(summary.orphan_count, 0);
    }

    #[test]
    fn display() {
        let summary = Summary {
            income_amount: Amount::from(1_500_000u64),
            fees_amount: Amount::from(7u64),
            orphan_count: 3,
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.starts_with("Destination [IncomeAmount: 1.500000, OutcomeAmount: 0.000000, Balance: 0.000000]\n"));
        assert!(text.contains("OrphanTxs: 3"));
        assert!(text.contains("Fees: 0.000007\n"));
        assert!(text.ends_with("NonOrphanDiscrepancies: 0"));
    }

    #[test]
    fn orphan_hashes() {
        let mut orphan = tx(1);
        orphan.hash = "ORPHAN".into();
        let records = vec![
            TxDiscrepancy::source_only(orphan, DiscrepancyKind::OrphanSource),
            pair(1, 1, DiscrepancyKind::CleanMatch),
        ];
        assert_eq!(orphan_source_hashes(&records), vec!["ORPHAN".to_string()]);
    }
}
