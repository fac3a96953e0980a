//! # Corrective payout planning
//!
//! Works out how much each destination account is still owed by the relay: every source transfer credits its target
//! address with the amount it should have received net of fees, and every destination payout debits the address it
//! was made to. Accounts with a positive balance are owed funds.
//!
//! The resulting [`PayoutPlan`] is an unsigned, bank multi-send shaped description of the corrective transfer. This
//! module never signs or submits anything.

use std::collections::BTreeMap;

use bridge_audit_common::Amount;
use log::*;
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    audit_types::AuditTx,
    fees::{select_schedule, FeeSchedule},
    reconciler::ReconcileError,
};

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("Could not compute the expected payouts. {0}")]
    ReconcileError(#[from] ReconcileError),
    #[error("Could not serialize the payout plan. {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub address: String,
    pub coins: Vec<Coin>,
}

impl PayoutEntry {
    fn new(address: String, denom: &str, amount: Amount) -> Self {
        Self { address, coins: vec![Coin { denom: denom.to_string(), amount }] }
    }

    pub fn amount(&self) -> Amount {
        self.coins.iter().map(|c| &c.amount).sum()
    }
}

/// A single-input, multi-output transfer paying every under-paid account what it is owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub inputs: Vec<PayoutEntry>,
    pub outputs: Vec<PayoutEntry>,
}

impl PayoutPlan {
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn total(&self) -> Amount {
        self.outputs.iter().map(|o| o.amount()).sum()
    }

    pub fn to_json(&self) -> Result<String, PayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One `address: amount` line per output.
    pub fn balance_lines(&self) -> Vec<String> {
        self.outputs.iter().map(|o| format!("{}: {}", o.address, o.amount())).collect()
    }
}

/// Net balance owed to every target address. Negative balances mean the relay over-paid.
pub fn owed_balances(
    source: &[AuditTx],
    destination: &[AuditTx],
    schedules: &[FeeSchedule],
) -> Result<BTreeMap<String, BigInt>, ReconcileError> {
    let mut balances = BTreeMap::<String, BigInt>::new();
    for tx in source {
        let schedule = select_schedule(schedules, &tx.hash, tx.timestamp)?;
        let credit = BigInt::from(schedule.amount_after_fee(&tx.amount).into_biguint());
        *balances.entry(tx.target_address.clone()).or_default() += credit;
    }
    for tx in destination {
        let debit = BigInt::from(tx.amount.as_biguint().clone());
        *balances.entry(tx.target_address.clone()).or_default() -= debit;
    }
    Ok(balances)
}

/// Build the corrective transfer from `sender`. Outputs are sorted by address.
pub fn plan_payout(
    source: &[AuditTx],
    destination: &[AuditTx],
    schedules: &[FeeSchedule],
    sender: &str,
    denom: &str,
) -> Result<PayoutPlan, PayoutError> {
    let balances = owed_balances(source, destination, schedules)?;
    let outputs = balances
        .into_iter()
        .filter_map(|(address, balance)| match balance.into_parts() {
            (Sign::Plus, owed) => Some(PayoutEntry::new(address, denom, Amount::from(owed))),
            (Sign::Minus, over_paid) => {
                warn!("💰️ {address} was over-paid by {over_paid}");
                None
            },
            (Sign::NoSign, _) => None,
        })
        .collect::<Vec<_>>();
    if outputs.is_empty() {
        info!("💰️ Nothing to send. Every account has been paid in full.");
        return Ok(PayoutPlan { inputs: Vec::new(), outputs });
    }
    let total: Amount = outputs.iter().map(|o| o.amount()).sum();
    info!("💰️ {} accounts are owed a total of {total}", outputs.len());
    let inputs = vec![PayoutEntry::new(sender.to_string(), denom, total)];
    Ok(PayoutPlan { inputs, outputs })
}
