//! # Cross-ledger reconciliation
//!
//! The `reconciler` module pairs source-ledger transfers with the destination-ledger payouts the relay made for them
//! and classifies every transfer on either side.
//!
//! * [`matcher`] correlates the two transaction sets and decides the [`DiscrepancyKind`] of every record.
//! * [`window`] orders a result set by transfer time and restricts it to a reporting window.
//! * [`summary`] aggregates a result set into accounting totals.
//!
//! [`Reconciler`] bundles the fee schedules, window and output options of a single run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bridge_audit_engine::{fees::default_fee_schedules, Reconciler, ReportWindow};
//! let window = ReportWindow::new(from, until)?;
//! let reconciler = Reconciler::new(default_fee_schedules(), window).include_all(true);
//! let report = reconciler.run(&source_txs, &destination_txs)?;
//! ```
//!
//! [`DiscrepancyKind`]: crate::audit_types::DiscrepancyKind

mod errors;
pub mod matcher;
pub mod summary;
pub mod window;

use log::info;

pub use errors::ReconcileError;

use crate::{
    audit_types::{AuditTx, TxDiscrepancy},
    fees::FeeSchedule,
    reconciler::window::ReportWindow,
};

/// The parameters of one reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciler {
    schedules: Vec<FeeSchedule>,
    window: ReportWindow,
    include_all: bool,
}

impl Reconciler {
    pub fn new(schedules: Vec<FeeSchedule>, window: ReportWindow) -> Self {
        Self { schedules, window, include_all: false }
    }

    /// When set, clean matches and out-of-range transfers are reported alongside the discrepancies.
    pub fn include_all(mut self, include_all: bool) -> Self {
        self.include_all = include_all;
        self
    }

    /// Match, classify, order and filter. Fails only on configuration errors.
    pub fn run(&self, source: &[AuditTx], destination: &[AuditTx]) -> Result<Vec<TxDiscrepancy>, ReconcileError> {
        info!(
            "🔎️ Reconciling {} source and {} destination transfers (include all: {})",
            source.len(),
            destination.len(),
            self.include_all
        );
        let records = matcher::find_discrepancies(source, destination, &self.schedules, self.include_all)?;
        let total = records.len();
        let records = window::order_and_filter(records, &self.window);
        info!("🔎️ {} of {total} records fall within {}", records.len(), self.window);
        Ok(records)
    }
}
