//! Bridge Audit Engine
//!
//! The bridge audit engine reconciles the two sides of a token bridge. A user sends tokens into the bridge on the
//! source ledger, and a relay later credits the equivalent amount, less a fee, on the destination ledger. The engine
//! pairs every source transfer with the destination payout that refers to it and classifies anything that does not
//! reconcile.
//!
//! The library is divided into the following sections:
//! 1. The domain types ([`mod@audit_types`]) shared by every stage: ledger-agnostic transfers and the records that
//!    describe how they were classified.
//! 2. Fee policy ([`mod@fees`]). The fee the relay was entitled to deduct depends on when the transfer was made.
//! 3. Reconciliation ([`mod@reconciler`]): matching and classification, ordering and window filtering, and summary
//!    totals.
//! 4. Corrective payouts ([`mod@payout`]), which work out what the relay still owes and describe the transfer that
//!    would settle it.
//!
//! Transactions are supplied through the [`traits::TransactionSource`] trait. The engine itself does no network I/O.
pub mod audit_types;
pub mod fees;
pub mod helpers;
pub mod payout;
pub mod reconciler;
pub mod sources;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use reconciler::{
    matcher::find_discrepancies,
    summary::{build_summary, orphan_source_hashes, Summary},
    window::{order_and_filter, ReportWindow},
    ReconcileError,
    Reconciler,
};
