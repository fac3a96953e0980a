//! # Ledger data sources
//!
//! The reconciler works on fully materialised transaction lists. Fetching them from a ledger (paging through RPC or
//! history APIs, retrying, fetching in parallel) is the job of a [`TransactionSource`]. Anything that can produce a
//! list of [`AuditTx`] records can back a reconciliation run.
//!
//! * [`crate::sources::JsonFileSource`] reads records previously exported to a JSON file.
//! * [`crate::sources::VecSource`] serves an in-memory list.
//!
//! [`AuditTx`]: crate::audit_types::AuditTx
mod transaction_source;

pub use transaction_source::{SourceError, TransactionSource};
