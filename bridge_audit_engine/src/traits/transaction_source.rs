use thiserror::Error;

use crate::audit_types::AuditTx;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not read transactions from {path}. {source}")]
    IOError { path: String, source: std::io::Error },
    #[error("Transactions in {path} are malformed. {source}")]
    ParseError { path: String, source: serde_json::Error },
}

pub trait TransactionSource {
    /// A short human-readable description of where the transactions come from, for log messages.
    fn describe(&self) -> String;

    /// Fetch every transaction this source holds. The result is final: the reconciler never calls back into the
    /// source.
    fn fetch_transactions(&self) -> Result<Vec<AuditTx>, SourceError>;
}
