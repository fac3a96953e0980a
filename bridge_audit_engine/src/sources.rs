use std::path::PathBuf;

use log::*;

use crate::{
    audit_types::AuditTx,
    helpers::{decode_hex_source_memo, decode_source_memo},
    traits::{SourceError, TransactionSource},
};

/// Reads a JSON array of [`AuditTx`] records from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TransactionSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch_transactions(&self) -> Result<Vec<AuditTx>, SourceError> {
        let path = self.describe();
        let data = std::fs::read_to_string(&self.path)
            .map_err(|source| SourceError::IOError { path: path.clone(), source })?;
        let txs = serde_json::from_str::<Vec<AuditTx>>(&data)
            .map_err(|source| SourceError::ParseError { path: path.clone(), source })?;
        debug!("📂️ Read {} transactions from {path}", txs.len());
        Ok(txs)
    }
}

/// An in-memory list of transactions.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    txs: Vec<AuditTx>,
}

impl VecSource {
    pub fn new(txs: Vec<AuditTx>) -> Self {
        Self { txs }
    }
}

impl TransactionSource for VecSource {
    fn describe(&self) -> String {
        format!("{} in-memory transactions", self.txs.len())
    }

    fn fetch_transactions(&self) -> Result<Vec<AuditTx>, SourceError> {
        Ok(self.txs.clone())
    }
}

/// Keep only transactions sent from `account`. An empty `account` keeps everything.
pub fn sent_from(txs: Vec<AuditTx>, account: &str) -> Vec<AuditTx> {
    if account.is_empty() {
        return txs;
    }
    txs.into_iter().filter(|tx| tx.from_address == account).collect()
}

/// Fill in the target address of source transfers from their memo. Memos may be plain text or hex-encoded. Transfers
/// that already carry a target address are kept as-is. Transfers whose memo does not name `bridge_chain_index` are
/// not bridge transfers and are dropped.
pub fn resolve_source_targets(txs: Vec<AuditTx>, bridge_chain_index: &str) -> Vec<AuditTx> {
    let total = txs.len();
    let resolved = txs
        .into_iter()
        .filter_map(|mut tx| {
            if !tx.target_address.is_empty() {
                return Some(tx);
            }
            if let Some(target) = decode_source_memo(&tx.memo, bridge_chain_index) {
                tx.target_address = target;
                return Some(tx);
            }
            if let Some((target, memo)) = decode_hex_source_memo(&tx.memo, bridge_chain_index) {
                tx.target_address = target;
                tx.memo = memo;
                return Some(tx);
            }
            trace!("🧾️ Tx {} is not a bridge transfer. Memo: '{}'", tx.hash, tx.memo);
            None
        })
        .collect::<Vec<_>>();
    if resolved.len() < total {
        debug!("🧾️ Dropped {} source transfers without a bridge memo", total - resolved.len());
    }
    resolved
}
