//! # Bridge memo formats
//!
//! The two ledgers annotate bridge transfers differently:
//!
//! * On the source ledger the user puts the destination account and the bridge chain index in the memo:
//!   ```text
//!      {target_address}:{bridge_chain_index}
//!   ```
//!   Raw ledger memos carry this text hex-encoded.
//! * On the destination ledger the relay writes the originating source transaction hash between the chain index and
//!   a sequence number:
//!   ```text
//!      {bridge_chain_index}:{source_tx_hash}:{sequence}
//!   ```
use log::trace;

use crate::audit_types::CorrelationId;

/// Extract the source transaction hash that a destination memo refers to. Returns `None` for memos that don't have
/// exactly three colon-separated fields, or whose hash field is empty.
pub fn decode_correlation_id(memo: &str) -> Option<CorrelationId> {
    let fragments = memo.split(':').collect::<Vec<_>>();
    let id = match fragments.as_slice() {
        [_, hash, _] => Some(CorrelationId::from_hash(hash)),
        _ => None,
    };
    let id = id.filter(|id| !id.as_str().is_empty());
    if id.is_none() {
        trace!("🧾️ '{memo}' is not a destination bridge memo");
    }
    id
}

/// Extract the target address from a plain-text source memo, provided it names `bridge_chain_index`.
pub fn decode_source_memo(memo: &str, bridge_chain_index: &str) -> Option<String> {
    let fragments = memo.split(':').collect::<Vec<_>>();
    match fragments.as_slice() {
        [target, index] if *index == bridge_chain_index => Some(target.to_string()),
        _ => None,
    }
}

/// As [`decode_source_memo`], for hex-encoded memo data as stored on the ledger. Returns the decoded target address
/// and the decoded memo text.
pub fn decode_hex_source_memo(hex_memo: &str, bridge_chain_index: &str) -> Option<(String, String)> {
    let bytes = hex::decode(hex_memo).ok()?;
    let memo = String::from_utf8(bytes).ok()?;
    decode_source_memo(&memo, bridge_chain_index).map(|target| (target, memo))
}
