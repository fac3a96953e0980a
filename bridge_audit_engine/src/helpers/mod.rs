mod memo;

pub use memo::{decode_correlation_id, decode_hex_source_memo, decode_source_memo};
