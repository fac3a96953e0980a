//! CSV and JSON renditions of a reconciliation report.
use std::io::Write;

use anyhow::Result;
use bridge_audit_engine::audit_types::{AuditTx, TxDiscrepancy};
use chrono::SecondsFormat;
use prettytable::csv::Writer;

const SIDE_COLUMNS: [&str; 5] = ["hash", "amount", "target_address", "memo", "timestamp"];

pub fn csv_header() -> Vec<String> {
    ["source", "destination"]
        .iter()
        .flat_map(|prefix| SIDE_COLUMNS.iter().map(move |c| format!("{prefix}_{c}")))
        .chain(["expected_amount", "bridging_time", "discrepancy"].into_iter().map(String::from))
        .collect()
}

fn side_fields(tx: Option<&AuditTx>) -> Vec<String> {
    match tx {
        Some(tx) => vec![
            tx.hash.clone(),
            tx.amount.to_string(),
            tx.target_address.clone(),
            tx.memo.clone(),
            tx.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ],
        None => vec![String::default(); SIDE_COLUMNS.len()],
    }
}

pub fn csv_record(record: &TxDiscrepancy) -> Vec<String> {
    let mut fields = side_fields(record.source.as_ref());
    fields.extend(side_fields(record.destination.as_ref()));
    fields.push(record.expected_amount.as_ref().map(|a| a.to_string()).unwrap_or_default());
    fields.push(record.bridging_time.num_seconds().to_string());
    fields.push(record.kind.label().to_string());
    fields
}

/// Writes a header row, then one row per record.
pub fn write_csv<W: Write>(records: &[TxDiscrepancy], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(csv_header())?;
    for record in records {
        writer.write_record(csv_record(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv(records: &[TxDiscrepancy]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

pub fn to_json(records: &[TxDiscrepancy]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
