use std::fmt::Write;

use anyhow::Result;
use bridge_audit_common::{Amount, REPORT_DECIMALS};
use bridge_audit_engine::{
    audit_types::{AuditTx, TxDiscrepancy},
    payout::PayoutPlan,
    Summary,
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

fn decimal(amount: &Amount) -> String {
    amount.to_decimal_string(REPORT_DECIMALS)
}

fn side(tx: Option<&AuditTx>) -> (String, String, String, String) {
    tx.map(|t| (t.hash.clone(), t.target_address.clone(), decimal(&t.amount), t.timestamp.to_string()))
        .unwrap_or_default()
}

pub fn format_discrepancies(records: &[TxDiscrepancy]) -> String {
    if records.is_empty() {
        return "No discrepancies".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row![
        "Source tx",
        "Target",
        "Sent",
        "Sent at",
        "Destination tx",
        "Credited to",
        "Credited",
        "Expected",
        "Bridging time",
        "Discrepancy"
    ]);
    records.iter().for_each(|r| {
        let (src_hash, src_target, src_amount, src_time) = side(r.source.as_ref());
        let (dst_hash, dst_target, dst_amount, _) = side(r.destination.as_ref());
        table.add_row(row![
            src_hash,
            src_target,
            src_amount,
            src_time,
            dst_hash,
            dst_target,
            dst_amount,
            r.expected_amount.as_ref().map(decimal).unwrap_or_default(),
            format!("{}s", r.bridging_time.num_seconds()),
            r.kind.label()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_orphans(hashes: &[String]) -> String {
    if hashes.is_empty() {
        return "No orphan source transactions".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["#", "Source tx"]);
    hashes.iter().enumerate().for_each(|(i, hash)| {
        table.add_row(row![i + 1, hash]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_summary(summary: &Summary) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "===============================================================================")?;
    writeln!(f, "{summary}")?;
    writeln!(f, "===============================================================================")?;
    Ok(f)
}

pub fn format_payout_plan(plan: &PayoutPlan) -> Result<String> {
    let mut f = String::new();
    if plan.is_empty() {
        writeln!(f, "Nothing to pay out")?;
        return Ok(f);
    }
    for line in plan.balance_lines() {
        writeln!(f, "{line}")?;
    }
    writeln!(f, "Total: {} ({} accounts)", plan.total(), plan.outputs.len())?;
    Ok(f)
}
