use anyhow::{anyhow, Context, Result};
use bridge_audit_engine::{
    audit_types::{AuditTx, TxDiscrepancy},
    build_summary,
    orphan_source_hashes,
    payout::plan_payout,
    sources::{resolve_source_targets, sent_from, JsonFileSource},
    traits::TransactionSource,
    Reconciler,
    ReportWindow,
};
use log::*;

use crate::{
    config::{parse_timestamp, AuditConfig},
    export,
    formatting,
    DiscrepancyCommand,
    PayoutCommand,
    ReconcileParams,
    SummaryCommand,
};

pub fn handle_discrepancy_command(command: DiscrepancyCommand) -> Result<()> {
    use DiscrepancyCommand::*;
    match command {
        Export { params, output, json } => {
            let records = reconcile(&params, None)?;
            let report = if json { export::to_json(&records)? } else { export::to_csv(&records)? };
            write_output(output.as_deref(), &report)
        },
        Show { params } => {
            let records = reconcile(&params, None)?;
            println!("{}", formatting::format_discrepancies(&records));
            Ok(())
        },
        Orphans { params } => {
            let records = reconcile(&params, None)?;
            println!("{}", formatting::format_orphans(&orphan_source_hashes(&records)));
            Ok(())
        },
    }
}

pub fn handle_summary_command(command: SummaryCommand) -> Result<()> {
    let SummaryCommand::Print { params, incoming, dest_balance, source_supply } = command;
    let records = reconcile(&params, Some(true))?;
    let config = configure(&params)?;
    let incoming = match incoming {
        Some(path) => fetch(&JsonFileSource::new(path))?,
        None => Vec::new(),
    };
    let incoming = sent_from(incoming, &config.funding_account);
    let summary = build_summary(&records, &incoming, dest_balance, source_supply);
    print!("{}", formatting::format_summary(&summary)?);
    Ok(())
}

pub fn handle_payout_command(command: PayoutCommand) -> Result<()> {
    let PayoutCommand::Plan { params, output, sender } = command;
    let config = configure(&params)?;
    let sender = sender.unwrap_or_else(|| config.payout_sender.clone());
    if sender.is_empty() {
        return Err(anyhow!("No payout sender. Use --sender or set BRIDGE_AUDIT_PAYOUT_SENDER."));
    }
    let (source, destination) = load_transfers(&params, &config)?;
    let plan = plan_payout(&source, &destination, &config.fee_schedules()?, &sender, &config.denom)?;
    print!("{}", formatting::format_payout_plan(&plan)?);
    if !plan.is_empty() {
        write_output(output.as_deref(), &plan.to_json()?)?;
    }
    Ok(())
}

/// Environment configuration with the command-line overrides applied.
fn configure(params: &ReconcileParams) -> Result<AuditConfig> {
    let mut config = AuditConfig::from_env_or_default();
    if let Some(from) = &params.from {
        config.from = parse_timestamp(from).with_context(|| format!("'{from}' is not a valid --from timestamp"))?;
    }
    if let Some(until) = &params.until {
        config.until = parse_timestamp(until).with_context(|| format!("'{until}' is not a valid --until timestamp"))?;
    }
    config.include_all |= params.include_all;
    if params.fee_schedules.is_some() {
        config.fee_schedules_path = params.fee_schedules.clone();
    }
    Ok(config)
}

fn fetch<S: TransactionSource>(source: &S) -> Result<Vec<AuditTx>> {
    let txs = source.fetch_transactions()?;
    info!("📂️ Fetched {} transactions from {}", txs.len(), source.describe());
    Ok(txs)
}

fn load_transfers(params: &ReconcileParams, config: &AuditConfig) -> Result<(Vec<AuditTx>, Vec<AuditTx>)> {
    let source = fetch(&JsonFileSource::new(&params.source))?;
    let source = resolve_source_targets(source, &config.bridge_chain_index);
    let destination = fetch(&JsonFileSource::new(&params.destination))?;
    Ok((source, destination))
}

/// Run the reconciler. `include_all` overrides the configured setting when given.
fn reconcile(params: &ReconcileParams, include_all: Option<bool>) -> Result<Vec<TxDiscrepancy>> {
    let config = configure(params)?;
    let (source, destination) = load_transfers(params, &config)?;
    let window = ReportWindow::new(config.from, config.until)?;
    let reconciler =
        Reconciler::new(config.fee_schedules()?, window).include_all(include_all.unwrap_or(config.include_all));
    Ok(reconciler.run(&source, &destination)?)
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("writing {path}"))?;
            info!("📂️ Wrote {path}");
            println!("Wrote {path}");
        },
        None => println!("{content}"),
    }
    Ok(())
}
