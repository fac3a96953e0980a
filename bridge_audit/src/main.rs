use bridge_audit_common::Amount;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

mod commands;
mod config;
mod export;
mod formatting;

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Reconciliation reports for bridge transfers")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    /// Find source transfers and destination payouts that do not reconcile
    Discrepancy(DiscrepancyCommand),
    #[command(subcommand)]
    /// Accounting totals for the bridge
    Summary(SummaryCommand),
    #[command(subcommand)]
    /// Work out what the relay still owes
    Payout(PayoutCommand),
}

#[derive(Debug, Subcommand)]
pub enum DiscrepancyCommand {
    /// Write the reconciliation report to a CSV (or JSON) file
    Export {
        #[command(flatten)]
        params: ReconcileParams,
        /// Where to write the report. Prints to stdout if omitted.
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
        /// Write JSON instead of CSV
        #[arg(long = "json")]
        json: bool,
    },
    /// Print the reconciliation report as a table
    Show {
        #[command(flatten)]
        params: ReconcileParams,
    },
    /// List the hashes of source transfers that were never paid out, e.g. to ask the relay to rescan them
    Orphans {
        #[command(flatten)]
        params: ReconcileParams,
    },
}

#[derive(Debug, Subcommand)]
pub enum SummaryCommand {
    /// Print the bridge accounting summary. Clean matches are always included.
    Print {
        #[command(flatten)]
        params: ReconcileParams,
        /// JSON file of credits to the destination bridge account
        #[arg(short = 'i', long = "incoming")]
        incoming: Option<String>,
        /// Current balance of the destination bridge account, in minor units
        #[arg(long = "dest-balance", default_value = "0")]
        dest_balance: Amount,
        /// Outstanding supply of the bridged token on the source ledger, in minor units
        #[arg(long = "source-supply", default_value = "0")]
        source_supply: Amount,
    },
}

#[derive(Debug, Subcommand)]
pub enum PayoutCommand {
    /// Build the corrective multi-send that pays every under-paid account
    Plan {
        #[command(flatten)]
        params: ReconcileParams,
        /// Where to write the transfer JSON. Prints to stdout if omitted.
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
        /// The sending account. Overrides BRIDGE_AUDIT_PAYOUT_SENDER.
        #[arg(long = "sender")]
        sender: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ReconcileParams {
    /// JSON file of source-ledger transfers into the bridge
    #[arg(short = 's', long = "source")]
    source: String,
    /// JSON file of destination-ledger payouts made by the relay
    #[arg(short = 'd', long = "destination")]
    destination: String,
    /// Start of the report window (inclusive), `YYYY-MM-DD HH:MM:SS` UTC. Overrides BRIDGE_AUDIT_FROM.
    #[arg(long = "from")]
    from: Option<String>,
    /// End of the report window (exclusive), `YYYY-MM-DD HH:MM:SS` UTC. Overrides BRIDGE_AUDIT_UNTIL.
    #[arg(long = "until")]
    until: Option<String>,
    /// Report clean matches and out-of-range transfers too
    #[arg(short = 'a', long = "include-all")]
    include_all: bool,
    /// JSON fee schedule table. Overrides BRIDGE_AUDIT_FEE_SCHEDULES.
    #[arg(short = 'f', long = "fee-schedules")]
    fee_schedules: Option<String>,
}

fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let result = match cli.command {
        Command::Discrepancy(cmd) => commands::handle_discrepancy_command(cmd),
        Command::Summary(cmd) => commands::handle_summary_command(cmd),
        Command::Payout(cmd) => commands::handle_payout_command(cmd),
    };
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
