use std::env;

use anyhow::{Context, Result};
use bridge_audit_common::helpers::parse_boolean_flag;
use bridge_audit_engine::fees::{default_fee_schedules, load_fee_schedules, FeeSchedule};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::*;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DEFAULT_FROM: &str = "2023-03-01 00:00:00";
const DEFAULT_BRIDGE_CHAIN_INDEX: &str = "1007961752909";
const DEFAULT_DENOM: &str = "ucore";

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    /// Report clean matches and out-of-range transfers as well as discrepancies.
    pub include_all: bool,
    /// A JSON fee schedule table. When absent, the built-in fee history is used.
    pub fee_schedules_path: Option<String>,
    /// The chain index that source memos must name for a transfer to count as a bridge transfer.
    pub bridge_chain_index: String,
    /// Only credits from this destination account count as bridge income. Empty means every credit counts.
    pub funding_account: String,
    pub payout_sender: String,
    pub denom: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            from: parse_timestamp(DEFAULT_FROM).unwrap_or_default(),
            until: Utc::now(),
            include_all: false,
            fee_schedules_path: None,
            bridge_chain_index: DEFAULT_BRIDGE_CHAIN_INDEX.to_string(),
            funding_account: String::default(),
            payout_sender: String::default(),
            denom: DEFAULT_DENOM.to_string(),
        }
    }
}

impl AuditConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let from = timestamp_from_env("BRIDGE_AUDIT_FROM", defaults.from);
        let until = timestamp_from_env("BRIDGE_AUDIT_UNTIL", defaults.until);
        let include_all = parse_boolean_flag(env::var("BRIDGE_AUDIT_INCLUDE_ALL").ok(), false);
        let fee_schedules_path = env::var("BRIDGE_AUDIT_FEE_SCHEDULES").ok().filter(|s| !s.is_empty());
        let bridge_chain_index =
            env::var("BRIDGE_AUDIT_BRIDGE_CHAIN_INDEX").ok().unwrap_or(defaults.bridge_chain_index);
        let funding_account = env::var("BRIDGE_AUDIT_FUNDING_ACCOUNT").ok().unwrap_or_else(|| {
            info!("🪛️ BRIDGE_AUDIT_FUNDING_ACCOUNT is not set. All bridge account credits count as income.");
            String::default()
        });
        let payout_sender = env::var("BRIDGE_AUDIT_PAYOUT_SENDER").ok().unwrap_or_default();
        let denom = env::var("BRIDGE_AUDIT_DENOM").ok().unwrap_or(defaults.denom);
        Self { from, until, include_all, fee_schedules_path, bridge_chain_index, funding_account, payout_sender, denom }
    }

    pub fn fee_schedules(&self) -> Result<Vec<FeeSchedule>> {
        match &self.fee_schedules_path {
            Some(path) => {
                let schedules = load_fee_schedules(path).with_context(|| format!("loading fee schedules from {path}"))?;
                info!("💸️ Loaded {} fee schedules from {path}", schedules.len());
                Ok(schedules)
            },
            None => Ok(default_fee_schedules()),
        }
    }
}

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp, interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(|t| t.and_utc())
}

fn timestamp_from_env(var: &str, default: DateTime<Utc>) -> DateTime<Utc> {
    env::var(var)
        .map(|s| {
            parse_timestamp(&s).unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid timestamp for {var}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .unwrap_or(default)
}
