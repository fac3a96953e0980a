use std::{fmt::Display, str::FromStr};

use bridge_audit_common::Amount;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------        AuditTx        ---------------------------------------------------------
/// A ledger-agnostic view of a single bridge transfer.
///
/// On the source ledger, `target_address` is decoded from the transfer memo. On the destination ledger it is the
/// account that was credited by the relay. Records are produced by the ledger fetchers and are never mutated by the
/// reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTx {
    pub hash: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: String,
    #[serde(default)]
    pub target_address: String,
    pub amount: Amount,
    #[serde(default)]
    pub memo: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditTx {
    pub fn new<S: Into<String>>(hash: S, amount: Amount, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: hash.into(),
            from_address: String::default(),
            to_address: String::default(),
            target_address: String::default(),
            amount,
            memo: String::default(),
            timestamp,
        }
    }

    pub fn with_target<S: Into<String>>(mut self, target: S) -> Self {
        self.target_address = target.into();
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_from<S: Into<String>>(mut self, from: S) -> Self {
        self.from_address = from.into();
        self
    }

    pub fn with_to<S: Into<String>>(mut self, to: S) -> Self {
        self.to_address = to.into();
        self
    }
}

//--------------------------------------   CorrelationId       ---------------------------------------------------------
/// The normalised (upper-case, no `0x` prefix) source-ledger transaction hash used to pair the two sides of a
/// transfer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.replace("0x", "").to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   DiscrepancyKind     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscrepancyKind {
    /// The destination memo does not have the `<chain index>:<source hash>:<sequence>` shape.
    InvalidMemoOnDest,
    /// Another destination transfer already claimed the same source hash.
    DuplicatedCorrelationIdOnDest,
    /// The source transfer was never paid out on the destination ledger.
    OrphanSource,
    /// The destination transfer refers to a source transfer that does not exist.
    OrphanDest,
    /// The relay credited a different account from the one named in the source memo.
    MismatchedTargetAddress,
    /// The credited amount differs from the source amount net of fees.
    AmountMismatch,
    /// Both sides reconcile.
    CleanMatch,
    /// The source amount was outside the eligible range of its fee schedule, so the relay was not expected to act.
    AmountOutOfRange,
}

impl DiscrepancyKind {
    pub const ALL: [DiscrepancyKind; 8] = [
        DiscrepancyKind::InvalidMemoOnDest,
        DiscrepancyKind::DuplicatedCorrelationIdOnDest,
        DiscrepancyKind::OrphanSource,
        DiscrepancyKind::OrphanDest,
        DiscrepancyKind::MismatchedTargetAddress,
        DiscrepancyKind::AmountMismatch,
        DiscrepancyKind::CleanMatch,
        DiscrepancyKind::AmountOutOfRange,
    ];

    /// The label used in exported reports. A clean match has an empty label.
    pub fn label(&self) -> &'static str {
        match self {
            DiscrepancyKind::InvalidMemoOnDest => "invalid memo on destination",
            DiscrepancyKind::DuplicatedCorrelationIdOnDest => "duplicated correlation id in memo on destination",
            DiscrepancyKind::OrphanSource => "orphan source tx",
            DiscrepancyKind::OrphanDest => "orphan destination tx",
            DiscrepancyKind::MismatchedTargetAddress => "different target addresses on source and destination",
            DiscrepancyKind::AmountMismatch => "different amount on source and destination",
            DiscrepancyKind::CleanMatch => "",
            DiscrepancyKind::AmountOutOfRange => "not a discrepancy: amount out of range",
        }
    }

    /// `false` for clean matches and informational records.
    pub fn is_discrepancy(&self) -> bool {
        !matches!(self, DiscrepancyKind::CleanMatch | DiscrepancyKind::AmountOutOfRange)
    }
}

impl Display for DiscrepancyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid discrepancy kind: {0}")]
pub struct ConversionError(String);

impl FromStr for DiscrepancyKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().find(|k| k.label() == s).copied().ok_or_else(|| ConversionError(s.to_string()))
    }
}

//--------------------------------------    TxDiscrepancy      ---------------------------------------------------------
/// One classification decision of the reconciler: the (optional) transfers on either ledger and the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDiscrepancy {
    pub source: Option<AuditTx>,
    pub destination: Option<AuditTx>,
    pub expected_amount: Option<Amount>,
    #[serde(with = "duration_seconds")]
    pub bridging_time: Duration,
    pub kind: DiscrepancyKind,
}

impl TxDiscrepancy {
    pub fn new(
        source: Option<AuditTx>,
        destination: Option<AuditTx>,
        kind: DiscrepancyKind,
        expected_amount: Option<Amount>,
    ) -> Self {
        let bridging_time = match (&source, &destination) {
            (Some(s), Some(d)) => d.timestamp - s.timestamp,
            _ => Duration::zero(),
        };
        Self { source, destination, expected_amount, bridging_time, kind }
    }

    pub fn source_only(tx: AuditTx, kind: DiscrepancyKind) -> Self {
        Self::new(Some(tx), None, kind, None)
    }

    pub fn destination_only(tx: AuditTx, kind: DiscrepancyKind) -> Self {
        Self::new(None, Some(tx), kind, None)
    }

    /// The timestamp used for ordering and window filtering: the source side's, or the destination side's when there
    /// is no source transfer.
    pub fn sort_timestamp(&self) -> Option<DateTime<Utc>> {
        self.source.as_ref().or(self.destination.as_ref()).map(|tx| tx.timestamp)
    }

    pub fn source_amount(&self) -> Amount {
        self.source.as_ref().map(|tx| tx.amount.clone()).unwrap_or_default()
    }

    pub fn destination_amount(&self) -> Amount {
        self.destination.as_ref().map(|tx| tx.amount.clone()).unwrap_or_default()
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(d)?;
        Ok(Duration::seconds(secs))
    }
}
