//! Per-item outcomes and the batch report returned to callers.

use alloy_primitives::{hex, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{BatchKind, Gwei};

// ─── FailureReason ────────────────────────────────────────────────────────────

/// Why a single item was not forwarded. Item failures never abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A public key was not exactly 48 bytes.
    InvalidPubkeyLength,
    /// An exit amount was not exactly 8 bytes.
    InvalidAmountLength,
    /// The downstream endpoint rejected or failed the call.
    OperationFailed,
    /// Amount zero (full exit) without the confirmation flag set.
    FullExitNotConfirmed,
    /// Partial exit amount above the maximum effective balance.
    AmountExceedsMaximum,
    /// Full-exit confirmation paired with a nonzero amount.
    FullExitWithAmount,
}

impl FailureReason {
    /// Stable machine-readable reason code.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidPubkeyLength => "invalid_pubkey_length",
            Self::InvalidAmountLength => "invalid_amount_length",
            Self::OperationFailed => "operation_failed",
            Self::FullExitNotConfirmed => "full_exit_not_confirmed",
            Self::AmountExceedsMaximum => "amount_exceeds_maximum",
            Self::FullExitWithAmount => "full_exit_with_amount",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ─── FailureRecord ────────────────────────────────────────────────────────────

/// Structured record emitted for every failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Position of the item in the input batch.
    pub index: usize,
    pub reason: FailureReason,
    /// The offending public key, as supplied.
    pub pubkey: Bytes,
    /// Exit amount, when the item carried a decodable one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Gwei>,
    /// Exit amount bytes as supplied, when they are not a valid 8-byte amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_amount: Option<Bytes>,
    /// Consolidation target, for consolidation items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Bytes>,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item {}: {} (pubkey {})",
            self.index,
            self.reason,
            hex::encode_prefixed(&self.pubkey)
        )?;
        if let Some(amount) = self.amount {
            write!(f, ", amount {amount} gwei")?;
        }
        if let Some(raw) = &self.raw_amount {
            write!(f, ", amount bytes {}", hex::encode_prefixed(raw))?;
        }
        if let Some(target) = &self.target {
            write!(f, ", target {}", hex::encode_prefixed(target))?;
        }
        Ok(())
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// The result of processing one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The item was accepted by the downstream endpoint and `fee` was paid.
    Forwarded { index: usize, fee: U256 },
    /// The item was skipped or rejected. No fee was spent on it.
    Failed(FailureRecord),
}

impl Outcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Forwarded { index, .. } => *index,
            Self::Failed(record) => record.index,
        }
    }

    pub fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded { .. })
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match self {
            Self::Failed(record) => Some(record),
            Self::Forwarded { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        self.failure().map(|r| r.reason)
    }
}

// ─── BatchReport ──────────────────────────────────────────────────────────────

/// Everything one invocation produced. Passing the batch guard only means
/// the batch was processed; inspect the outcomes for the real success count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub kind: BatchKind,
    /// Fee attached to each downstream call.
    pub per_item_fee: U256,
    /// Value supplied by the invoker.
    pub supplied: U256,
    /// One outcome per input item, in input order.
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn forwarded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_forwarded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.forwarded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outcomes.iter().filter_map(Outcome::failure)
    }

    /// Value actually transferred to downstream endpoints.
    pub fn spent(&self) -> U256 {
        self.outcomes
            .iter()
            .map(|o| match o {
                Outcome::Forwarded { fee, .. } => *fee,
                Outcome::Failed(_) => U256::ZERO,
            })
            .fold(U256::ZERO, |acc, fee| acc.saturating_add(fee))
    }

    /// Supplied value that was never transferred. It stays with the
    /// executing account; the engine does not sweep it back.
    pub fn unspent(&self) -> U256 {
        self.supplied.saturating_sub(self.spent())
    }

    /// `true` when every item was forwarded.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batch: {} forwarded, {} failed (fee {} wei/item, spent {} of {} wei)",
            self.kind,
            self.forwarded(),
            self.failed(),
            self.per_item_fee,
            self.spent(),
            self.supplied
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(index: usize, reason: FailureReason) -> Outcome {
        Outcome::Failed(FailureRecord {
            index,
            reason,
            pubkey: Bytes::from(vec![0xaa; 47]),
            amount: None,
            raw_amount: None,
            target: None,
        })
    }

    fn report() -> BatchReport {
        BatchReport {
            kind: BatchKind::Exit,
            per_item_fee: U256::from(7u64),
            supplied: U256::from(30u64),
            outcomes: vec![
                Outcome::Forwarded { index: 0, fee: U256::from(7u64) },
                failed(1, FailureReason::InvalidPubkeyLength),
                Outcome::Forwarded { index: 2, fee: U256::from(7u64) },
            ],
        }
    }

    #[test]
    fn accounting_counts_only_forwarded_items() {
        let r = report();
        assert_eq!(r.forwarded(), 2);
        assert_eq!(r.failed(), 1);
        assert_eq!(r.spent(), U256::from(14u64));
        assert_eq!(r.unspent(), U256::from(16u64));
        assert!(!r.is_complete());
    }

    #[test]
    fn reason_codes_are_snake_case() {
        assert_eq!(FailureReason::FullExitNotConfirmed.to_string(), "full_exit_not_confirmed");
        let json = serde_json::to_string(&FailureReason::OperationFailed).unwrap();
        assert_eq!(json, "\"operation_failed\"");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(failed(3, FailureReason::AmountExceedsMaximum)).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "amount_exceeds_maximum");
        assert_eq!(json["index"], 3);
        assert!(json.get("target").is_none());
    }

    #[test]
    fn undecodable_amount_is_kept_as_bytes() {
        let record = FailureRecord {
            index: 2,
            reason: FailureReason::InvalidAmountLength,
            pubkey: Bytes::from(vec![0x01]),
            amount: None,
            raw_amount: Some(Bytes::from(vec![0x00, 0x05])),
            target: None,
        };
        assert_eq!(
            record.to_string(),
            "item 2: invalid_amount_length (pubkey 0x01), amount bytes 0x0005"
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["raw_amount"], "0x0005");
        assert!(json.get("amount").is_none());
    }

    #[test]
    fn failure_record_display() {
        let record = FailureRecord {
            index: 4,
            reason: FailureReason::FullExitWithAmount,
            pubkey: Bytes::from(vec![0x01, 0x02]),
            amount: Some(5),
            raw_amount: None,
            target: None,
        };
        assert_eq!(
            record.to_string(),
            "item 4: full_exit_with_amount (pubkey 0x0102), amount 5 gwei"
        );
    }
}
