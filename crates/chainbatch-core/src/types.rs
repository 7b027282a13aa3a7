//! Core types for the batch engine: identifiers, amounts, batch kinds and
//! the caller-supplied request items.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Constants ────────────────────────────────────────────────────────────────

/// Length of a BLS validator public key in bytes.
pub const PUBKEY_LENGTH: usize = 48;

/// Length of a big-endian encoded `u64` amount in bytes.
pub const AMOUNT_LENGTH: usize = 8;

pub const GWEI_PER_ETH: u64 = 1_000_000_000;

/// Maximum effective balance of a compounding validator (2048 ETH), in gwei.
pub const MAX_EFFECTIVE_BALANCE_GWEI: Gwei = 2048 * GWEI_PER_ETH;

/// Every batch kind needs at least one item.
pub const MIN_BATCH_SIZE: usize = 1;

/// Upper bound on consolidation sources sharing one target.
pub const MAX_CONSOLIDATION_SOURCES: usize = 63;

/// Upper bound on switch and exit batches.
pub const MAX_BATCH_SIZE: usize = 200;

/// Fee returned by the fee meter when the endpoint's probe fails.
pub const FEE_FLOOR_WEI: u64 = 1;

// ─── Identifiers and amounts ──────────────────────────────────────────────────

/// A validated 48-byte validator public key.
pub type PubKey = FixedBytes<PUBKEY_LENGTH>;

/// An amount in gwei. Zero means "full withdrawal" for exit requests.
pub type Gwei = u64;

// ─── BatchKind ────────────────────────────────────────────────────────────────

/// The three lifecycle operations the engine can batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Move stake from source validators into one target validator.
    Consolidation,
    /// Switch a validator to compounding (0x02) withdrawal credentials.
    Switch,
    /// Full or partial exit through the withdrawal request contract.
    Exit,
}

impl BatchKind {
    pub fn min_size(self) -> usize {
        MIN_BATCH_SIZE
    }

    pub fn max_size(self) -> usize {
        match self {
            Self::Consolidation => MAX_CONSOLIDATION_SOURCES,
            Self::Switch | Self::Exit => MAX_BATCH_SIZE,
        }
    }

    /// The downstream endpoint this kind is forwarded to. Switch requests
    /// reuse the consolidation contract with source == target.
    pub fn endpoint(self) -> EndpointKind {
        match self {
            Self::Consolidation | Self::Switch => EndpointKind::Consolidation,
            Self::Exit => EndpointKind::Exit,
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consolidation => write!(f, "consolidation"),
            Self::Switch => write!(f, "switch"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// The two fixed downstream request contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// EIP-7251 consolidation request contract.
    Consolidation,
    /// EIP-7002 withdrawal request contract.
    Exit,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consolidation => write!(f, "consolidation"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

// ─── Request items ────────────────────────────────────────────────────────────

/// One consolidation source. The target is shared across the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationItem {
    pub source: Bytes,
}

impl ConsolidationItem {
    pub fn new(source: impl Into<Bytes>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A credential switch for one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchItem {
    pub pubkey: Bytes,
}

impl SwitchItem {
    pub fn new(pubkey: impl Into<Bytes>) -> Self {
        Self {
            pubkey: pubkey.into(),
        }
    }
}

/// An exit request. `amount` holds the raw big-endian gwei value as
/// received from the caller, so malformed encodings stay representable
/// until validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitItem {
    pub pubkey: Bytes,
    pub amount: Bytes,
    #[serde(default)]
    pub full_exit: bool,
}

impl ExitItem {
    /// Build an exit item from a typed gwei amount.
    pub fn new(pubkey: impl Into<Bytes>, amount: Gwei, full_exit: bool) -> Self {
        Self {
            pubkey: pubkey.into(),
            amount: Bytes::copy_from_slice(&amount.to_be_bytes()),
            full_exit,
        }
    }

    /// Build an exit item from a raw amount encoding.
    pub fn raw(pubkey: impl Into<Bytes>, amount: impl Into<Bytes>, full_exit: bool) -> Self {
        Self {
            pubkey: pubkey.into(),
            amount: amount.into(),
            full_exit,
        }
    }

    /// Decode the amount if it is exactly eight bytes long.
    pub fn amount_gwei(&self) -> Option<Gwei> {
        let bytes: [u8; AMOUNT_LENGTH] = self.amount[..].try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}

// ─── Invocation context ───────────────────────────────────────────────────────

/// Who invoked the engine and how much value they attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub invoker: Address,
    /// Attached value in wei, used to pay the per-item fees.
    pub value: U256,
}

impl CallContext {
    pub fn new(invoker: Address, value: U256) -> Self {
        Self { invoker, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_kind_limits() {
        assert_eq!(BatchKind::Consolidation.max_size(), 63);
        assert_eq!(BatchKind::Switch.max_size(), 200);
        assert_eq!(BatchKind::Exit.max_size(), 200);
        assert_eq!(BatchKind::Exit.min_size(), 1);
    }

    #[test]
    fn switch_shares_consolidation_endpoint() {
        assert_eq!(BatchKind::Switch.endpoint(), EndpointKind::Consolidation);
        assert_eq!(BatchKind::Exit.endpoint(), EndpointKind::Exit);
    }

    #[test]
    fn ceiling_is_2048_eth() {
        assert_eq!(MAX_EFFECTIVE_BALANCE_GWEI, 2_048_000_000_000);
    }

    #[test]
    fn exit_item_amount_roundtrip() {
        let item = ExitItem::new(vec![0u8; 48], 32 * GWEI_PER_ETH, false);
        assert_eq!(item.amount.len(), AMOUNT_LENGTH);
        assert_eq!(item.amount_gwei(), Some(32 * GWEI_PER_ETH));
    }

    #[test]
    fn exit_item_short_amount_is_undecodable() {
        let item = ExitItem::raw(vec![0u8; 48], vec![0u8; 4], false);
        assert_eq!(item.amount_gwei(), None);
    }
}
