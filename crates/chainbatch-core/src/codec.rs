//! Request payload encoding.
//!
//! The system contracts take packed calldata with no selector, length
//! prefix or padding:
//!
//! | kind          | layout                                   | bytes |
//! |---------------|------------------------------------------|-------|
//! | consolidation | `source(48) ‖ target(48)`                | 96    |
//! | switch        | `pubkey(48) ‖ pubkey(48)`                | 96    |
//! | exit          | `pubkey(48) ‖ amount(8, big-endian)`     | 56    |
//!
//! Encoding only takes validated types, so the layout lengths hold by
//! construction.

use alloy_primitives::Bytes;

use crate::types::{Gwei, PubKey, AMOUNT_LENGTH, PUBKEY_LENGTH};
use crate::validator::{ValidConsolidation, ValidExit, ValidSwitch};

pub const CONSOLIDATION_PAYLOAD_LENGTH: usize = PUBKEY_LENGTH * 2;
pub const EXIT_PAYLOAD_LENGTH: usize = PUBKEY_LENGTH + AMOUNT_LENGTH;

pub fn encode_consolidation(source: &PubKey, target: &PubKey) -> Bytes {
    let mut out = Vec::with_capacity(CONSOLIDATION_PAYLOAD_LENGTH);
    out.extend_from_slice(source.as_slice());
    out.extend_from_slice(target.as_slice());
    out.into()
}

pub fn encode_exit(pubkey: &PubKey, amount: Gwei) -> Bytes {
    let mut out = Vec::with_capacity(EXIT_PAYLOAD_LENGTH);
    out.extend_from_slice(pubkey.as_slice());
    out.extend_from_slice(&amount.to_be_bytes());
    out.into()
}

impl ValidConsolidation {
    pub fn encode(&self, target: &PubKey) -> Bytes {
        encode_consolidation(&self.source, target)
    }
}

impl ValidSwitch {
    /// A switch is a consolidation of a validator into itself.
    pub fn encode(&self) -> Bytes {
        encode_consolidation(&self.pubkey, &self.pubkey)
    }
}

impl ValidExit {
    pub fn encode(&self) -> Bytes {
        encode_exit(&self.pubkey, self.amount)
    }
}
