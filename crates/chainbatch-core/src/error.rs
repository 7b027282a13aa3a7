//! Error types for the batch engine.

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::types::BatchKind;

/// Batch-level conditions that abort the whole invocation before any
/// downstream call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Unauthorized: invoker {invoker} is not the executing account {expected}")]
    Unauthorized { invoker: Address, expected: Address },

    #[error("{kind} batch requires at least {min} item(s), got {got}")]
    MinimumRequired {
        kind: BatchKind,
        min: usize,
        got: usize,
    },

    #[error("{kind} batch allows at most {max} items, got {got}")]
    TooMany {
        kind: BatchKind,
        max: usize,
        got: usize,
    },

    #[error("Consolidation target must be 48 bytes, got {len}")]
    InvalidTargetLength { len: usize },

    #[error("Insufficient fee: required {required} wei, supplied {supplied} wei")]
    InsufficientFee { required: U256, supplied: U256 },
}

/// Errors surfaced by a downstream request endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The endpoint executed the call and rejected it.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The call could not be delivered (network, node, signer).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with something that could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_error_messages_name_the_condition() {
        let e = BatchError::TooMany {
            kind: BatchKind::Consolidation,
            max: 63,
            got: 64,
        };
        assert_eq!(e.to_string(), "consolidation batch allows at most 63 items, got 64");

        let e = BatchError::InsufficientFee {
            required: U256::from(3u64),
            supplied: U256::from(2u64),
        };
        assert_eq!(e.to_string(), "Insufficient fee: required 3 wei, supplied 2 wei");
    }
}
