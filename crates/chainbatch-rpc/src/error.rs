//! RPC error types.

use chainbatch_core::EndpointError;
use thiserror::Error;

use crate::request::JsonRpcError;

/// JSON-RPC code geth uses for `execution reverted`.
pub(crate) const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request failed (connection refused, timeout, bad status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The transaction was not mined within the polling budget.
    #[error("No receipt for {tx_hash} after {polls} polls")]
    ReceiptTimeout { tx_hash: String, polls: u32 },
}

impl RpcError {
    /// Returns `true` if the node reports an EVM revert.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc(e) => e.code == EXECUTION_REVERTED || e.message.contains("revert"),
            _ => false,
        }
    }
}

impl From<RpcError> for EndpointError {
    fn from(e: RpcError) -> Self {
        match e {
            ref rpc if rpc.is_revert() => EndpointError::Reverted(rpc.to_string()),
            RpcError::Deserialization(inner) => EndpointError::InvalidResponse(inner.to_string()),
            other => EndpointError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc(code: i64, message: &str) -> RpcError {
        RpcError::Rpc(JsonRpcError {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn reverts_map_to_reverted() {
        assert!(matches!(
            EndpointError::from(rpc(3, "execution reverted")),
            EndpointError::Reverted(_)
        ));
        assert!(matches!(
            EndpointError::from(rpc(-32000, "execution reverted: fee too low")),
            EndpointError::Reverted(_)
        ));
    }

    #[test]
    fn other_failures_map_to_transport() {
        assert!(matches!(
            EndpointError::from(rpc(-32000, "insufficient funds for gas")),
            EndpointError::Transport(_)
        ));
        assert!(matches!(
            EndpointError::from(RpcError::Http("connection refused".into())),
            EndpointError::Transport(_)
        ));
    }
}
