//! `RpcEndpoint` — a request contract reached through a JSON-RPC node.
//!
//! - fee probe: `eth_call { to, data: 0x }` at `latest`
//! - request: `eth_sendTransaction { from, to, value, data }`, then
//!   optionally poll `eth_getTransactionReceipt` until the receipt shows up
//!
//! Transactions are signed by the node for `from`, which must be the
//! account the engine executes under.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use chainbatch_core::{EndpointError, RequestEndpoint};

use crate::client::{call, RpcTransport};
use crate::error::{RpcError, EXECUTION_REVERTED};
use crate::request::{JsonRpcError, ReceiptStatus, TransactionRequest};

#[derive(Debug, Clone)]
pub struct RpcEndpointConfig {
    /// Wait for a receipt and treat `status == 0` as a failed request.
    /// A request the node accepted but that never shows a receipt (poll
    /// budget exhausted, receipt lookup failing) still counts as forwarded,
    /// since it can be mined later. When unset, a request counts as
    /// forwarded once the node accepts it.
    pub await_receipt: bool,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for RpcEndpointConfig {
    fn default() -> Self {
        Self {
            await_receipt: true,
            poll_interval: Duration::from_secs(2),
            max_polls: 90,
        }
    }
}

pub struct RpcEndpoint {
    name: String,
    address: Address,
    from: Address,
    transport: Arc<dyn RpcTransport>,
    config: RpcEndpointConfig,
    next_id: AtomicU64,
}

impl RpcEndpoint {
    pub fn new(
        name: impl Into<String>,
        address: Address,
        from: Address,
        transport: Arc<dyn RpcTransport>,
        config: RpcEndpointConfig,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            from,
            transport,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn rpc<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        call(self.transport.as_ref(), self.id(), method, params).await
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<(), RpcError> {
        for poll in 1..=self.config.max_polls {
            let receipt: Option<ReceiptStatus> = self
                .rpc("eth_getTransactionReceipt", vec![serde_json::to_value(tx_hash)?])
                .await?;
            match receipt {
                Some(r) if r.succeeded() => return Ok(()),
                Some(_) => {
                    return Err(RpcError::Rpc(JsonRpcError {
                        code: EXECUTION_REVERTED,
                        message: format!("transaction {tx_hash} reverted"),
                        data: None,
                    }))
                }
                None => {
                    debug!(endpoint = %self.name, %tx_hash, poll, "receipt pending");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
        Err(RpcError::ReceiptTimeout {
            tx_hash: tx_hash.to_string(),
            polls: self.config.max_polls,
        })
    }
}

#[async_trait]
impl RequestEndpoint for RpcEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Address {
        self.address
    }

    async fn probe_fee(&self) -> Result<Bytes, EndpointError> {
        let tx = TransactionRequest {
            from: None,
            to: self.address,
            value: None,
            data: Bytes::new(),
        };
        let params = vec![serde_json::to_value(&tx).map_err(RpcError::from)?, json!("latest")];
        let data: Bytes = self.rpc("eth_call", params).await?;
        Ok(data)
    }

    async fn submit(&self, payload: Bytes, value: U256) -> Result<(), EndpointError> {
        let tx = TransactionRequest {
            from: Some(self.from),
            to: self.address,
            value: Some(value),
            data: payload,
        };
        let params = vec![serde_json::to_value(&tx).map_err(RpcError::from)?];
        let tx_hash: B256 = self.rpc("eth_sendTransaction", params).await?;
        debug!(endpoint = %self.name, %tx_hash, %value, "request submitted");

        if !self.config.await_receipt {
            return Ok(());
        }
        // The transaction is out. Only a mined revert means the value stayed put.
        match self.wait_for_receipt(tx_hash).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_revert() => Err(e.into()),
            Err(e) => {
                warn!(
                    endpoint = %self.name,
                    %tx_hash,
                    %value,
                    error = %e,
                    "no receipt for broadcast request, counting it as forwarded"
                );
                Ok(())
            }
        }
    }
}
