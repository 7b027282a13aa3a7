//! In-memory `RequestEndpoint` implementation.
//!
//! Suitable for testing and CLI dry runs. Thread-safe via `Arc<Mutex<Inner>>`.
//! Accepted requests are recorded together with the value they carried, so
//! callers can check exactly what reached the endpoint.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::endpoint::RequestEndpoint;
use crate::error::EndpointError;

/// A request accepted by a [`MemoryEndpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub payload: Bytes,
    pub value: U256,
}

struct Inner {
    fee_response: Result<Bytes, EndpointError>,
    rejected: HashSet<Bytes>,
    min_value: U256,
    accepted: Vec<RecordedRequest>,
    balance: U256,
    attempts: usize,
}

/// Thread-safe in-memory request contract.
#[derive(Clone)]
pub struct MemoryEndpoint {
    name: String,
    address: Address,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEndpoint {
    /// Create an endpoint whose fee probe answers `fee` as a 32-byte word.
    pub fn new(name: impl Into<String>, address: Address, fee: U256) -> Self {
        Self {
            name: name.into(),
            address,
            inner: Arc::new(Mutex::new(Inner {
                fee_response: Ok(Bytes::copy_from_slice(&fee.to_be_bytes::<32>())),
                rejected: HashSet::new(),
                min_value: U256::ZERO,
                accepted: Vec::new(),
                balance: U256::ZERO,
                attempts: 0,
            })),
        }
    }

    /// Answer the fee probe with a fixed 32-byte fee.
    pub fn set_fee(&self, fee: U256) {
        self.inner.lock().unwrap().fee_response =
            Ok(Bytes::copy_from_slice(&fee.to_be_bytes::<32>()));
    }

    /// Answer the fee probe with arbitrary return data.
    pub fn set_fee_response(&self, data: Bytes) {
        self.inner.lock().unwrap().fee_response = Ok(data);
    }

    /// Make the fee probe fail.
    pub fn fail_fee_probe(&self) {
        self.inner.lock().unwrap().fee_response =
            Err(EndpointError::Reverted("fee probe unavailable".into()));
    }

    /// Revert any future call carrying exactly this payload.
    pub fn reject_payload(&self, payload: impl Into<Bytes>) {
        self.inner.lock().unwrap().rejected.insert(payload.into());
    }

    /// Revert calls whose attached value is below `min`, the way the system
    /// contracts reject underpaid requests.
    pub fn require_min_value(&self, min: U256) {
        self.inner.lock().unwrap().min_value = min;
    }

    /// Requests accepted so far, in arrival order.
    pub fn accepted(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().accepted.clone()
    }

    /// Total value received from accepted requests.
    pub fn balance(&self) -> U256 {
        self.inner.lock().unwrap().balance
    }

    /// Number of `submit` calls, accepted or not.
    pub fn attempts(&self) -> usize {
        self.inner.lock().unwrap().attempts
    }
}

#[async_trait]
impl RequestEndpoint for MemoryEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Address {
        self.address
    }

    async fn probe_fee(&self) -> Result<Bytes, EndpointError> {
        self.inner.lock().unwrap().fee_response.clone()
    }

    async fn submit(&self, payload: Bytes, value: U256) -> Result<(), EndpointError> {
        let mut inner = self.inner.lock().unwrap();
        inner.attempts += 1;

        if inner.rejected.contains(&payload) {
            return Err(EndpointError::Reverted("request rejected".into()));
        }
        if value < inner.min_value {
            return Err(EndpointError::Reverted(format!(
                "fee too low: {value} < {}",
                inner.min_value
            )));
        }

        inner.balance = inner.balance.saturating_add(value);
        inner.accepted.push(RecordedRequest { payload, value });
        Ok(())
    }
}
