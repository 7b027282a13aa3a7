//! The `RequestEndpoint` trait — the seam to the downstream system contracts.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::error::EndpointError;

/// A downstream request contract (consolidation or withdrawal).
///
/// The engine awaits every call before issuing the next one, so
/// implementations never see concurrent calls from a single batch.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RequestEndpoint>`.
#[async_trait]
pub trait RequestEndpoint: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The contract address.
    fn address(&self) -> Address;

    /// Read-only fee probe: an argument-less call whose return data is the
    /// current per-request fee as a big-endian unsigned integer.
    async fn probe_fee(&self) -> Result<Bytes, EndpointError>;

    /// Value-bearing call carrying one request payload. `value` is only
    /// transferred if the call succeeds.
    async fn submit(&self, payload: Bytes, value: U256) -> Result<(), EndpointError>;
}
