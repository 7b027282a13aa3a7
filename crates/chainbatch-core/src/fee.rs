//! Fee metering.
//!
//! The system contracts charge a dynamic per-request fee that they expose
//! through an argument-less read call. The meter turns that probe into a
//! quote, falling back to [`FEE_FLOOR_WEI`] when the probe fails, and
//! computes what a whole batch owes.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::endpoint::RequestEndpoint;
use crate::types::FEE_FLOOR_WEI;

/// How the per-item fee is derived. One engine uses one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModel {
    /// Query the endpoint's live fee; the batch owes `quote * len`.
    #[default]
    Metered,
    /// Split the supplied value evenly across items. The value must divide
    /// exactly and leave at least one wei per item.
    EqualSplit,
}

impl std::fmt::Display for FeeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metered => write!(f, "metered"),
            Self::EqualSplit => write!(f, "equal-split"),
        }
    }
}

/// Interpret probe return data as a big-endian unsigned fee.
///
/// Returns `None` for empty data or data wider than 32 bytes.
pub fn decode_fee(data: &[u8]) -> Option<U256> {
    if data.is_empty() {
        return None;
    }
    U256::try_from_be_slice(data)
}

/// Current per-request fee of `endpoint`, or the floor if the probe fails.
pub async fn quote(endpoint: &dyn RequestEndpoint) -> U256 {
    match endpoint.probe_fee().await {
        Ok(data) => match decode_fee(&data) {
            Some(fee) => fee,
            None => {
                warn!(
                    endpoint = endpoint.name(),
                    len = data.len(),
                    "undecodable fee probe response, using floor"
                );
                U256::from(FEE_FLOOR_WEI)
            }
        },
        Err(e) => {
            warn!(endpoint = endpoint.name(), error = %e, "fee probe failed, using floor");
            U256::from(FEE_FLOOR_WEI)
        }
    }
}

/// Total fee owed for `batch_size` requests at the quoted price.
pub fn required_total(quote: U256, batch_size: usize) -> U256 {
    quote.saturating_mul(U256::from(batch_size))
}

/// Per-item fee under [`FeeModel::EqualSplit`], or `None` if `supplied`
/// does not split into whole, nonzero shares.
pub fn equal_split(supplied: U256, batch_size: usize) -> Option<U256> {
    if batch_size == 0 {
        return None;
    }
    let size = U256::from(batch_size);
    if supplied < size || !(supplied % size).is_zero() {
        return None;
    }
    Some(supplied / size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEndpoint;
    use alloy_primitives::{Address, Bytes};

    #[test]
    fn decode_fee_big_endian() {
        assert_eq!(decode_fee(&[0x01, 0x00]), Some(U256::from(256u64)));
        let mut word = [0u8; 32];
        word[31] = 9;
        assert_eq!(decode_fee(&word), Some(U256::from(9u64)));
        assert_eq!(decode_fee(&[]), None);
        assert_eq!(decode_fee(&[0u8; 33]), None);
    }

    #[tokio::test]
    async fn quote_reads_probe() {
        let ep = MemoryEndpoint::new("c", Address::ZERO, U256::from(17u64));
        assert_eq!(quote(&ep).await, U256::from(17u64));
    }

    #[tokio::test]
    async fn quote_falls_back_to_floor() {
        let ep = MemoryEndpoint::new("c", Address::ZERO, U256::from(17u64));
        ep.fail_fee_probe();
        assert_eq!(quote(&ep).await, U256::from(1u64));

        ep.set_fee_response(Bytes::new());
        assert_eq!(quote(&ep).await, U256::from(1u64));
    }

    #[test]
    fn required_total_scales_with_size() {
        assert_eq!(required_total(U256::from(3u64), 4), U256::from(12u64));
        assert_eq!(required_total(U256::MAX, 2), U256::MAX);
    }

    #[test]
    fn equal_split_boundaries() {
        assert_eq!(equal_split(U256::from(9u64), 3), Some(U256::from(3u64)));
        assert_eq!(equal_split(U256::from(10u64), 3), None);
        assert_eq!(equal_split(U256::from(2u64), 3), None);
        assert_eq!(equal_split(U256::from(3u64), 3), Some(U256::from(1u64)));
        assert_eq!(equal_split(U256::ZERO, 0), None);
    }
}
