//! Batch-level admission checks.
//!
//! Run once per invocation before any downstream call. The first failing
//! check is reported, and a failure means nothing at all happened: no item
//! is validated, no value moves, no failure record is emitted.

use alloy_primitives::{Address, U256};
use tracing::warn;

use crate::endpoint::RequestEndpoint;
use crate::error::BatchError;
use crate::fee::{self, FeeModel};
use crate::types::{BatchKind, CallContext, PubKey};

/// What a batch that passed the guard is allowed to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Value attached to each downstream call.
    pub per_item_fee: U256,
    /// Parsed consolidation target, for consolidation batches.
    pub target: Option<PubKey>,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchGuard {
    /// Identity the engine executes under. Only it may invoke the engine.
    account: Address,
    fee_model: FeeModel,
}

impl BatchGuard {
    pub fn new(account: Address, fee_model: FeeModel) -> Self {
        Self { account, fee_model }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn fee_model(&self) -> FeeModel {
        self.fee_model
    }

    /// Check, in order: caller identity, minimum size, maximum size,
    /// consolidation target length, fee sufficiency.
    ///
    /// The fee probe is only issued once every cheaper check has passed.
    pub async fn check(
        &self,
        kind: BatchKind,
        len: usize,
        target: Option<&[u8]>,
        ctx: &CallContext,
        endpoint: &dyn RequestEndpoint,
    ) -> Result<Admission, BatchError> {
        let result = self.check_inner(kind, len, target, ctx, endpoint).await;
        if let Err(e) = &result {
            warn!(%kind, len, invoker = %ctx.invoker, error = %e, "batch rejected");
        }
        result
    }

    async fn check_inner(
        &self,
        kind: BatchKind,
        len: usize,
        target: Option<&[u8]>,
        ctx: &CallContext,
        endpoint: &dyn RequestEndpoint,
    ) -> Result<Admission, BatchError> {
        authorize(ctx.invoker, self.account)?;
        check_size(kind, len)?;

        let target = match target {
            Some(raw) => Some(
                PubKey::try_from(raw)
                    .map_err(|_| BatchError::InvalidTargetLength { len: raw.len() })?,
            ),
            None => None,
        };

        let per_item_fee = match self.fee_model {
            FeeModel::Metered => {
                let quote = fee::quote(endpoint).await;
                let required = fee::required_total(quote, len);
                if ctx.value < required {
                    return Err(BatchError::InsufficientFee {
                        required,
                        supplied: ctx.value,
                    });
                }
                quote
            }
            FeeModel::EqualSplit => fee::equal_split(ctx.value, len).ok_or(
                BatchError::InsufficientFee {
                    required: U256::from(len),
                    supplied: ctx.value,
                },
            )?,
        };

        Ok(Admission {
            per_item_fee,
            target,
        })
    }
}

/// Only the executing account may invoke the engine.
pub fn authorize(invoker: Address, account: Address) -> Result<(), BatchError> {
    if invoker != account {
        return Err(BatchError::Unauthorized {
            invoker,
            expected: account,
        });
    }
    Ok(())
}

/// Enforce the per-kind size bounds.
pub fn check_size(kind: BatchKind, len: usize) -> Result<(), BatchError> {
    if len < kind.min_size() {
        return Err(BatchError::MinimumRequired {
            kind,
            min: kind.min_size(),
            got: len,
        });
    }
    if len > kind.max_size() {
        return Err(BatchError::TooMany {
            kind,
            max: kind.max_size(),
            got: len,
        });
    }
    Ok(())
}
