//! The dispatch loop: validate, encode and forward each item in order.
//!
//! Failures are data. A bad item or a rejected call becomes a
//! [`Outcome::Failed`] record and the loop moves on; nothing here returns
//! early. Calls are awaited one at a time so outcomes line up with input
//! order and the endpoint sees requests in that same order.

use alloy_primitives::{hex, Bytes, U256};
use tracing::{debug, warn};

use crate::endpoint::RequestEndpoint;
use crate::outcome::{FailureReason, FailureRecord, Outcome};
use crate::types::{ConsolidationItem, ExitItem, PubKey, SwitchItem};
use crate::validator;

/// An item the dispatcher knows how to validate, encode and describe.
pub trait Dispatchable {
    /// Batch-wide data shared by every item (the consolidation target).
    type Context;

    /// Validate the item and encode its endpoint payload.
    fn payload(&self, ctx: &Self::Context) -> Result<Bytes, FailureReason>;

    /// Describe this item in a failure record.
    fn failure(&self, index: usize, reason: FailureReason, ctx: &Self::Context) -> FailureRecord;
}

impl Dispatchable for ConsolidationItem {
    type Context = PubKey;

    fn payload(&self, target: &PubKey) -> Result<Bytes, FailureReason> {
        Ok(validator::validate_consolidation(self)?.encode(target))
    }

    fn failure(&self, index: usize, reason: FailureReason, target: &PubKey) -> FailureRecord {
        FailureRecord {
            index,
            reason,
            pubkey: self.source.clone(),
            amount: None,
            raw_amount: None,
            target: Some(Bytes::copy_from_slice(target.as_slice())),
        }
    }
}

impl Dispatchable for SwitchItem {
    type Context = ();

    fn payload(&self, _: &()) -> Result<Bytes, FailureReason> {
        Ok(validator::validate_switch(self)?.encode())
    }

    fn failure(&self, index: usize, reason: FailureReason, _: &()) -> FailureRecord {
        FailureRecord {
            index,
            reason,
            pubkey: self.pubkey.clone(),
            amount: None,
            raw_amount: None,
            target: None,
        }
    }
}

impl Dispatchable for ExitItem {
    type Context = ();

    fn payload(&self, _: &()) -> Result<Bytes, FailureReason> {
        Ok(validator::validate_exit(self)?.encode())
    }

    fn failure(&self, index: usize, reason: FailureReason, _: &()) -> FailureRecord {
        let amount = self.amount_gwei();
        FailureRecord {
            index,
            reason,
            pubkey: self.pubkey.clone(),
            amount,
            raw_amount: amount.is_none().then(|| self.amount.clone()),
            target: None,
        }
    }
}

/// Forwards admitted items to one endpoint at a fixed per-item fee.
pub struct Dispatcher<'a> {
    endpoint: &'a dyn RequestEndpoint,
    per_item_fee: U256,
}

impl<'a> Dispatcher<'a> {
    pub fn new(endpoint: &'a dyn RequestEndpoint, per_item_fee: U256) -> Self {
        Self {
            endpoint,
            per_item_fee,
        }
    }

    /// Process every item and return one outcome per item, in input order.
    pub async fn run<T: Dispatchable>(&self, items: &[T], ctx: &T::Context) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let outcome = self.dispatch_one(index, item, ctx).await;
            if let Outcome::Failed(record) = &outcome {
                emit_failure(record);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn dispatch_one<T: Dispatchable>(
        &self,
        index: usize,
        item: &T,
        ctx: &T::Context,
    ) -> Outcome {
        let payload = match item.payload(ctx) {
            Ok(payload) => payload,
            Err(reason) => return Outcome::Failed(item.failure(index, reason, ctx)),
        };

        match self.endpoint.submit(payload, self.per_item_fee).await {
            Ok(()) => {
                debug!(
                    index,
                    endpoint = self.endpoint.name(),
                    fee = %self.per_item_fee,
                    "request forwarded"
                );
                Outcome::Forwarded {
                    index,
                    fee: self.per_item_fee,
                }
            }
            Err(e) => {
                debug!(index, endpoint = self.endpoint.name(), error = %e, "downstream call failed");
                Outcome::Failed(item.failure(index, FailureReason::OperationFailed, ctx))
            }
        }
    }
}

fn emit_failure(record: &FailureRecord) {
    warn!(
        index = record.index,
        reason = record.reason.code(),
        pubkey = %hex::encode_prefixed(&record.pubkey),
        amount = ?record.amount,
        raw_amount = ?record.raw_amount.as_ref().map(hex::encode_prefixed),
        target = ?record.target.as_ref().map(hex::encode_prefixed),
        "request failed"
    );
}
