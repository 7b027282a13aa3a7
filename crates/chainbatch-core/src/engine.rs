//! `BatchEngine` — the three batch entry points.
//!
//! Each entry point runs the [`BatchGuard`] once and, if it passes, hands
//! the items to a [`Dispatcher`] bound to the right endpoint. The engine
//! keeps no state between invocations.

use alloy_primitives::U256;
use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::dispatcher::{Dispatchable, Dispatcher};
use crate::endpoint::RequestEndpoint;
use crate::error::BatchError;
use crate::fee;
use crate::guard::BatchGuard;
use crate::outcome::BatchReport;
use crate::types::{BatchKind, CallContext, ConsolidationItem, EndpointKind, ExitItem, SwitchItem};

pub struct BatchEngine {
    guard: BatchGuard,
    consolidation: Arc<dyn RequestEndpoint>,
    exit: Arc<dyn RequestEndpoint>,
}

impl BatchEngine {
    pub fn new(
        config: &EngineConfig,
        consolidation: Arc<dyn RequestEndpoint>,
        exit: Arc<dyn RequestEndpoint>,
    ) -> Self {
        Self {
            guard: BatchGuard::new(config.account, config.fee_model),
            consolidation,
            exit,
        }
    }

    pub fn guard(&self) -> &BatchGuard {
        &self.guard
    }

    pub fn endpoint(&self, kind: EndpointKind) -> &dyn RequestEndpoint {
        match kind {
            EndpointKind::Consolidation => self.consolidation.as_ref(),
            EndpointKind::Exit => self.exit.as_ref(),
        }
    }

    /// Current per-request fee of an endpoint (floor on probe failure).
    pub async fn quote(&self, kind: EndpointKind) -> U256 {
        fee::quote(self.endpoint(kind)).await
    }

    /// Consolidate every source into one shared target.
    pub async fn batch_consolidation(
        &self,
        ctx: &CallContext,
        sources: &[ConsolidationItem],
        target: &[u8],
    ) -> Result<BatchReport, BatchError> {
        let endpoint = self.endpoint(EndpointKind::Consolidation);
        let admission = self
            .guard
            .check(BatchKind::Consolidation, sources.len(), Some(target), ctx, endpoint)
            .await?;
        let target = admission
            .target
            .ok_or(BatchError::InvalidTargetLength { len: target.len() })?;

        self.execute(BatchKind::Consolidation, ctx, admission.per_item_fee, sources, &target)
            .await
    }

    /// Switch each validator to compounding credentials.
    pub async fn batch_switch(
        &self,
        ctx: &CallContext,
        items: &[SwitchItem],
    ) -> Result<BatchReport, BatchError> {
        let endpoint = self.endpoint(EndpointKind::Consolidation);
        let admission = self
            .guard
            .check(BatchKind::Switch, items.len(), None, ctx, endpoint)
            .await?;

        self.execute(BatchKind::Switch, ctx, admission.per_item_fee, items, &())
            .await
    }

    /// Submit full or partial exits.
    pub async fn batch_exit(
        &self,
        ctx: &CallContext,
        items: &[ExitItem],
    ) -> Result<BatchReport, BatchError> {
        let endpoint = self.endpoint(EndpointKind::Exit);
        let admission = self
            .guard
            .check(BatchKind::Exit, items.len(), None, ctx, endpoint)
            .await?;

        self.execute(BatchKind::Exit, ctx, admission.per_item_fee, items, &())
            .await
    }

    async fn execute<T: Dispatchable>(
        &self,
        kind: BatchKind,
        ctx: &CallContext,
        per_item_fee: U256,
        items: &[T],
        item_ctx: &T::Context,
    ) -> Result<BatchReport, BatchError> {
        let endpoint = self.endpoint(kind.endpoint());
        info!(
            %kind,
            items = items.len(),
            endpoint = %endpoint.address(),
            fee = %per_item_fee,
            "dispatching batch"
        );

        let outcomes = Dispatcher::new(endpoint, per_item_fee)
            .run(items, item_ctx)
            .await;

        let report = BatchReport {
            kind,
            per_item_fee,
            supplied: ctx.value,
            outcomes,
        };
        info!(
            %kind,
            forwarded = report.forwarded(),
            failed = report.failed(),
            spent = %report.spent(),
            unspent = %report.unspent(),
            "batch complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEndpoint;
    use crate::outcome::FailureReason;
    use alloy_primitives::Address;

    fn account() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn setup(fee: u64) -> (BatchEngine, MemoryEndpoint, MemoryEndpoint) {
        let consolidation = MemoryEndpoint::new("consolidation", Address::repeat_byte(0xc0), U256::from(fee));
        let exit = MemoryEndpoint::new("exit", Address::repeat_byte(0xe0), U256::from(fee));
        let engine = BatchEngine::new(
            &EngineConfig::new(account()),
            Arc::new(consolidation.clone()),
            Arc::new(exit.clone()),
        );
        (engine, consolidation, exit)
    }

    #[tokio::test]
    async fn switch_goes_to_consolidation_endpoint() {
        let (engine, consolidation, exit) = setup(3);
        let ctx = CallContext::new(account(), U256::from(6u64));
        let items = vec![SwitchItem::new(vec![1u8; 48]), SwitchItem::new(vec![2u8; 48])];

        let report = engine.batch_switch(&ctx, &items).await.unwrap();
        assert_eq!(report.forwarded(), 2);
        assert_eq!(consolidation.balance(), U256::from(6u64));
        assert_eq!(exit.attempts(), 0);
    }

    #[tokio::test]
    async fn exit_goes_to_exit_endpoint() {
        let (engine, consolidation, exit) = setup(3);
        let ctx = CallContext::new(account(), U256::from(3u64));
        let report = engine
            .batch_exit(&ctx, &[ExitItem::new(vec![1u8; 48], 0, true)])
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(exit.accepted()[0].payload.len(), 56);
        assert_eq!(consolidation.attempts(), 0);
    }

    #[tokio::test]
    async fn guard_failure_leaves_endpoints_untouched() {
        let (engine, consolidation, _) = setup(3);
        let ctx = CallContext::new(account(), U256::from(5u64));
        let items = vec![ConsolidationItem::new(vec![1u8; 48]), ConsolidationItem::new(vec![2u8; 48])];

        let err = engine
            .batch_consolidation(&ctx, &items, &[0u8; 48])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::InsufficientFee { .. }));
        assert_eq!(consolidation.attempts(), 0);
        assert_eq!(consolidation.balance(), U256::ZERO);
    }

    #[tokio::test]
    async fn excess_value_is_left_unspent() {
        let (engine, _, exit) = setup(3);
        let ctx = CallContext::new(account(), U256::from(10u64));
        let items = vec![
            ExitItem::new(vec![1u8; 48], 0, true),
            ExitItem::new(vec![2u8; 48], 0, false),
        ];
        let report = engine.batch_exit(&ctx, &items).await.unwrap();
        assert_eq!(report.outcomes[1].reason(), Some(FailureReason::FullExitNotConfirmed));
        assert_eq!(report.spent(), U256::from(3u64));
        assert_eq!(report.unspent(), U256::from(7u64));
        assert_eq!(exit.balance(), report.spent());
    }

    #[tokio::test]
    async fn quote_uses_selected_endpoint() {
        let (engine, _, exit) = setup(3);
        exit.set_fee(U256::from(11u64));
        assert_eq!(engine.quote(EndpointKind::Exit).await, U256::from(11u64));
        assert_eq!(engine.quote(EndpointKind::Consolidation).await, U256::from(3u64));
    }
}
