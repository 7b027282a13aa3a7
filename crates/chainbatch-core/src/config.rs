//! Engine configuration.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::fee::FeeModel;

/// EIP-7251 consolidation request predeploy.
pub const CONSOLIDATION_REQUEST_ADDRESS: Address =
    address!("0000bbddc7ce488642fb579f8b00f3a590007251");

/// EIP-7002 withdrawal request predeploy.
pub const WITHDRAWAL_REQUEST_ADDRESS: Address =
    address!("00000961ef480eb55e80d19ad83579a64c007002");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Account the engine executes under; the only permitted invoker.
    pub account: Address,
    /// Consolidation request contract. Switch requests go here too.
    #[serde(default = "default_consolidation_endpoint")]
    pub consolidation_endpoint: Address,
    /// Withdrawal request contract used for exits.
    #[serde(default = "default_exit_endpoint")]
    pub exit_endpoint: Address,
    #[serde(default)]
    pub fee_model: FeeModel,
}

fn default_consolidation_endpoint() -> Address {
    CONSOLIDATION_REQUEST_ADDRESS
}

fn default_exit_endpoint() -> Address {
    WITHDRAWAL_REQUEST_ADDRESS
}

impl EngineConfig {
    /// Mainnet predeploy addresses with the metered fee model.
    pub fn new(account: Address) -> Self {
        Self {
            account,
            consolidation_endpoint: CONSOLIDATION_REQUEST_ADDRESS,
            exit_endpoint: WITHDRAWAL_REQUEST_ADDRESS,
            fee_model: FeeModel::Metered,
        }
    }

    pub fn with_fee_model(mut self, fee_model: FeeModel) -> Self {
        self.fee_model = fee_model;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let json = r#"{ "account": "0x00000000000000000000000000000000000000a1" }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.consolidation_endpoint, CONSOLIDATION_REQUEST_ADDRESS);
        assert_eq!(cfg.exit_endpoint, WITHDRAWAL_REQUEST_ADDRESS);
        assert_eq!(cfg.fee_model, FeeModel::Metered);
    }

    #[test]
    fn fee_model_parses_snake_case() {
        let json = r#"{
            "account": "0x00000000000000000000000000000000000000a1",
            "fee_model": "equal_split"
        }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.fee_model, FeeModel::EqualSplit);
    }
}
