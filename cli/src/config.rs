//! CLI configuration: YAML file, environment, then command-line flags.
//!
//! ```yaml
//! rpc_url: http://localhost:8545
//! account: "0x..."
//! fee_model: metered          # or equal_split
//! await_receipts: true
//! request_timeout_secs: 30
//! log:
//!   level: info
//!   json: false
//! ```

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use chainbatch_core::config::{CONSOLIDATION_REQUEST_ADDRESS, WITHDRAWAL_REQUEST_ADDRESS};
use chainbatch_core::{EngineConfig, FeeModel};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::logging::LogConfig;

/// Contents of the optional config file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub account: Option<Address>,
    pub consolidation_endpoint: Option<Address>,
    pub exit_endpoint: Option<Address>,
    pub fee_model: Option<FeeModel>,
    pub await_receipts: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log: LogConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Values given on the command line (or through their env vars).
#[derive(Debug, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub account: Option<String>,
    pub fee_model: Option<FeeModel>,
}

/// Fully resolved settings.
#[derive(Debug)]
pub struct Settings {
    pub engine: EngineConfig,
    pub rpc_url: Option<String>,
    pub await_receipts: bool,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let account = match overrides.account {
            Some(raw) => raw
                .parse::<Address>()
                .with_context(|| format!("invalid --account {raw}"))?,
            None => file.account.ok_or_else(|| {
                anyhow!("no account: pass --account, set CHAINBATCH_ACCOUNT or `account` in the config file")
            })?,
        };

        let engine = EngineConfig {
            account,
            consolidation_endpoint: file
                .consolidation_endpoint
                .unwrap_or(CONSOLIDATION_REQUEST_ADDRESS),
            exit_endpoint: file.exit_endpoint.unwrap_or(WITHDRAWAL_REQUEST_ADDRESS),
            fee_model: overrides.fee_model.or(file.fee_model).unwrap_or_default(),
        };

        Ok(Self {
            engine,
            rpc_url: overrides.rpc_url.or(file.rpc_url),
            await_receipts: file.await_receipts.unwrap_or(true),
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(30)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
rpc_url: http://localhost:8545
account: "0x00000000000000000000000000000000000000a1"
fee_model: equal_split
await_receipts: false
log:
  level: info
  json: true
"#;

    #[test]
    fn parses_yaml() {
        let cfg = FileConfig::parse(YAML).unwrap();
        assert_eq!(cfg.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(cfg.fee_model, Some(FeeModel::EqualSplit));
        assert!(cfg.log.json);
    }

    #[test]
    fn flags_override_file() {
        let cfg = FileConfig::parse(YAML).unwrap();
        let settings = Settings::resolve(
            cfg,
            Overrides {
                rpc_url: Some("http://node:8545".into()),
                account: Some("0x00000000000000000000000000000000000000b2".into()),
                fee_model: Some(FeeModel::Metered),
            },
        )
        .unwrap();
        assert_eq!(settings.rpc_url.as_deref(), Some("http://node:8545"));
        assert_eq!(settings.engine.account, Address::with_last_byte(0xb2));
        assert_eq!(settings.engine.fee_model, FeeModel::Metered);
        assert!(!settings.await_receipts);
        assert_eq!(settings.engine.exit_endpoint, WITHDRAWAL_REQUEST_ADDRESS);
    }

    #[test]
    fn account_is_required() {
        let err = Settings::resolve(FileConfig::default(), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("no account"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("rpc: http://x\n").is_err());
    }
}
