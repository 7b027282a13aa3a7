//! Turning command-line arguments and files into request items.
//!
//! Public keys are only hex-decoded here. Length checks are left to the
//! engine so a malformed key becomes a failure record, not a CLI error.

use alloy_primitives::Bytes;
use anyhow::{anyhow, bail, Context, Result};
use chainbatch_core::types::GWEI_PER_ETH;
use chainbatch_core::{ExitItem, Gwei};
use serde::Deserialize;
use std::path::Path;

pub fn parse_hex(raw: &str) -> Result<Bytes> {
    raw.trim()
        .parse::<Bytes>()
        .with_context(|| format!("invalid hex '{raw}'"))
}

pub fn parse_hex_list(raw: &[String]) -> Result<Vec<Bytes>> {
    raw.iter().map(|s| parse_hex(s)).collect()
}

/// Parse an amount: plain gwei (`32000000000`) or ether with an `eth`
/// suffix (`32eth`).
pub fn parse_amount(raw: &str) -> Result<Gwei> {
    let raw = raw.trim();
    if let Some(eth) = raw.strip_suffix("eth") {
        let eth: u64 = eth.trim().parse().with_context(|| format!("invalid amount '{raw}'"))?;
        return eth
            .checked_mul(GWEI_PER_ETH)
            .ok_or_else(|| anyhow!("amount '{raw}' overflows u64 gwei"));
    }
    raw.parse().with_context(|| format!("invalid amount '{raw}'"))
}

/// Parse `PUBKEY:AMOUNT[:full]`.
pub fn parse_exit_request(raw: &str) -> Result<ExitItem> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (pubkey, amount, full_exit) = match parts.as_slice() {
        [pubkey, amount] => (pubkey, amount, false),
        [pubkey, amount, "full"] => (pubkey, amount, true),
        _ => bail!("exit request must be PUBKEY:AMOUNT[:full], got '{raw}'"),
    };
    Ok(ExitItem::new(parse_hex(pubkey)?, parse_amount(amount)?, full_exit))
}

/// One entry of an exit request file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExitFileEntry {
    pubkey: Bytes,
    amount_gwei: Gwei,
    #[serde(default)]
    full_exit: bool,
}

/// Load a JSON array of `{ "pubkey", "amount_gwei", "full_exit" }`.
pub fn load_exit_file(path: &Path) -> Result<Vec<ExitItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_exit_json(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_exit_json(raw: &str) -> Result<Vec<ExitItem>> {
    let entries: Vec<ExitFileEntry> = serde_json::from_str(raw)?;
    Ok(entries
        .into_iter()
        .map(|e| ExitItem::new(e.pubkey, e.amount_gwei, e.full_exit))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        format!("0x{}", hex::encode([0xab; 48]))
    }

    #[test]
    fn short_keys_are_not_rejected_here() {
        let bytes = parse_hex("0xabcd").unwrap();
        assert_eq!(bytes.len(), 2);
        assert!(parse_hex("0xzz").is_err());
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount("32eth").unwrap(), 32 * GWEI_PER_ETH);
        assert_eq!(parse_amount("1500000000").unwrap(), 1_500_000_000);
        assert!(parse_amount("-1").is_err());
    }

    #[test]
    fn exit_requests() {
        let item = parse_exit_request(&format!("{}:0:full", key())).unwrap();
        assert!(item.full_exit);
        assert_eq!(item.amount_gwei(), Some(0));
        assert_eq!(item.pubkey.len(), 48);

        let item = parse_exit_request(&format!("{}:1eth", key())).unwrap();
        assert!(!item.full_exit);
        assert_eq!(item.amount_gwei(), Some(GWEI_PER_ETH));

        assert!(parse_exit_request(&key()).is_err());
        assert!(parse_exit_request(&format!("{}:0:yes", key())).is_err());
    }

    #[test]
    fn exit_json() {
        let json = format!(
            r#"[{{ "pubkey": "{}", "amount_gwei": 0, "full_exit": true }},
                {{ "pubkey": "{}", "amount_gwei": 5 }}]"#,
            key(),
            key()
        );
        let items = parse_exit_json(&json).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].full_exit);
        assert_eq!(items[1].amount_gwei(), Some(5));
    }
}
