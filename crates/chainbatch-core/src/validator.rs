//! Item-level validation.
//!
//! Each function is a pure check of one item. A passing item comes back as
//! its typed form; a failing one comes back as the [`FailureReason`] the
//! dispatcher records. Nothing here can abort a batch.
//!
//! Validation is structural only. Whether a key belongs to a registered
//! validator is decided by the downstream contract.

use crate::outcome::FailureReason;
use crate::types::{
    ConsolidationItem, ExitItem, Gwei, PubKey, SwitchItem, AMOUNT_LENGTH,
    MAX_EFFECTIVE_BALANCE_GWEI,
};

/// A consolidation source that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidConsolidation {
    pub source: PubKey,
}

/// A switch request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidSwitch {
    pub pubkey: PubKey,
}

/// An exit request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidExit {
    pub pubkey: PubKey,
    pub amount: Gwei,
}

/// Parse a raw public key, enforcing the 48-byte length.
pub fn parse_pubkey(raw: &[u8]) -> Result<PubKey, FailureReason> {
    PubKey::try_from(raw).map_err(|_| FailureReason::InvalidPubkeyLength)
}

pub fn validate_consolidation(item: &ConsolidationItem) -> Result<ValidConsolidation, FailureReason> {
    Ok(ValidConsolidation {
        source: parse_pubkey(&item.source)?,
    })
}

pub fn validate_switch(item: &SwitchItem) -> Result<ValidSwitch, FailureReason> {
    Ok(ValidSwitch {
        pubkey: parse_pubkey(&item.pubkey)?,
    })
}

/// Validate an exit request.
///
/// Checks run in a fixed order and the first failure wins:
/// pubkey length, amount length, unconfirmed full exit, amount ceiling,
/// confirmation paired with a nonzero amount.
pub fn validate_exit(item: &ExitItem) -> Result<ValidExit, FailureReason> {
    let pubkey = parse_pubkey(&item.pubkey)?;

    if item.amount.len() != AMOUNT_LENGTH {
        return Err(FailureReason::InvalidAmountLength);
    }
    let amount = item
        .amount_gwei()
        .ok_or(FailureReason::InvalidAmountLength)?;

    if amount == 0 && !item.full_exit {
        return Err(FailureReason::FullExitNotConfirmed);
    }
    if amount > MAX_EFFECTIVE_BALANCE_GWEI {
        return Err(FailureReason::AmountExceedsMaximum);
    }
    if amount > 0 && item.full_exit {
        return Err(FailureReason::FullExitWithAmount);
    }

    Ok(ValidExit { pubkey, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GWEI_PER_ETH;

    fn key(len: usize) -> Vec<u8> {
        vec![0x11; len]
    }

    #[test]
    fn pubkey_must_be_exactly_48_bytes() {
        assert!(parse_pubkey(&key(48)).is_ok());
        assert_eq!(parse_pubkey(&key(47)), Err(FailureReason::InvalidPubkeyLength));
        assert_eq!(parse_pubkey(&key(49)), Err(FailureReason::InvalidPubkeyLength));
        assert_eq!(parse_pubkey(&[]), Err(FailureReason::InvalidPubkeyLength));
    }

    #[test]
    fn consolidation_and_switch_check_length_only() {
        let ok = validate_consolidation(&ConsolidationItem::new(key(48))).unwrap();
        assert_eq!(ok.source.as_slice(), key(48).as_slice());
        assert_eq!(
            validate_switch(&SwitchItem::new(key(32))),
            Err(FailureReason::InvalidPubkeyLength)
        );
    }

    #[test]
    fn full_exit_requires_confirmation() {
        assert_eq!(
            validate_exit(&ExitItem::new(key(48), 0, false)),
            Err(FailureReason::FullExitNotConfirmed)
        );
        let ok = validate_exit(&ExitItem::new(key(48), 0, true)).unwrap();
        assert_eq!(ok.amount, 0);
    }

    #[test]
    fn partial_exit_bounded_by_ceiling() {
        let ceiling = MAX_EFFECTIVE_BALANCE_GWEI;
        assert!(validate_exit(&ExitItem::new(key(48), ceiling, false)).is_ok());
        assert_eq!(
            validate_exit(&ExitItem::new(key(48), ceiling + 1, false)),
            Err(FailureReason::AmountExceedsMaximum)
        );
    }

    #[test]
    fn confirmation_with_amount_is_rejected() {
        assert_eq!(
            validate_exit(&ExitItem::new(key(48), GWEI_PER_ETH, true)),
            Err(FailureReason::FullExitWithAmount)
        );
    }

    #[test]
    fn amount_must_be_eight_bytes() {
        assert_eq!(
            validate_exit(&ExitItem::raw(key(48), vec![0u8; 7], true)),
            Err(FailureReason::InvalidAmountLength)
        );
        assert_eq!(
            validate_exit(&ExitItem::raw(key(48), vec![0u8; 32], true)),
            Err(FailureReason::InvalidAmountLength)
        );
    }

    #[test]
    fn pubkey_length_is_checked_first() {
        // Bad key and bad amount: the key failure is reported.
        assert_eq!(
            validate_exit(&ExitItem::raw(key(10), vec![0u8; 3], false)),
            Err(FailureReason::InvalidPubkeyLength)
        );
        // Bad key with an otherwise unconfirmed full exit.
        assert_eq!(
            validate_exit(&ExitItem::new(key(10), 0, false)),
            Err(FailureReason::InvalidPubkeyLength)
        );
    }

    #[test]
    fn validation_is_pure() {
        let item = ExitItem::new(key(48), MAX_EFFECTIVE_BALANCE_GWEI + 5, false);
        assert_eq!(validate_exit(&item), validate_exit(&item));
    }
}
