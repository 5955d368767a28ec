//! Balance encoding and ledger-wide digests.
//!
//! Balances live in the store as decimal strings. Everything that turns
//! those bytes into integers (or back) goes through this module so the
//! contract never handles raw encodings itself.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::error::{ChaincodeError, Result};

pub type AccountId = String;
pub type Balance = i64;

/// Parses a caller-supplied initial balance for `account`.
pub fn parse_balance(account: &str, raw: &str) -> Result<Balance> {
    raw.parse::<Balance>()
        .map_err(|_| ChaincodeError::InvalidBalanceFormat {
            account: account.to_string(),
            value: raw.to_string(),
        })
}

/// Parses a caller-supplied transfer amount.
pub fn parse_amount(raw: &str) -> Result<Balance> {
    raw.parse::<Balance>()
        .map_err(|_| ChaincodeError::InvalidAmountFormat(raw.to_string()))
}

/// Decodes a value read back from the store.
pub fn decode_balance(account: &str, bytes: &[u8]) -> Result<Balance> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<Balance>().ok())
        .ok_or_else(|| ChaincodeError::CorruptBalance {
            account: account.to_string(),
            value: String::from_utf8_lossy(bytes).into_owned(),
        })
}

pub fn encode_balance(balance: Balance) -> Vec<u8> {
    balance.to_string().into_bytes()
}

/// Moves `amount` from one side to the other, failing instead of wrapping.
pub(crate) fn checked_move(
    source: &str,
    source_balance: Balance,
    destination: &str,
    destination_balance: Balance,
    amount: Balance,
) -> Result<(Balance, Balance)> {
    let new_source =
        source_balance
            .checked_sub(amount)
            .ok_or_else(|| ChaincodeError::BalanceOverflow {
                account: source.to_string(),
            })?;
    let new_destination = destination_balance.checked_add(amount).ok_or_else(|| {
        ChaincodeError::BalanceOverflow {
            account: destination.to_string(),
        }
    })?;
    Ok((new_source, new_destination))
}

/// Merkle root over the full key space, ordered by key.
pub fn state_root(entries: &BTreeMap<AccountId, Vec<u8>>) -> [u8; 32] {
    let leaves: Vec<[u8; 32]> = entries
        .iter()
        .map(|(account, value)| -> [u8; 32] {
            let mut hasher = Sha256::new();
            hasher.update(b"acct");
            hasher.update((account.len() as u64).to_le_bytes());
            hasher.update(account.as_bytes());
            hasher.update(value);
            hasher.finalize().into()
        })
        .collect();
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"twoparty-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            // odd node is paired with itself
            hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_codec_accepts_signed_integers() {
        assert_eq!(parse_balance("a", "100").unwrap(), 100);
        assert_eq!(parse_balance("a", "-7").unwrap(), -7);
        assert_eq!(decode_balance("a", b"-42").unwrap(), -42);
        assert_eq!(encode_balance(-42), b"-42".to_vec());
    }

    #[test]
    fn malformed_values_map_to_their_own_errors() {
        assert!(matches!(
            parse_balance("alice", "abc"),
            Err(ChaincodeError::InvalidBalanceFormat { account, .. }) if account == "alice"
        ));
        assert!(matches!(
            parse_amount("1.5"),
            Err(ChaincodeError::InvalidAmountFormat(v)) if v == "1.5"
        ));
        assert!(matches!(
            decode_balance("bob", &[0xff, 0x00]),
            Err(ChaincodeError::CorruptBalance { .. })
        ));
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn checked_move_rejects_overflow() {
        assert_eq!(checked_move("a", 100, "b", 50, 30).unwrap(), (70, 80));
        assert!(matches!(
            checked_move("a", 0, "b", Balance::MAX, 1),
            Err(ChaincodeError::BalanceOverflow { account }) if account == "b"
        ));
        assert!(matches!(
            checked_move("a", Balance::MIN, "b", 0, 1),
            Err(ChaincodeError::BalanceOverflow { account }) if account == "a"
        ));
    }

    #[test]
    fn state_root_is_deterministic_and_content_sensitive() {
        let mut entries = BTreeMap::new();
        entries.insert("alice".to_string(), b"100".to_vec());
        entries.insert("bob".to_string(), b"50".to_vec());
        let root1 = state_root(&entries);
        assert_eq!(root1, state_root(&entries.clone()));

        entries.insert("bob".to_string(), b"51".to_vec());
        assert_ne!(root1, state_root(&entries));
        assert_ne!(state_root(&BTreeMap::new()), root1);
    }
}
