//! Protocol constants and the security-level type.
//!
//! Reference: the transaction wire layout and signing scheme constants shared
//! by every conforming node and client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Ternary geometry
// =============================================================================

/// Trits per tryte.
pub const TRITS_PER_TRYTE: usize = 3;

/// The 27-symbol tryte alphabet. Index i encodes the balanced value of the
/// tryte: `9 → 0`, `A..M → 1..13`, `N..Z → -13..-1`.
pub const TRYTE_ALPHABET: &str = "9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Trytes in a hash (transaction hash, bundle hash, address without checksum).
pub const HASH_TRYTES: usize = 81;

/// Trits in a hash. This is also the absorb/squeeze block size of both
/// sponges.
pub const HASH_TRITS: usize = HASH_TRYTES * TRITS_PER_TRYTE;

/// Bytes in one Kerl block (384-bit Keccak digest width).
pub const KERL_BYTES: usize = 48;

// =============================================================================
// Field widths (trytes)
// =============================================================================

/// Maximum seed length; shorter seeds are right-padded with `9`.
pub const SEED_TRYTES: usize = 81;

/// Tag and obsolete-tag width.
pub const TAG_TRYTES: usize = 27;

/// Nonce width.
pub const NONCE_TRYTES: usize = 27;

/// Address checksum width.
pub const CHECKSUM_TRYTES: usize = 9;

/// Address with the checksum appended.
pub const ADDRESS_WITH_CHECKSUM_TRYTES: usize = HASH_TRYTES + CHECKSUM_TRYTES;

/// One signature/message fragment, i.e. the payload of one transaction.
pub const FRAGMENT_TRYTES: usize = 2187;

/// One signature fragment in trits.
pub const FRAGMENT_TRITS: usize = FRAGMENT_TRYTES * TRITS_PER_TRYTE;

/// Full serialized transaction.
pub const TRANSACTION_TRYTES: usize = 2673;

/// Full serialized transaction in trits.
pub const TRANSACTION_TRITS: usize = TRANSACTION_TRYTES * TRITS_PER_TRYTE;

// =============================================================================
// Supply
// =============================================================================

/// Maximum token amount representable on the ledger: `(3^33 - 1) / 2`.
/// Transaction values beyond this magnitude are rejected on encode.
pub const MAX_SUPPLY: i64 = 2_779_530_283_277_761;

// =============================================================================
// Security level
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
#[error("security level must be 1, 2 or 3, got {0}")]
pub struct InvalidSecurityLevel(pub u8);

/// Signature redundancy level.
///
/// Determines private-key length (`level * 6561` trits), the number of
/// signature fragments an input occupies (= level), and the number of key
/// digests folded into the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl SecurityLevel {
    pub fn from_u8(level: u8) -> Result<Self, InvalidSecurityLevel> {
        match level {
            1 => Ok(SecurityLevel::Low),
            2 => Ok(SecurityLevel::Medium),
            3 => Ok(SecurityLevel::High),
            other => Err(InvalidSecurityLevel(other)),
        }
    }

    /// Number of signature fragments (and transactions) an input occupies.
    pub fn fragments(self) -> usize {
        self as usize
    }

    /// Private key length in trits.
    pub fn key_trits(self) -> usize {
        self.fragments() * FRAGMENT_TRITS
    }

    /// Key digest length in trits.
    pub fn digest_trits(self) -> usize {
        self.fragments() * HASH_TRITS
    }
}

impl Default for SecurityLevel {
    fn default() -> Self {
        SecurityLevel::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_level_from_u8() {
        assert_eq!(SecurityLevel::from_u8(1).unwrap(), SecurityLevel::Low);
        assert_eq!(SecurityLevel::from_u8(2).unwrap(), SecurityLevel::Medium);
        assert_eq!(SecurityLevel::from_u8(3).unwrap(), SecurityLevel::High);
        assert!(SecurityLevel::from_u8(0).is_err());
        assert!(SecurityLevel::from_u8(4).is_err());
    }

    #[test]
    fn test_key_lengths_scale_with_level() {
        assert_eq!(SecurityLevel::Low.key_trits(), 6561);
        assert_eq!(SecurityLevel::Medium.key_trits(), 13122);
        assert_eq!(SecurityLevel::High.key_trits(), 19683);
        assert_eq!(SecurityLevel::High.digest_trits(), 729);
    }

    #[test]
    fn test_alphabet_has_27_symbols() {
        assert_eq!(TRYTE_ALPHABET.len(), 27);
    }
}
