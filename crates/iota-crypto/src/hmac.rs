//! Curl-based MAC stamping for value transactions.
//!
//! The stamp is the 27-round Curl squeeze of `key || bundleHash`; the
//! transfer pipeline writes it over the leading 81 trytes of the signature
//! fragment of every value-bearing transaction.

use crate::{CryptoError, Curl, Sponge};
use iota_types::constants::{HASH_TRITS, HASH_TRYTES};
use iota_types::ternary::{self, trits_to_trytes};
use iota_types::Hash;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An 81-tryte MAC key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacKey(String);

impl HmacKey {
    pub fn new(trytes: &str) -> Result<Self, CryptoError> {
        if trytes.len() != HASH_TRYTES {
            return Err(CryptoError::HmacKeyLength(trytes.len()));
        }
        ternary::validate_trytes(trytes)?;
        Ok(HmacKey(trytes.to_string()))
    }

    fn to_trits(&self) -> Vec<i8> {
        ternary::trytes_to_trits(&self.0).expect("key was validated on construction")
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacKey(<redacted>)")
    }
}

/// Compute the 81-tryte stamp for one transaction's bundle hash.
pub fn stamp(key: &HmacKey, bundle_hash: &Hash) -> Result<String, CryptoError> {
    let mut curl = Curl::p27();
    let mut key_trits = key.to_trits();
    let absorbed = curl.absorb(&key_trits);
    key_trits.zeroize();
    absorbed?;
    curl.absorb(&bundle_hash.to_trits())?;
    Ok(trits_to_trytes(&curl.squeeze(HASH_TRITS)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(fill: char) -> Hash {
        Hash::new(&fill.to_string().repeat(81)).unwrap()
    }

    #[test]
    fn test_key_length_enforced() {
        assert!(HmacKey::new(&"K".repeat(81)).is_ok());
        assert!(matches!(
            HmacKey::new(&"K".repeat(80)),
            Err(CryptoError::HmacKeyLength(80))
        ));
    }

    #[test]
    fn test_stamp_is_deterministic() {
        let key = HmacKey::new(&"K".repeat(81)).unwrap();
        assert_eq!(
            stamp(&key, &hash('B')).unwrap(),
            stamp(&key, &hash('B')).unwrap()
        );
    }

    #[test]
    fn test_stamp_depends_on_key_and_hash() {
        let key_a = HmacKey::new(&"K".repeat(81)).unwrap();
        let key_b = HmacKey::new(&"L".repeat(81)).unwrap();
        assert_ne!(
            stamp(&key_a, &hash('B')).unwrap(),
            stamp(&key_b, &hash('B')).unwrap()
        );
        assert_ne!(
            stamp(&key_a, &hash('B')).unwrap(),
            stamp(&key_a, &hash('C')).unwrap()
        );
    }

    #[test]
    fn test_stamp_width() {
        let key = HmacKey::new(&"K".repeat(81)).unwrap();
        assert_eq!(stamp(&key, &hash('D')).unwrap().len(), 81);
    }
}
