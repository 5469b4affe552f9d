//! Winternitz-style one-time signatures over normalized bundle hashes.
//!
//! A bundle hash is normalized into 81 balanced tryte values whose 27-value
//! fragments each sum to zero. Signing reveals each 243-trit key chunk
//! hashed `13 - value` times; verification completes the 26-round chain and
//! folds the result back into the address.

use crate::key::address_from_digests;
use crate::{CryptoError, Kerl, Sponge};
use iota_types::constants::{FRAGMENT_TRITS, HASH_TRITS};
use iota_types::ternary::{trytes_to_trits, TernaryError};
use iota_types::{Address, Hash};

/// Highest balanced tryte value. A normalized fragment containing this value
/// would leave a key chunk fully exposed, which is why bundle finalization
/// rejects such hashes.
pub const MAX_TRYTE_VALUE: i8 = 13;

/// Lowest balanced tryte value.
pub const MIN_TRYTE_VALUE: i8 = -13;

/// Values per normalized fragment.
pub const NORMALIZED_FRAGMENT_LENGTH: usize = 27;

/// Fragments per bundle hash.
pub const NORMALIZED_FRAGMENT_COUNT: usize = 3;

/// Normalize a bundle hash into 81 tryte values where every 27-value
/// fragment sums to zero.
pub fn normalize(bundle_hash: &Hash) -> Vec<i8> {
    let mut values = bundle_hash.tryte_values();
    for fragment in values.chunks_exact_mut(NORMALIZED_FRAGMENT_LENGTH) {
        let mut sum: i32 = fragment.iter().map(|&v| i32::from(v)).sum();
        while sum > 0 {
            for value in fragment.iter_mut() {
                if *value > MIN_TRYTE_VALUE {
                    *value -= 1;
                    break;
                }
            }
            sum -= 1;
        }
        while sum < 0 {
            for value in fragment.iter_mut() {
                if *value < MAX_TRYTE_VALUE {
                    *value += 1;
                    break;
                }
            }
            sum += 1;
        }
    }
    values
}

/// Whether a normalized hash would expose a full key chunk.
pub fn has_insecure_value(normalized: &[i8]) -> bool {
    normalized.contains(&MAX_TRYTE_VALUE)
}

fn check_fragment_lengths(normalized: &[i8], fragment: &[i8]) -> Result<(), CryptoError> {
    if normalized.len() != NORMALIZED_FRAGMENT_LENGTH {
        return Err(CryptoError::FragmentLength {
            expected: NORMALIZED_FRAGMENT_LENGTH,
            actual: normalized.len(),
        });
    }
    if fragment.len() != FRAGMENT_TRITS {
        return Err(CryptoError::FragmentLength {
            expected: FRAGMENT_TRITS,
            actual: fragment.len(),
        });
    }
    Ok(())
}

/// Sign one normalized fragment with one 6561-trit key fragment: chunk `i`
/// of the key is hashed `13 - normalized[i]` times.
pub fn signature_fragment(
    normalized: &[i8],
    key_fragment: &[i8],
) -> Result<Vec<i8>, CryptoError> {
    check_fragment_lengths(normalized, key_fragment)?;
    let mut signature = key_fragment.to_vec();
    for (value, chunk) in normalized.iter().zip(signature.chunks_exact_mut(HASH_TRITS)) {
        for _ in 0..(MAX_TRYTE_VALUE - value) {
            let mut kerl = Kerl::new();
            kerl.absorb(chunk)?;
            kerl.squeeze_into(chunk)?;
        }
    }
    Ok(signature)
}

/// Recover the key digest from a signature fragment by completing the
/// 26-round chain: chunk `i` is hashed `13 + normalized[i]` more times.
pub fn digest_from_fragment(
    normalized: &[i8],
    signature: &[i8],
) -> Result<Vec<i8>, CryptoError> {
    check_fragment_lengths(normalized, signature)?;
    let mut buffer = signature.to_vec();
    for (value, chunk) in normalized.iter().zip(buffer.chunks_exact_mut(HASH_TRITS)) {
        for _ in 0..(MAX_TRYTE_VALUE + value) {
            let mut kerl = Kerl::new();
            kerl.absorb(chunk)?;
            kerl.squeeze_into(chunk)?;
        }
    }
    let mut kerl = Kerl::new();
    kerl.absorb(&buffer)?;
    kerl.squeeze(HASH_TRITS)
}

/// Verify signature fragments against an address and bundle hash.
///
/// Fragment `i` is checked against normalized fragment `i mod 3`, matching
/// how consecutive transactions of one input are signed.
pub fn verify_signatures(
    address: &Address,
    fragments: &[String],
    bundle_hash: &Hash,
) -> Result<bool, CryptoError> {
    if fragments.is_empty() {
        return Ok(false);
    }
    let normalized = normalize(bundle_hash);
    let mut digests = Vec::with_capacity(fragments.len() * HASH_TRITS);
    for (i, fragment) in fragments.iter().enumerate() {
        let trits = trytes_to_trits(fragment)?;
        if trits.len() != FRAGMENT_TRITS {
            return Err(TernaryError::InvalidLength {
                expected: FRAGMENT_TRITS,
                actual: trits.len(),
            }
            .into());
        }
        let offset = (i % NORMALIZED_FRAGMENT_COUNT) * NORMALIZED_FRAGMENT_LENGTH;
        let normalized_fragment = &normalized[offset..offset + NORMALIZED_FRAGMENT_LENGTH];
        digests.extend(digest_from_fragment(normalized_fragment, &trits)?);
    }
    Ok(address_from_digests(&digests)? == *address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{digests, key};
    use iota_types::ternary::trits_to_trytes;
    use iota_types::{Seed, SecurityLevel};

    fn seed() -> Seed {
        Seed::new("SIGNING9TESTS9ONLY").unwrap()
    }

    fn arbitrary_hash(fill: &str) -> Hash {
        let repeated = fill.repeat(81);
        Hash::new(&repeated[..81]).unwrap()
    }

    #[test]
    fn test_normalized_fragments_sum_to_zero() {
        for fill in ["M", "N", "A", "XB", "QZPURVEY9"] {
            let normalized = normalize(&arbitrary_hash(fill));
            assert_eq!(normalized.len(), 81);
            for fragment in normalized.chunks_exact(27) {
                let sum: i32 = fragment.iter().map(|&v| i32::from(v)).sum();
                assert_eq!(sum, 0, "fill {:?}", fill);
                assert!(fragment.iter().all(|v| (-13..=13).contains(v)));
            }
        }
    }

    #[test]
    fn test_normalize_is_pure() {
        let hash = arbitrary_hash("LGZ");
        assert_eq!(normalize(&hash), normalize(&hash));
    }

    #[test]
    fn test_sign_then_verify() {
        let s = seed();
        for level in [SecurityLevel::Low, SecurityLevel::Medium, SecurityLevel::High] {
            let private = key(&s, 7, level).unwrap();
            let digest_trits = digests(&private).unwrap();
            let address = address_from_digests(&digest_trits).unwrap();

            let bundle_hash = arbitrary_hash("UVWXYZ9AB");
            let normalized = normalize(&bundle_hash);

            let fragments: Vec<String> = (0..level.fragments())
                .map(|j| {
                    let fragment = &normalized[j * 27..(j + 1) * 27];
                    let signed = signature_fragment(fragment, private.fragment(j)).unwrap();
                    trits_to_trytes(&signed).unwrap()
                })
                .collect();

            assert!(verify_signatures(&address, &fragments, &bundle_hash).unwrap());
        }
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let s = seed();
        let private = key(&s, 0, SecurityLevel::Low).unwrap();
        let address = address_from_digests(&digests(&private).unwrap()).unwrap();

        let bundle_hash = arbitrary_hash("TAMPER9");
        let normalized = normalize(&bundle_hash);
        let signed = signature_fragment(&normalized[..27], private.fragment(0)).unwrap();
        let mut trytes = trits_to_trytes(&signed).unwrap();

        // Corrupt one tryte of the signature.
        let replacement = if trytes.starts_with('A') { "B" } else { "A" };
        trytes.replace_range(0..1, replacement);

        assert!(!verify_signatures(&address, &[trytes], &bundle_hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_bundle_hash() {
        let s = seed();
        let private = key(&s, 0, SecurityLevel::Low).unwrap();
        let address = address_from_digests(&digests(&private).unwrap()).unwrap();

        let signed_hash = arbitrary_hash("RIGHT9ONE");
        let normalized = normalize(&signed_hash);
        let signed = signature_fragment(&normalized[..27], private.fragment(0)).unwrap();
        let fragments = vec![trits_to_trytes(&signed).unwrap()];

        let other_hash = arbitrary_hash("WRONG9ONE");
        assert!(!verify_signatures(&address, &fragments, &other_hash).unwrap());
    }

    #[test]
    fn test_empty_fragments_do_not_verify() {
        let address = Address::new(&"A".repeat(81)).unwrap();
        let hash = arbitrary_hash("E");
        assert!(!verify_signatures(&address, &[], &hash).unwrap());
    }
}
