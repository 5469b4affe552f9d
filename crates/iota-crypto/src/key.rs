//! Seed-based key derivation and addresses.
//!
//! The chain is `seed + index -> subseed -> private key -> digests ->
//! address`, all through Kerl. Key material lives only inside `PrivateKey`
//! buffers, which are wiped on drop.

use crate::{CryptoError, Kerl, Sponge};
use iota_types::constants::{
    ADDRESS_WITH_CHECKSUM_TRYTES, CHECKSUM_TRYTES, FRAGMENT_TRITS, HASH_TRITS, HASH_TRYTES,
};
use iota_types::ternary::{self, int_to_trits, trits_to_trytes};
use iota_types::{Address, Seed, SecurityLevel, TypeError};
use zeroize::Zeroize;

/// Hash chain length of the one-time signature scheme: a key segment fully
/// chained 26 times yields its public digest input.
const CHAIN_LENGTH: usize = 26;

/// A derived private key: `security * 6561` trits, one 6561-trit fragment
/// per security level. Zeroized on drop.
#[derive(Zeroize, zeroize::ZeroizeOnDrop)]
pub struct PrivateKey {
    trits: Vec<i8>,
    #[zeroize(skip)]
    security: SecurityLevel,
}

impl PrivateKey {
    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    pub fn trits(&self) -> &[i8] {
        &self.trits
    }

    /// The `index`-th 6561-trit signing fragment.
    pub fn fragment(&self, index: usize) -> &[i8] {
        &self.trits[index * FRAGMENT_TRITS..(index + 1) * FRAGMENT_TRITS]
    }
}

/// The subseed for an address index: Kerl over the balanced-ternary sum of
/// the seed trits and the index.
pub fn subseed(seed: &Seed, index: u32) -> Result<Vec<i8>, CryptoError> {
    let mut seed_trits = seed.to_trits();
    let index_trits = int_to_trits(i64::from(index), 81)?;
    let mut summed = ternary::add(&seed_trits, &index_trits);
    seed_trits.zeroize();

    let mut kerl = Kerl::new();
    let absorbed = kerl.absorb(&summed);
    summed.zeroize();
    absorbed?;
    kerl.squeeze(HASH_TRITS)
}

/// Derive the private key for `(seed, index, security)`.
pub fn key(seed: &Seed, index: u32, security: SecurityLevel) -> Result<PrivateKey, CryptoError> {
    let mut sub = subseed(seed, index)?;
    let mut kerl = Kerl::new();
    let absorbed = kerl.absorb(&sub);
    sub.zeroize();
    absorbed?;

    let mut trits = vec![0i8; security.key_trits()];
    kerl.squeeze_into(&mut trits)?;
    Ok(PrivateKey { trits, security })
}

/// Key digests: each 6561-trit fragment collapses to one 243-trit digest by
/// hashing every 243-trit segment 26 times and hashing the result once more.
pub fn digests(key: &PrivateKey) -> Result<Vec<i8>, CryptoError> {
    let mut out = Vec::with_capacity(key.security().digest_trits());
    for fragment in key.trits.chunks_exact(FRAGMENT_TRITS) {
        let mut buffer = fragment.to_vec();
        for segment in buffer.chunks_exact_mut(HASH_TRITS) {
            for _ in 0..CHAIN_LENGTH {
                let mut kerl = Kerl::new();
                kerl.absorb(segment)?;
                kerl.squeeze_into(segment)?;
            }
        }
        let mut kerl = Kerl::new();
        kerl.absorb(&buffer)?;
        out.extend(kerl.squeeze(HASH_TRITS)?);
    }
    debug_assert_eq!(out.len(), key.security().digest_trits());
    Ok(out)
}

/// Fold digests into the 81-tryte address.
pub fn address_from_digests(digests: &[i8]) -> Result<Address, CryptoError> {
    let mut kerl = Kerl::new();
    kerl.absorb(digests)?;
    let trits = kerl.squeeze(HASH_TRITS)?;
    Ok(Address::new(&trits_to_trytes(&trits)?)?)
}

/// Derive the address for `(seed, index, security)`, tagged with its
/// provenance. A pure function of its inputs.
pub fn generate_address(
    seed: &Seed,
    index: u32,
    security: SecurityLevel,
) -> Result<Address, CryptoError> {
    let private = key(seed, index, security)?;
    let digest_trits = digests(&private)?;
    let address = address_from_digests(&digest_trits)?;
    Ok(Address::derived(
        address.as_trytes().to_string(),
        index,
        security,
    ))
}

/// The 9-tryte checksum of an address: the tail of its Kerl hash.
pub fn checksum(address: &Address) -> Result<String, CryptoError> {
    let hash = Kerl::hash(&address.to_trits())?;
    let trytes = trits_to_trytes(&hash)?;
    Ok(trytes[HASH_TRYTES - CHECKSUM_TRYTES..].to_string())
}

/// The 90-tryte checksummed form shown to users.
pub fn address_with_checksum(address: &Address) -> Result<String, CryptoError> {
    let mut out = String::with_capacity(ADDRESS_WITH_CHECKSUM_TRYTES);
    out.push_str(address.as_trytes());
    out.push_str(&checksum(address)?);
    Ok(out)
}

/// Parse an address in either form: 81 trytes bare, or 90 trytes with a
/// checksum that must verify.
pub fn parse_address(input: &str) -> Result<Address, CryptoError> {
    match input.len() {
        HASH_TRYTES => Ok(Address::new(input)?),
        ADDRESS_WITH_CHECKSUM_TRYTES => {
            let address = Address::new(&input[..HASH_TRYTES])?;
            if checksum(&address)? != input[HASH_TRYTES..] {
                return Err(TypeError::ChecksumMismatch.into());
            }
            Ok(address)
        }
        other => Err(TypeError::AddressLength(other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Seed {
        Seed::new("TESTSEED9DONT9USE9IN9PRODUCTION99999FQWLKYKMDWDHUMAMESSKRTOQAINYVLRXQBRCCDOQLIWNT").unwrap()
    }

    #[test]
    fn test_subseed_varies_with_index() {
        let s = seed();
        let a = subseed(&s, 0).unwrap();
        let b = subseed(&s, 1).unwrap();
        assert_eq!(a.len(), HASH_TRITS);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_length_scales_with_security() {
        let s = seed();
        for level in [SecurityLevel::Low, SecurityLevel::Medium, SecurityLevel::High] {
            let k = key(&s, 0, level).unwrap();
            assert_eq!(k.trits().len(), level.key_trits());
            assert_eq!(digests(&k).unwrap().len(), level.digest_trits());
        }
    }

    #[test]
    fn test_address_is_deterministic() {
        let s = seed();
        let a = generate_address(&s, 3, SecurityLevel::Medium).unwrap();
        let b = generate_address(&s, 3, SecurityLevel::Medium).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key_index(), Some(3));
        assert_eq!(a.security(), Some(SecurityLevel::Medium));
    }

    #[test]
    fn test_addresses_differ_across_indices_and_levels() {
        let s = seed();
        let a = generate_address(&s, 0, SecurityLevel::Medium).unwrap();
        let b = generate_address(&s, 1, SecurityLevel::Medium).unwrap();
        let c = generate_address(&s, 0, SecurityLevel::Low).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_checksum_round_trip() {
        let address = generate_address(&seed(), 0, SecurityLevel::Medium).unwrap();
        let with_checksum = address_with_checksum(&address).unwrap();
        assert_eq!(with_checksum.len(), 90);
        let parsed = parse_address(&with_checksum).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let address = generate_address(&seed(), 0, SecurityLevel::Medium).unwrap();
        let mut with_checksum = address_with_checksum(&address).unwrap();
        // Flip the final checksum tryte.
        let last = with_checksum.pop().unwrap();
        with_checksum.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(
            parse_address(&with_checksum),
            Err(CryptoError::Type(TypeError::ChecksumMismatch))
        ));
    }

    #[test]
    fn test_parse_address_rejects_other_lengths() {
        assert!(parse_address(&"A".repeat(85)).is_err());
    }
}
