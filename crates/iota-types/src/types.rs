//! Validated tryte-string value types.
//!
//! Every type here enforces its length and alphabet at construction and is
//! immutable afterwards. `Seed` additionally zeroizes its backing storage on
//! drop, since it is the only long-lived secret in the library.

use crate::constants::{
    ADDRESS_WITH_CHECKSUM_TRYTES, HASH_TRYTES, InvalidSecurityLevel, SEED_TRYTES, TAG_TRYTES,
};
use crate::ternary::{self, TernaryError};
use crate::SecurityLevel;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error(transparent)]
    InvalidTrytes(#[from] TernaryError),

    #[error("seed longer than {SEED_TRYTES} trytes ({0})")]
    InvalidSeed(usize),

    #[error(transparent)]
    InvalidSecurityLevel(#[from] InvalidSecurityLevel),

    #[error("address must be {HASH_TRYTES} or {ADDRESS_WITH_CHECKSUM_TRYTES} trytes, got {0}")]
    AddressLength(usize),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("tag longer than {TAG_TRYTES} trytes ({0})")]
    TagLength(usize),

    #[error("hash must be {HASH_TRYTES} trytes, got {0}")]
    HashLength(usize),
}

fn pad_right(trytes: &str, len: usize) -> String {
    let mut s = String::with_capacity(len);
    s.push_str(trytes);
    while s.len() < len {
        s.push('9');
    }
    s
}

// =============================================================================
// Seed
// =============================================================================

/// An 81-tryte seed. The secret root of all key material.
///
/// Shorter inputs are right-padded with `9`; longer inputs are rejected.
/// The backing string is wiped when the seed is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed(String);

impl Seed {
    pub fn new(trytes: &str) -> Result<Self, TypeError> {
        if trytes.len() > SEED_TRYTES {
            return Err(TypeError::InvalidSeed(trytes.len()));
        }
        ternary::validate_trytes(trytes)?;
        Ok(Seed(pad_right(trytes, SEED_TRYTES)))
    }

    pub fn as_trytes(&self) -> &str {
        &self.0
    }

    pub fn to_trits(&self) -> Vec<i8> {
        ternary::trytes_to_trits(&self.0).expect("seed was validated on construction")
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

// =============================================================================
// Hash
// =============================================================================

/// An 81-tryte hash: transaction hash, bundle hash, trunk/branch reference.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Hash(String);

impl Hash {
    pub fn new(trytes: &str) -> Result<Self, TypeError> {
        if trytes.len() != HASH_TRYTES {
            return Err(TypeError::HashLength(trytes.len()));
        }
        ternary::validate_trytes(trytes)?;
        Ok(Hash(trytes.to_string()))
    }

    /// The all-`9` hash, used for unset references.
    pub fn null() -> Self {
        Hash("9".repeat(HASH_TRYTES))
    }

    pub fn is_null(&self) -> bool {
        self.0.bytes().all(|b| b == b'9')
    }

    pub fn as_trytes(&self) -> &str {
        &self.0
    }

    pub fn to_trits(&self) -> Vec<i8> {
        ternary::trytes_to_trits(&self.0).expect("hash was validated on construction")
    }

    /// Balanced value of each tryte, in `-13..=13`. The raw material for
    /// bundle-hash normalization.
    pub fn tryte_values(&self) -> Vec<i8> {
        self.0
            .chars()
            .map(|c| ternary::tryte_value(c).expect("hash was validated on construction"))
            .collect()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Address
// =============================================================================

/// An 81-tryte address, optionally carrying the derivation provenance
/// (key index and security level) when it was produced from a seed.
///
/// Construction does not verify checksums; `iota-crypto` owns the Kerl-based
/// checksum operations and offers checked parsing of 90-tryte input.
#[derive(Clone)]
pub struct Address {
    trytes: String,
    key_index: Option<u32>,
    security: Option<SecurityLevel>,
}

impl Address {
    /// Accepts exactly 81 trytes (no checksum).
    pub fn new(trytes: &str) -> Result<Self, TypeError> {
        if trytes.len() != HASH_TRYTES {
            return Err(TypeError::AddressLength(trytes.len()));
        }
        ternary::validate_trytes(trytes)?;
        Ok(Address {
            trytes: trytes.to_string(),
            key_index: None,
            security: None,
        })
    }

    /// An address derived from a seed, carrying its provenance.
    pub fn derived(trytes: String, key_index: u32, security: SecurityLevel) -> Self {
        debug_assert_eq!(trytes.len(), HASH_TRYTES);
        Address {
            trytes,
            key_index: Some(key_index),
            security: Some(security),
        }
    }

    pub fn as_trytes(&self) -> &str {
        &self.trytes
    }

    pub fn to_trits(&self) -> Vec<i8> {
        ternary::trytes_to_trits(&self.trytes).expect("address was validated on construction")
    }

    pub fn key_index(&self) -> Option<u32> {
        self.key_index
    }

    pub fn security(&self) -> Option<SecurityLevel> {
        self.security
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.trytes == other.trytes
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.trytes.hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.trytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.trytes)
    }
}

// =============================================================================
// Tag
// =============================================================================

/// A 27-tryte tag. Shorter inputs are right-padded with `9`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(trytes: &str) -> Result<Self, TypeError> {
        if trytes.len() > TAG_TRYTES {
            return Err(TypeError::TagLength(trytes.len()));
        }
        ternary::validate_trytes(trytes)?;
        Ok(Tag(pad_right(trytes, TAG_TRYTES)))
    }

    /// The all-`9` tag.
    pub fn empty() -> Self {
        Tag("9".repeat(TAG_TRYTES))
    }

    pub fn as_trytes(&self) -> &str {
        &self.0
    }

    pub fn to_trits(&self) -> Vec<i8> {
        ternary::trytes_to_trits(&self.0).expect("tag was validated on construction")
    }
}

impl Default for Tag {
    fn default() -> Self {
        Tag::empty()
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
