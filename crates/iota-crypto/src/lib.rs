//! Sponge hash primitives and the signing scheme.
//!
//! Two sponges operate on 243-trit blocks: `Curl`, the pure-ternary
//! permutation used for legacy fragment chaining and MAC stamping, and
//! `Kerl`, which wraps Keccak-384 behind a big-integer bridge and is used
//! wherever hashes cross the integer domain (key derivation, addresses,
//! bundle hashes). On top of them sit seed-based key derivation, the
//! Winternitz-style one-time signature over normalized bundle hashes, and
//! the address checksum.

pub mod curl;
pub mod hmac;
pub mod kerl;
pub mod key;
pub mod sign;

pub use curl::Curl;
pub use hmac::HmacKey;
pub use kerl::Kerl;
pub use key::PrivateKey;

use iota_types::{TernaryError, TypeError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("sponge input length {0} is not a positive multiple of 243")]
    BlockLength(usize),

    #[error("key fragment must be {expected} trits, got {actual}")]
    FragmentLength { expected: usize, actual: usize },

    #[error("HMAC key must be 81 trytes, got {0}")]
    HmacKeyLength(usize),

    #[error(transparent)]
    Ternary(#[from] TernaryError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// A stateful absorb/squeeze hash primitive over trit blocks.
///
/// Sponges are cheap to construct and not thread-safe; use a fresh instance
/// per logical hashing operation.
pub trait Sponge {
    fn absorb(&mut self, trits: &[i8]) -> Result<(), CryptoError>;

    fn squeeze_into(&mut self, out: &mut [i8]) -> Result<(), CryptoError>;

    fn reset(&mut self);

    fn squeeze(&mut self, len: usize) -> Result<Vec<i8>, CryptoError> {
        let mut out = vec![0i8; len];
        self.squeeze_into(&mut out)?;
        Ok(out)
    }
}
