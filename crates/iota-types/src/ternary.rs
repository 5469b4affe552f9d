//! Balanced-ternary codecs.
//!
//! Conversions between the tryte alphabet, signed trits in `{-1, 0, 1}`,
//! native integers, and the 48-byte two's-complement encoding that bridges
//! 243-trit blocks into the Keccak-384 byte domain.
//!
//! All functions are total: invalid symbols, lengths, or out-of-range values
//! surface as `TernaryError`, never as silent truncation.

use crate::constants::{HASH_TRITS, KERL_BYTES, TRITS_PER_TRYTE, TRYTE_ALPHABET};
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TernaryError {
    #[error("invalid tryte character '{0}'")]
    InvalidTryte(char),

    #[error("invalid trit value {0}, must be -1, 0 or 1")]
    InvalidTrit(i8),

    #[error("trit length {0} is not a multiple of 3")]
    LengthNotMultipleOfThree(usize),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("value does not fit the target width")]
    ValueOutOfRange,
}

/// Balanced value of a single tryte symbol, in `-13..=13`.
pub fn tryte_value(symbol: char) -> Result<i8, TernaryError> {
    let index = TRYTE_ALPHABET
        .find(symbol)
        .ok_or(TernaryError::InvalidTryte(symbol))? as i8;
    Ok(if index > 13 { index - 27 } else { index })
}

/// The three trits of a tryte value in `-13..=13`, least significant first.
pub fn value_to_trits(value: i8) -> [i8; TRITS_PER_TRYTE] {
    let mut v = value;
    let mut out = [0i8; TRITS_PER_TRYTE];
    for trit in out.iter_mut() {
        let mut r = v % 3;
        v /= 3;
        if r > 1 {
            r -= 3;
            v += 1;
        } else if r < -1 {
            r += 3;
            v -= 1;
        }
        *trit = r;
    }
    out
}

/// Check that a string consists only of tryte symbols.
pub fn validate_trytes(trytes: &str) -> Result<(), TernaryError> {
    match trytes.chars().find(|c| !TRYTE_ALPHABET.contains(*c)) {
        Some(bad) => Err(TernaryError::InvalidTryte(bad)),
        None => Ok(()),
    }
}

/// Convert a tryte string to trits, three per symbol, least significant
/// trit first within each tryte.
pub fn trytes_to_trits(trytes: &str) -> Result<Vec<i8>, TernaryError> {
    let mut trits = Vec::with_capacity(trytes.len() * TRITS_PER_TRYTE);
    for symbol in trytes.chars() {
        trits.extend_from_slice(&value_to_trits(tryte_value(symbol)?));
    }
    Ok(trits)
}

/// Convert trits back to a tryte string. The length must be a multiple of 3.
pub fn trits_to_trytes(trits: &[i8]) -> Result<String, TernaryError> {
    if trits.len() % TRITS_PER_TRYTE != 0 {
        return Err(TernaryError::LengthNotMultipleOfThree(trits.len()));
    }
    let alphabet = TRYTE_ALPHABET.as_bytes();
    let mut trytes = String::with_capacity(trits.len() / TRITS_PER_TRYTE);
    for triple in trits.chunks_exact(TRITS_PER_TRYTE) {
        for &t in triple {
            if !(-1..=1).contains(&t) {
                return Err(TernaryError::InvalidTrit(t));
            }
        }
        let value = triple[0] as i32 + 3 * triple[1] as i32 + 9 * triple[2] as i32;
        let index = ((value % 27) + 27) % 27;
        trytes.push(alphabet[index as usize] as char);
    }
    Ok(trytes)
}

/// Balanced-ternary evaluation of a trit slice, least significant first.
pub fn trits_to_big(trits: &[i8]) -> BigInt {
    let mut acc = BigInt::zero();
    for &t in trits.iter().rev() {
        acc = acc * 3 + BigInt::from(t);
    }
    acc
}

/// Balanced-ternary digits of `n`, right-extended with zeros to `len`.
/// Fails if `n` does not fit in `len` trits.
pub fn big_to_trits(n: &BigInt, len: usize) -> Result<Vec<i8>, TernaryError> {
    let three = BigInt::from(3);
    let mut trits = vec![0i8; len];
    let mut n = n.clone();
    for trit in trits.iter_mut() {
        if n.is_zero() {
            break;
        }
        let r = ((&n % &three) + &three) % &three;
        if r.is_zero() {
            n /= &three;
        } else if r.is_one() {
            *trit = 1;
            n = (n - BigInt::one()) / &three;
        } else {
            *trit = -1;
            n = (n + BigInt::one()) / &three;
        }
    }
    if !n.is_zero() {
        return Err(TernaryError::ValueOutOfRange);
    }
    Ok(trits)
}

/// Balanced ternary of a signed machine integer, right-extended to `len`.
pub fn int_to_trits(n: i64, len: usize) -> Result<Vec<i8>, TernaryError> {
    big_to_trits(&BigInt::from(n), len)
}

/// Evaluate trits as a signed machine integer; fails on overflow.
pub fn trits_to_int(trits: &[i8]) -> Result<i64, TernaryError> {
    trits_to_big(trits)
        .to_i64()
        .ok_or(TernaryError::ValueOutOfRange)
}

/// Encode a 243-trit block into 48 bytes for the Keccak domain.
///
/// Trit 242 is ignored (treated as zero); the remaining 242 trits are
/// evaluated as a signed big integer and written big-endian two's-complement.
pub fn trits_to_bytes(trits: &[i8]) -> Result<[u8; KERL_BYTES], TernaryError> {
    if trits.len() != HASH_TRITS {
        return Err(TernaryError::InvalidLength {
            expected: HASH_TRITS,
            actual: trits.len(),
        });
    }
    let n = trits_to_big(&trits[..HASH_TRITS - 1]);
    let magnitude = n.to_signed_bytes_be();
    if magnitude.len() > KERL_BYTES {
        return Err(TernaryError::ValueOutOfRange);
    }
    let pad = if n.is_negative() { 0xFF } else { 0x00 };
    let mut bytes = [pad; KERL_BYTES];
    bytes[KERL_BYTES - magnitude.len()..].copy_from_slice(&magnitude);
    Ok(bytes)
}

/// Decode 48 bytes back into a 243-trit block; trit 242 is forced to zero.
pub fn bytes_to_trits(bytes: &[u8]) -> Result<Vec<i8>, TernaryError> {
    if bytes.len() != KERL_BYTES {
        return Err(TernaryError::InvalidLength {
            expected: KERL_BYTES,
            actual: bytes.len(),
        });
    }
    let n = BigInt::from_signed_bytes_be(bytes);
    let mut trits = big_to_trits(&n, HASH_TRITS)?;
    trits[HASH_TRITS - 1] = 0;
    Ok(trits)
}

/// Balanced-ternary addition with carry, truncated to the length of `lhs`.
pub fn add(lhs: &[i8], rhs: &[i8]) -> Vec<i8> {
    let mut out = lhs.to_vec();
    let mut carry = 0i8;
    for i in 0..out.len() {
        let b = rhs.get(i).copied().unwrap_or(0);
        let mut sum = out[i] + b + carry;
        if sum > 1 {
            sum -= 3;
            carry = 1;
        } else if sum < -1 {
            sum += 3;
            carry = -1;
        } else {
            carry = 0;
        }
        out[i] = sum;
    }
    out
}

/// In-place balanced-ternary increment by one unit.
pub fn increment(trits: &mut [i8]) {
    for trit in trits.iter_mut() {
        *trit += 1;
        if *trit > 1 {
            *trit = -1;
        } else {
            break;
        }
    }
}
