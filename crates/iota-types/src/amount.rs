//! The `Iota` token amount.
//!
//! Balances are non-negative; transaction values are signed (inputs carry the
//! negated balance they spend). Both are modeled by one arbitrary-precision
//! type with explicit range checks when encoding into the fixed-width wire
//! field.

use crate::constants::MAX_SUPPLY;
use crate::ternary::{self, TernaryError};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount magnitude exceeds the maximum supply")]
    ExceedsSupply,

    #[error("negative amount where a balance is required")]
    Negative,

    #[error("not a valid decimal amount: {0:?}")]
    Parse(String),

    #[error(transparent)]
    Ternary(#[from] TernaryError),
}

/// A signed, arbitrary-precision token amount.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Iota(BigInt);

impl Iota {
    pub fn zero() -> Self {
        Iota(BigInt::zero())
    }

    /// A non-negative balance; rejects negative input.
    pub fn balance(value: i64) -> Result<Self, AmountError> {
        if value < 0 {
            return Err(AmountError::Negative);
        }
        Ok(Iota(BigInt::from(value)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    /// Encode into `len` trits of balanced ternary, rejecting magnitudes
    /// beyond the supply bound.
    pub fn to_trits(&self, len: usize) -> Result<Vec<i8>, AmountError> {
        if self.0.abs() > BigInt::from(MAX_SUPPLY) {
            return Err(AmountError::ExceedsSupply);
        }
        Ok(ternary::big_to_trits(&self.0, len)?)
    }

    pub fn from_trits(trits: &[i8]) -> Self {
        Iota(ternary::trits_to_big(trits))
    }
}

impl From<i64> for Iota {
    fn from(value: i64) -> Self {
        Iota(BigInt::from(value))
    }
}

impl FromStr for Iota {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<BigInt>()
            .map(Iota)
            .map_err(|_| AmountError::Parse(s.to_string()))
    }
}

impl Add for Iota {
    type Output = Iota;
    fn add(self, rhs: Iota) -> Iota {
        Iota(self.0 + rhs.0)
    }
}

impl Add<&Iota> for &Iota {
    type Output = Iota;
    fn add(self, rhs: &Iota) -> Iota {
        Iota(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Iota> for Iota {
    fn add_assign(&mut self, rhs: &Iota) {
        self.0 += &rhs.0;
    }
}

impl Sub for Iota {
    type Output = Iota;
    fn sub(self, rhs: Iota) -> Iota {
        Iota(self.0 - rhs.0)
    }
}

impl Sub<&Iota> for &Iota {
    type Output = Iota;
    fn sub(self, rhs: &Iota) -> Iota {
        Iota(&self.0 - &rhs.0)
    }
}

impl SubAssign<&Iota> for Iota {
    fn sub_assign(&mut self, rhs: &Iota) {
        self.0 -= &rhs.0;
    }
}

impl Neg for Iota {
    type Output = Iota;
    fn neg(self) -> Iota {
        Iota(-self.0)
    }
}

impl Neg for &Iota {
    type Output = Iota;
    fn neg(self) -> Iota {
        Iota(-&self.0)
    }
}

impl<'a> Sum<&'a Iota> for Iota {
    fn sum<I: Iterator<Item = &'a Iota>>(iter: I) -> Iota {
        let mut total = Iota::zero();
        for amount in iter {
            total += amount;
        }
        total
    }
}

impl fmt::Debug for Iota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iota({})", self.0)
    }
}

impl fmt::Display for Iota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
