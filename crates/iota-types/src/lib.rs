//! Core types and ternary codecs for the IOTA client library.
//!
//! This crate provides the foundational pieces used across all workspace
//! crates: trit/tryte/integer conversions (including the 48-byte big-integer
//! bridge used by the Kerl sponge), validated tryte-string newtypes, security
//! levels, and the arbitrary-precision `Iota` amount.

pub mod amount;
pub mod constants;
pub mod ternary;
pub mod types;

pub use amount::{AmountError, Iota};
pub use constants::SecurityLevel;
pub use ternary::TernaryError;
pub use types::{Address, Hash, Seed, Tag, TypeError};
