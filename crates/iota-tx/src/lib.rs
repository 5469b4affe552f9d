//! Transaction wire codec and bundle construction.
//!
//! A transaction is a fixed 2673-tryte record; a bundle is an ordered group
//! of transactions committing to one bundle hash over their shared essence.
//! Bundles are mutable while being built and frozen by `finalize`.

pub mod bundle;
pub mod transaction;

pub use bundle::Bundle;
pub use transaction::Transaction;

use iota_crypto::CryptoError;
use iota_types::{AmountError, TernaryError, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("transaction must be 2673 trytes, got {0}")]
    TransactionLength(usize),

    #[error("signature fragment must be 2187 trytes, got {0}")]
    FragmentLength(usize),

    #[error("nonce must be 27 trytes, got {0}")]
    NonceLength(usize),

    #[error("field {field} holds an out-of-range value")]
    FieldRange { field: &'static str },

    #[error("bundle has no transactions")]
    EmptyBundle,

    #[error("bundle is already finalized")]
    AlreadyFinalized,

    #[error("bundle is not finalized")]
    NotFinalized,

    #[error("transaction index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("invalid bundle: {0}")]
    BundleInvalid(String),

    #[error(transparent)]
    Ternary(#[from] TernaryError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
