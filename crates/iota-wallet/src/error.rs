//! Wallet error types.

use iota_crypto::CryptoError;
use iota_rpc::RpcError;
use iota_tx::TxError;
use iota_types::{AmountError, Iota, TernaryError, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("not enough balance: need {needed}, found {available}")]
    NotEnoughBalance { needed: Iota, available: Iota },

    #[error("transfer has no recipients")]
    NoTransfers,

    #[error("bundle layout broken at transaction {index}: expected a zero-value carrier at the input address")]
    BundleLayout { index: usize },

    #[error("no input matches the spending transaction at index {0}")]
    UnknownInput(usize),

    #[error("no unused address within {0} indices")]
    AddressSearchExhausted(u32),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Ternary(#[from] TernaryError),

    #[error(transparent)]
    Amount(#[from] AmountError),
}
