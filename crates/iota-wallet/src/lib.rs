//! Wallet core: seed-based account operations and the transfer pipeline.
//!
//! `Wallet` ties the lower layers together: it derives addresses from its
//! seed, discovers spendable inputs through a node, assembles and signs
//! bundles, and drives the attach/store/broadcast submission pipeline.

pub mod error;
pub mod transfer;
pub mod wallet;

pub use error::WalletError;
pub use transfer::{Input, SendOptions, SentBundle, Transfer};
pub use wallet::Wallet;
