//! Node RPC client.
//!
//! Every node call is a JSON object POSTed to a single endpoint, selected by
//! its `command` field. The client adds the protocol version header, retries
//! idempotent commands on transient failures, and maps logical error
//! payloads and transport failures into distinct error variants.

pub mod client;
pub mod error;
pub mod node;

pub use client::{NodeClient, NodeConfig};
pub use error::RpcError;
pub use node::{
    FindTransactionsQuery, GetBalancesResponse, GetNodeInfoResponse, NodeCommand, TangleNode,
    TransactionsToApprove,
};

/// Default confirmation threshold for balance queries.
pub const DEFAULT_BALANCE_THRESHOLD: u8 = 100;
