//! Node command and response envelopes, and the `TangleNode` seam.
//!
//! One tagged request enum covers every command the core consumes; each
//! case serializes to the wire shape the node expects. Responses tolerate
//! unknown fields, since deployed nodes decorate them freely.

use crate::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Requests
// =============================================================================

/// A request to the node, tagged by its `command` field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeCommand {
    GetBalances {
        addresses: Vec<String>,
        threshold: u8,
    },
    GetTransactionsToApprove {
        depth: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    AttachToTangle {
        trunk_transaction: String,
        branch_transaction: String,
        min_weight_magnitude: u32,
        trytes: Vec<String>,
    },
    StoreTransactions {
        trytes: Vec<String>,
    },
    BroadcastTransactions {
        trytes: Vec<String>,
    },
    FindTransactions {
        #[serde(skip_serializing_if = "Option::is_none")]
        bundles: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        addresses: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tags: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        approvees: Option<Vec<String>>,
    },
    GetTips,
    GetNodeInfo,
}

impl NodeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            NodeCommand::GetBalances { .. } => "getBalances",
            NodeCommand::GetTransactionsToApprove { .. } => "getTransactionsToApprove",
            NodeCommand::AttachToTangle { .. } => "attachToTangle",
            NodeCommand::StoreTransactions { .. } => "storeTransactions",
            NodeCommand::BroadcastTransactions { .. } => "broadcastTransactions",
            NodeCommand::FindTransactions { .. } => "findTransactions",
            NodeCommand::GetTips => "getTips",
            NodeCommand::GetNodeInfo => "getNodeInfo",
        }
    }

    /// Whether repeating the command on the node has the same effect.
    /// `attachToTangle` mints fresh nonces, so a blind retry would put a
    /// second copy of the bundle on the tangle.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, NodeCommand::AttachToTangle { .. })
    }
}

/// Filter set for `findTransactions`; any subset of the four keys.
#[derive(Debug, Clone, Default)]
pub struct FindTransactionsQuery {
    pub bundles: Option<Vec<String>>,
    pub addresses: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub approvees: Option<Vec<String>>,
}

impl FindTransactionsQuery {
    pub fn by_addresses(addresses: Vec<String>) -> Self {
        FindTransactionsQuery {
            addresses: Some(addresses),
            ..Default::default()
        }
    }

    pub fn by_bundles(bundles: Vec<String>) -> Self {
        FindTransactionsQuery {
            bundles: Some(bundles),
            ..Default::default()
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// `getBalances` response; balances arrive as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBalancesResponse {
    pub balances: Vec<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub milestone_index: Option<u64>,
}

/// `getTransactionsToApprove` response: the two tips to reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsToApprove {
    pub trunk_transaction: String,
    pub branch_transaction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrytesResponse {
    pub trytes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashesResponse {
    pub hashes: Vec<String>,
}

/// Acknowledgement for store/broadcast; nodes may report a duration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub duration: Option<u64>,
}

/// `getNodeInfo` response. Only the identity fields are typed; the rest of
/// the metadata is kept as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNodeInfoResponse {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub latest_milestone: Option<String>,
    #[serde(default)]
    pub latest_milestone_index: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// =============================================================================
// TangleNode
// =============================================================================

/// The node operations the transfer pipeline depends on.
///
/// `NodeClient` is the production implementation; tests substitute an
/// in-process double.
#[allow(async_fn_in_trait)]
pub trait TangleNode {
    async fn get_balances(
        &self,
        addresses: Vec<String>,
        threshold: u8,
    ) -> Result<GetBalancesResponse, RpcError>;

    async fn get_transactions_to_approve(
        &self,
        depth: u32,
        reference: Option<String>,
    ) -> Result<TransactionsToApprove, RpcError>;

    async fn attach_to_tangle(
        &self,
        trunk: String,
        branch: String,
        min_weight_magnitude: u32,
        trytes: Vec<String>,
    ) -> Result<Vec<String>, RpcError>;

    async fn store_transactions(&self, trytes: Vec<String>) -> Result<(), RpcError>;

    async fn broadcast_transactions(&self, trytes: Vec<String>) -> Result<(), RpcError>;

    async fn find_transactions(
        &self,
        query: FindTransactionsQuery,
    ) -> Result<Vec<String>, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serializes_with_tag() {
        let cmd = NodeCommand::GetBalances {
            addresses: vec!["A".repeat(81)],
            threshold: 100,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "getBalances");
        assert_eq!(json["threshold"], 100);
        assert!(json["addresses"].is_array());
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let cmd = NodeCommand::AttachToTangle {
            trunk_transaction: "T".repeat(81),
            branch_transaction: "B".repeat(81),
            min_weight_magnitude: 14,
            trytes: vec![],
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert!(json.get("trunkTransaction").is_some());
        assert!(json.get("branchTransaction").is_some());
        assert!(json.get("minWeightMagnitude").is_some());
    }

    #[test]
    fn test_absent_filters_are_omitted() {
        let cmd = NodeCommand::FindTransactions {
            bundles: None,
            addresses: Some(vec!["A".repeat(81)]),
            tags: None,
            approvees: None,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert!(json.get("bundles").is_none());
        assert!(json.get("addresses").is_some());
    }

    #[test]
    fn test_unit_commands_serialize() {
        let json = serde_json::to_value(NodeCommand::GetNodeInfo).unwrap();
        assert_eq!(json, serde_json::json!({ "command": "getNodeInfo" }));
    }

    #[test]
    fn test_idempotence_classification() {
        assert!(NodeCommand::GetTips.is_idempotent());
        assert!(NodeCommand::StoreTransactions { trytes: vec![] }.is_idempotent());
        assert!(!NodeCommand::AttachToTangle {
            trunk_transaction: String::new(),
            branch_transaction: String::new(),
            min_weight_magnitude: 0,
            trytes: vec![],
        }
        .is_idempotent());
    }

    #[test]
    fn test_balances_response_parses() {
        let json = serde_json::json!({
            "balances": ["114544444", "0"],
            "milestone": "M",
            "milestoneIndex": 128,
            "duration": 30,
        });
        let resp: GetBalancesResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.balances.len(), 2);
        assert_eq!(resp.milestone_index, Some(128));
    }
}
