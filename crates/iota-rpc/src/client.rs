//! Single-endpoint HTTP client.
//!
//! POSTs each command as JSON with the `X-IOTA-API-Version` header, retries
//! idempotent commands with exponential backoff on transient failures, and
//! supports cooperative cancellation of every in-flight call.

use crate::error::RpcError;
use crate::node::{
    Acknowledgement, FindTransactionsQuery, GetBalancesResponse, GetNodeInfoResponse,
    HashesResponse, NodeCommand, TangleNode, TransactionsToApprove, TrytesResponse,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Header carrying the protocol version expected by deployed nodes.
const API_VERSION_HEADER: &str = "X-IOTA-API-Version";

/// Configuration for a node client.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Node endpoint (e.g., `http://localhost:14265`).
    pub url: String,
    /// Value for the API version header.
    pub api_version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry attempts for idempotent commands on transient failure.
    pub retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub retry_delay: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:14265".to_string(),
            api_version: "1".to_string(),
            timeout: Duration::from_secs(60),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Async client for a remote node.
pub struct NodeClient {
    http: reqwest::Client,
    config: NodeConfig,
    cancel: Option<CancellationToken>,
}

impl NodeClient {
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Self::with_config(NodeConfig {
            url: url.trim_end_matches('/').to_string(),
            ..Default::default()
        })
    }

    pub fn with_config(config: NodeConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Transport {
                command: "<client construction>".to_string(),
                source: e,
            })?;
        Ok(Self {
            http,
            config,
            cancel: None,
        })
    }

    /// Attach a cancellation token; once triggered, every in-flight and
    /// subsequent call resolves to `RpcError::Cancelled`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn guarded<T, F>(&self, fut: F) -> Result<T, RpcError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(RpcError::Cancelled),
                result = fut => result,
            },
            None => fut.await,
        }
    }

    /// Dispatch one command, applying the retry policy when it is safe.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        command: &NodeCommand,
    ) -> Result<T, RpcError> {
        let attempts = if command.is_idempotent() {
            self.config.retries + 1
        } else {
            1
        };

        let mut delay = self.config.retry_delay;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.guarded(self.dispatch(command)).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    debug!(command = command.name(), attempt, "retrying after transient failure");
                    self.guarded(async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn dispatch<T: DeserializeOwned>(&self, command: &NodeCommand) -> Result<T, RpcError> {
        let name = command.name();
        debug!(command = name, "dispatching node command");

        let mut headers = HeaderMap::new();
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(&self.config.api_version).map_err(|_| RpcError::Node {
                command: name.to_string(),
                message: "invalid API version header value".to_string(),
            })?,
        );

        let response = self
            .http
            .post(&self.config.url)
            .headers(headers)
            .json(command)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                command: name.to_string(),
                source: e,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| RpcError::Transport {
            command: name.to_string(),
            source: e,
        })?;

        if status != 200 {
            return Err(RpcError::HttpStatus {
                command: name.to_string(),
                status,
                body: body.chars().take(500).collect(),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| RpcError::Json {
            command: name.to_string(),
            source: e,
        })?;

        // HTTP 200 with an error payload is a logical node failure.
        for key in ["error", "exception"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return Err(RpcError::Node {
                    command: name.to_string(),
                    message: message.to_string(),
                });
            }
        }

        serde_json::from_value(value).map_err(|e| RpcError::Json {
            command: name.to_string(),
            source: e,
        })
    }
}

impl TangleNode for NodeClient {
    async fn get_balances(
        &self,
        addresses: Vec<String>,
        threshold: u8,
    ) -> Result<GetBalancesResponse, RpcError> {
        self.execute(&NodeCommand::GetBalances {
            addresses,
            threshold,
        })
        .await
    }

    async fn get_transactions_to_approve(
        &self,
        depth: u32,
        reference: Option<String>,
    ) -> Result<TransactionsToApprove, RpcError> {
        self.execute(&NodeCommand::GetTransactionsToApprove { depth, reference })
            .await
    }

    async fn attach_to_tangle(
        &self,
        trunk: String,
        branch: String,
        min_weight_magnitude: u32,
        trytes: Vec<String>,
    ) -> Result<Vec<String>, RpcError> {
        let response: TrytesResponse = self
            .execute(&NodeCommand::AttachToTangle {
                trunk_transaction: trunk,
                branch_transaction: branch,
                min_weight_magnitude,
                trytes,
            })
            .await?;
        Ok(response.trytes)
    }

    async fn store_transactions(&self, trytes: Vec<String>) -> Result<(), RpcError> {
        let _: Acknowledgement = self
            .execute(&NodeCommand::StoreTransactions { trytes })
            .await?;
        Ok(())
    }

    async fn broadcast_transactions(&self, trytes: Vec<String>) -> Result<(), RpcError> {
        let _: Acknowledgement = self
            .execute(&NodeCommand::BroadcastTransactions { trytes })
            .await?;
        Ok(())
    }

    async fn find_transactions(
        &self,
        query: FindTransactionsQuery,
    ) -> Result<Vec<String>, RpcError> {
        let response: HashesResponse = self
            .execute(&NodeCommand::FindTransactions {
                bundles: query.bundles,
                addresses: query.addresses,
                tags: query.tags,
                approvees: query.approvees,
            })
            .await?;
        Ok(response.hashes)
    }
}

impl NodeClient {
    /// Node metadata; handy as a connectivity probe.
    pub async fn get_node_info(&self) -> Result<GetNodeInfoResponse, RpcError> {
        self.execute(&NodeCommand::GetNodeInfo).await
    }

    /// Current tip hashes known to the node.
    pub async fn get_tips(&self) -> Result<Vec<String>, RpcError> {
        let response: HashesResponse = self.execute(&NodeCommand::GetTips).await?;
        Ok(response.hashes)
    }
}
