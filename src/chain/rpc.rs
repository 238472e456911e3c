//! JSON-RPC chain client
//!
//! Talks to a node over HTTP. Every response carries either a `Result` or an
//! `Error { Code, Message, StackTrace }`; a populated error is logged with
//! its trace and surfaced as [`Error::Rpc`].

use super::ChainQuery;
use crate::config::RpcConfig;
use crate::market::{AssetId, PoolPair, PoolSnapshot};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use url::Url;

pub const METHOD_BEACON_BEST_STATE: &str = "getbeaconbeststate";
pub const METHOD_PDE_STATE: &str = "getpdestate";

/// Error object reported by the node
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RpcErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

/// Response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

impl<T> RpcResponse<T> {
    /// Unwrap the envelope, turning a node-reported error into [`Error::Rpc`]
    pub fn into_result(self, method: &str) -> Result<T> {
        if let Some(err) = self.error {
            tracing::error!(
                method = method,
                code = err.code,
                stack_trace = err.stack_trace.as_deref().unwrap_or(""),
                "{}: call RPC error",
                method
            );
            return Err(Error::Rpc {
                message: err.message,
                stack_trace: err.stack_trace,
            });
        }

        self.result
            .ok_or_else(|| Error::rpc(format!("{}: empty result", method)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BeaconBestState {
    beacon_height: u64,
}

#[derive(Debug, Deserialize)]
struct WirePoolPair {
    #[serde(rename = "Token1IDStr")]
    token1_id: String,
    #[serde(rename = "Token1PoolValue")]
    token1_pool_value: u64,
    #[serde(rename = "Token2IDStr")]
    token2_id: String,
    #[serde(rename = "Token2PoolValue")]
    token2_pool_value: u64,
}

impl From<WirePoolPair> for PoolPair {
    fn from(wire: WirePoolPair) -> Self {
        PoolPair {
            token1_id: AssetId::from(wire.token1_id),
            token1_pool_value: wire.token1_pool_value,
            token2_id: AssetId::from(wire.token2_id),
            token2_pool_value: wire.token2_pool_value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PdeState {
    #[serde(rename = "PDEPoolPairs", default)]
    pool_pairs: HashMap<String, WirePoolPair>,
}

impl PdeState {
    fn into_snapshot(self, height: u64) -> PoolSnapshot {
        let pairs = self
            .pool_pairs
            .into_iter()
            .map(|(key, pair)| (key, PoolPair::from(pair)))
            .collect();
        PoolSnapshot::new(height, pairs)
    }
}

/// HTTP JSON-RPC implementation of [`ChainQuery`]
pub struct RpcChainClient {
    client: Client,
    url: Url,
}

impl RpcChainClient {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url().clone(),
        }
    }

    /// Create with a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(config: &RpcConfig, client: Client) -> Self {
        Self {
            client,
            url: config.url().clone(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Call `method` and decode its `Result`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let body = request_body(method, params);
        tracing::debug!(method = method, url = %self.url, "RPC call");

        let response: RpcResponse<T> = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result(method)
    }
}

fn request_body(method: &str, params: Vec<Value>) -> Value {
    json!({
        "jsonrpc": "1.0",
        "method": method,
        "params": params,
        "id": 1
    })
}

#[async_trait]
impl ChainQuery for RpcChainClient {
    async fn latest_height(&self) -> Result<u64> {
        let state: BeaconBestState = self.call(METHOD_BEACON_BEST_STATE, vec![]).await?;
        Ok(state.beacon_height)
    }

    async fn pool_state(&self, height: u64) -> Result<PoolSnapshot> {
        let params = vec![json!({ "BeaconHeight": height })];
        let state: PdeState = self.call(METHOD_PDE_STATE, params).await?;
        Ok(state.into_snapshot(height))
    }
}
