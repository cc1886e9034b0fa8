//! JSON-RPC chain client over HTTP.

use crate::chain::{ChainClient, ChainClientError};
use crate::events::RawLog;
use crate::utils::hex::{format_hex_u64, parse_hex_u64};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

/// Talks `eth_*` JSON-RPC to a single node endpoint.
pub struct HttpChainClient {
    client: reqwest::Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpChainClient {
    /// # Errors
    ///
    /// Returns [`ChainClientError::Transport`] when the HTTP client
    /// cannot be constructed.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ChainClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ChainClientError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            request_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainClientError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "chain rpc request");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|error| ChainClientError::Transport(error.to_string()))?;
        let envelope: Value = response
            .json()
            .await
            .map_err(|error| ChainClientError::Transport(error.to_string()))?;

        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            return Err(ChainClientError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown rpc error")
                    .to_string(),
            });
        }
        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| ChainClientError::Malformed("response has no result field".to_string()))
    }
}

fn result_str(value: &Value, field: &str) -> Result<String, ChainClientError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ChainClientError::Malformed(format!("missing field {field}")))
}

fn result_u64(value: &Value, field: &str) -> Result<u64, ChainClientError> {
    let raw = result_str(value, field)?;
    parse_hex_u64(&raw).map_err(|error| ChainClientError::Malformed(error.to_string()))
}

fn log_from_value(value: &Value) -> Result<RawLog, ChainClientError> {
    let topics = value
        .get("topics")
        .and_then(Value::as_array)
        .ok_or_else(|| ChainClientError::Malformed("log has no topics array".to_string()))?
        .iter()
        .map(|topic| {
            topic
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ChainClientError::Malformed("non-string topic".to_string()))
        })
        .collect::<Result<Vec<String>, _>>()?;
    Ok(RawLog {
        address: result_str(value, "address")?,
        topics,
        data: result_str(value, "data")?,
        block_number: result_u64(value, "blockNumber")?,
        transaction_hash: result_str(value, "transactionHash")?,
        log_index: u32::try_from(result_u64(value, "logIndex")?)
            .map_err(|_| ChainClientError::Malformed("log index overflows u32".to_string()))?,
    })
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn get_block_number(&self) -> Result<u64, ChainClientError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainClientError::Malformed("non-string block number".to_string()))?;
        parse_hex_u64(raw).map_err(|error| ChainClientError::Malformed(error.to_string()))
    }

    async fn get_logs(
        &self,
        address: &str,
        from_block: u64,
        to_block: u64,
        topics: &[String],
    ) -> Result<Vec<RawLog>, ChainClientError> {
        let filter = json!([{
            "address": address,
            "fromBlock": format_hex_u64(from_block),
            "toBlock": format_hex_u64(to_block),
            "topics": topics,
        }]);
        let result = self.call("eth_getLogs", filter).await?;
        let logs = result
            .as_array()
            .ok_or_else(|| ChainClientError::Malformed("eth_getLogs result is not an array".to_string()))?;
        logs.iter().map(log_from_value).collect()
    }

    async fn get_block_timestamp(&self, number: u64) -> Result<u64, ChainClientError> {
        let result = self
            .call(
                "eth_getBlockByNumber",
                json!([format_hex_u64(number), false]),
            )
            .await?;
        if result.is_null() {
            return Err(ChainClientError::Malformed(format!(
                "block {number} not found"
            )));
        }
        result_u64(&result, "timestamp")
    }
}

impl std::fmt::Debug for HttpChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChainClient")
            .field("url", &self.url)
            .finish()
    }
}
