//! Chain access.
//!
//! [`ChainClient`] is the seam between the poller and the node. The
//! production implementation is [`HttpChainClient`]; tests substitute
//! scripted clients.

pub mod rpc;

pub use rpc::HttpChainClient;

use crate::events::RawLog;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Read-only view of an EVM node, narrowed to what polling needs.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head block number.
    async fn get_block_number(&self) -> Result<u64, ChainClientError>;

    /// Logs emitted by `address` matching `topics` within the inclusive
    /// block range.
    async fn get_logs(
        &self,
        address: &str,
        from_block: u64,
        to_block: u64,
        topics: &[String],
    ) -> Result<Vec<RawLog>, ChainClientError>;

    /// Unix timestamp of one block.
    async fn get_block_timestamp(&self, number: u64) -> Result<u64, ChainClientError>;
}
