//! Client configuration, loadable from JSON.

use std::time::Duration;

use chainsock_core::Uint256;
use chainsock_filter::PollerConfig;
use chainsock_ws::{ReconnectConfig, WsTransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Everything [`crate::Web3Client::connect`] needs.
///
/// Durations are in milliseconds; every field but `url` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `ws://host:port` or any `ws(s)://` URL.
    pub url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_queue_poll_ms")]
    pub queue_poll_ms: u64,
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
    /// Consecutive tolerable connection failures before giving up.
    #[serde(default = "default_fail_threshold")]
    pub fail_threshold: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Reconnect after a tolerable failure.
    #[serde(default = "bool_true")]
    pub restart: bool,
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,
    /// First block the poller delivers. Defaults to the head at start.
    #[serde(default)]
    pub start_block: Option<u64>,
}

fn default_request_timeout_ms() -> u64 { 15_000 }
fn default_queue_poll_ms() -> u64 { 1_000 }
fn default_close_grace_ms() -> u64 { 1_000 }
fn default_fail_threshold() -> u32 { 10 }
fn default_backoff_ms() -> u64 { 1_000 }
fn default_block_time_ms() -> u64 { 8_000 }
fn bool_true() -> bool { true }

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout_ms: default_request_timeout_ms(),
            queue_poll_ms: default_queue_poll_ms(),
            close_grace_ms: default_close_grace_ms(),
            fail_threshold: default_fail_threshold(),
            backoff_ms: default_backoff_ms(),
            restart: true,
            block_time_ms: default_block_time_ms(),
            start_block: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ClientError::Config(format!(
                "url must be ws:// or wss://, got '{}'",
                self.url
            )));
        }
        if self.fail_threshold == 0 {
            return Err(ClientError::Config("fail_threshold must be at least 1".into()));
        }
        if self.block_time_ms < 2 {
            return Err(ClientError::Config("block_time_ms must be at least 2".into()));
        }
        Ok(())
    }

    pub fn transport_config(&self) -> WsTransportConfig {
        WsTransportConfig {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            queue_poll: Duration::from_millis(self.queue_poll_ms),
            close_grace: Duration::from_millis(self.close_grace_ms),
            reconnect: ReconnectConfig {
                fail_threshold: self.fail_threshold,
                backoff: Duration::from_millis(self.backoff_ms),
                restart: self.restart,
            },
        }
    }

    pub fn poller_config(&self) -> Result<PollerConfig, ClientError> {
        let block_time = Duration::from_millis(self.block_time_ms);
        Ok(PollerConfig {
            block_time,
            start_block: self.start_block.map(Uint256::try_from).transpose()?,
            query_timeout: block_time,
        })
    }
}
