//! The `RpcTransport` trait: the seam between request builders and the
//! connection that carries them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TransportError;
use crate::methods::MethodCall;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Transport health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Connected and serving requests.
    Healthy,
    /// Serving, but recovering from recent connection failures.
    Degraded,
    /// Stopped permanently; calls fail immediately.
    Unhealthy,
    /// Not yet connected.
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An async JSON-RPC transport.
///
/// Implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the correlated response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Send a batch of JSON-RPC requests.
    ///
    /// Default implementation sends them sequentially.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let mut responses = Vec::with_capacity(reqs.len());
        for req in reqs {
            responses.push(self.send(req).await?);
        }
        Ok(responses)
    }

    fn health(&self) -> HealthStatus {
        HealthStatus::Unknown
    }

    /// The endpoint this transport talks to.
    fn url(&self) -> &str;

    /// Call a method with a fresh random id and deserialize the result.
    async fn call<T: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, TransportError> {
        let req = JsonRpcRequest::with_random_id(method, params);
        let resp = self.send(req).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        Ok(serde_json::from_value(result)?)
    }

    /// Execute a typed request built by [`crate::methods`].
    async fn execute<T: DeserializeOwned + Send>(
        &self,
        call: MethodCall<T>,
    ) -> Result<T, TransportError> {
        let resp = self.send(call.request()).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        call.decode(result)
    }
}
