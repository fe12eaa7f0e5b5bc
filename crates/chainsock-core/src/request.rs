//! JSON-RPC 2.0 wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request ID: string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl RpcId {
    pub fn number(n: u64) -> Self {
        Self::Number(n)
    }

    /// A fresh random 128-bit id rendered as `0x` + 32 hex digits.
    ///
    /// Correlation over a shared connection relies on ids never colliding
    /// between in-flight requests.
    pub fn random() -> Self {
        Self::String(format!("0x{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A single JSON-RPC parameter value.
pub type RpcParam = Value;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: RpcId,
    pub params: Vec<RpcParam>,
}

impl JsonRpcRequest {
    pub fn new(id: RpcId, method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            id,
            params,
        }
    }

    /// Build a request with a fresh random id.
    pub fn with_random_id(method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self::new(RpcId::random(), method, params)
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

fn default_version() -> String {
    "2.0".into()
}

impl JsonRpcResponse {
    /// Successful response carrying `result`.
    pub fn success(id: RpcId, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn failure(id: RpcId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns `true` if this is a successful response (no error object).
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Unwrap the result value or return the node's error. A missing
    /// `result` reads as JSON `null`.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(RpcId::number(1), "eth_blockNumber", vec![]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"eth_blockNumber\""));
        assert!(json.contains("\"params\":[]"));
    }

    #[test]
    fn random_ids_are_128_bit_hex() {
        let a = RpcId::random();
        let b = RpcId::random();
        assert_ne!(a, b);
        let RpcId::String(s) = a else {
            panic!("expected string id");
        };
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 34);
        assert!(s[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn response_into_result_ok() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"0xab","result":"0x12345"}"#).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.id, RpcId::String("0xab".into()));
        let val = resp.into_result().unwrap();
        assert_eq!(val, Value::String("0x12345".into()));
    }

    #[test]
    fn response_into_result_error() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"id":1,"error":{"code":-32000,"message":"execution reverted"}}"#,
        )
        .unwrap();
        assert!(!resp.is_ok());
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, -32000);
        assert!(err.data.is_none());
    }

    #[test]
    fn null_result_is_ok() {
        let resp = JsonRpcResponse::success(RpcId::number(3), Value::Null);
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }
}
