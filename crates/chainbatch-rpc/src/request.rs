//! JSON-RPC 2.0 wire types and the Ethereum call objects the endpoint sends.

use alloy_primitives::{Address, Bytes, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Value::from(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Value::from(id),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// The result value, `Null` when absent, or the node's error object.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Transaction object for `eth_call` and `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

/// The only receipt field the endpoint reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptStatus {
    /// `0x1` on success, `0x0` on revert. Absent on pre-Byzantium chains.
    pub status: Option<U64>,
}

impl ReceiptStatus {
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s == U64::from(1)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(7, "eth_call", vec![json!("latest")]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"eth_call\""));
        assert!(json.contains("\"id\":7"));
    }

    #[test]
    fn transaction_request_omits_empty_fields() {
        let tx = TransactionRequest {
            from: None,
            to: Address::repeat_byte(0x11),
            value: None,
            data: Bytes::new(),
        };
        let v = serde_json::to_value(&tx).unwrap();
        assert!(v.get("from").is_none());
        assert!(v.get("value").is_none());
        assert_eq!(v["data"], "0x");
    }

    #[test]
    fn value_is_hex_quantity() {
        let tx = TransactionRequest {
            from: Some(Address::ZERO),
            to: Address::ZERO,
            value: Some(U256::from(255u64)),
            data: Bytes::from(vec![0xab]),
        };
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["value"], "0xff");
        assert_eq!(v["data"], "0xab");
    }

    #[test]
    fn response_into_result_error() {
        let resp = JsonRpcResponse::err(1, 3, "execution reverted");
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, 3);
    }

    #[test]
    fn receipt_status() {
        let ok: ReceiptStatus = serde_json::from_value(json!({ "status": "0x1" })).unwrap();
        assert!(ok.succeeded());
        let failed: ReceiptStatus = serde_json::from_value(json!({ "status": "0x0" })).unwrap();
        assert!(!failed.succeeded());
    }
}
