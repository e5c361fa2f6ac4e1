use ethers::types::H256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response envelope shared by every JSON-RPC method.
///
/// A node either returns a `result` (which may be `null`, e.g., for an unknown
/// transaction hash) or an `error` object.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse<T> {
    id: u64,
    jsonrpc: String,
    pub(crate) result: Option<T>,
    pub(crate) error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcErrorObject {
    pub(crate) code: i64,
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

impl JsonRpcRequest {
    pub(crate) fn method(&self) -> &str {
        &self.method
    }
}

/// Generates a JSON-RPC request for eth_blockNumber (the current chain height).
pub(crate) fn eth_block_number() -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_owned(),
        method: "eth_blockNumber".to_owned(),
        params: vec![],
        id: 1,
    }
}

/// Generates a JSON-RPC request for net_version (the network id deployments
/// are keyed by).
pub(crate) fn net_version() -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_owned(),
        method: "net_version".to_owned(),
        params: vec![],
        id: 1,
    }
}

/// Generates a JSON-RPC request for eth_getBlockByNumber for
/// the specified block (e.g., "0xabc", "latest", "finalized").
///
/// Only transaction hashes are requested, the bodies are fetched one by one
/// when needed.
pub(crate) fn get_block_by_number(block: &str) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_owned(),
        method: "eth_getBlockByNumber".to_owned(),
        params: vec![json!(block), Value::Bool(false)],
        id: 1,
    }
}

/// Generates a JSON-RPC request for eth_getTransactionReceipt for
/// the given transaction.
pub(crate) fn get_transaction_receipt(tx: &H256) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_owned(),
        method: "eth_getTransactionReceipt".to_owned(),
        params: vec![json!(tx)],
        id: 1,
    }
}

/// Generates a JSON-RPC request for eth_getTransactionByHash for
/// the given transaction.
pub(crate) fn get_transaction_by_hash(tx: &H256) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_owned(),
        method: "eth_getTransactionByHash".to_owned(),
        params: vec![json!(tx)],
        id: 1,
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{TransactionReceipt, U64};

    use super::*;

    #[test]
    fn test_block_request_omits_full_transactions() {
        let request = serde_json::to_value(get_block_by_number("0x2")).unwrap();
        assert_eq!(
            request,
            json!({
                "jsonrpc": "2.0",
                "method": "eth_getBlockByNumber",
                "params": ["0x2", false],
                "id": 1
            })
        );
    }

    #[test]
    fn test_receipt_request_uses_hex_hash() {
        let hash = H256::repeat_byte(0xab);
        let request = serde_json::to_value(get_transaction_receipt(&hash)).unwrap();
        assert_eq!(request["method"], "eth_getTransactionReceipt");
        assert_eq!(request["params"][0], json!(format!("0x{}", "ab".repeat(32))));
    }

    #[test]
    fn test_null_result_is_none() {
        let response: JsonRpcResponse<TransactionReceipt> =
            serde_json::from_str(r#"{"id":1,"jsonrpc":"2.0","result":null}"#).unwrap();
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_error_object_is_parsed() {
        let response: JsonRpcResponse<U64> = serde_json::from_str(
            r#"{"id":1,"jsonrpc":"2.0","error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "method not found");
    }

    #[test]
    fn test_block_number_is_hex_quantity() {
        let response: JsonRpcResponse<U64> =
            serde_json::from_str(r#"{"id":1,"jsonrpc":"2.0","result":"0x3"}"#).unwrap();
        assert_eq!(response.result, Some(U64::from(3)));
    }
}
