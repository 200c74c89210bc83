use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blockchain::BlockSource;
use crate::error::RpcError;
use crate::models::TransactionRecord;

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Block body as returned by `eth_getBlockByNumber` with full transaction
/// objects.
#[derive(Debug, Deserialize)]
pub struct Block {
    pub transactions: Vec<TransactionRecord>,
}

/// JSON-RPC client for an Ethereum-family node.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Self {
        Self::with_timeout(endpoint, 30)
    }

    pub fn with_timeout(endpoint: String, timeout_seconds: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_seconds))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint,
        }
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: rand::random::<u32>() as u64,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let rpc_response: JsonRpcResponse = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("no result in response".to_string()))
    }

    /// Fetches the chain head via `eth_blockNumber`.
    pub async fn get_latest_block_number(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;

        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("block number is not a string".to_string()))?;
        parse_hex_to_u64(hex_string)
    }

    /// Fetches a block with full transaction objects via
    /// `eth_getBlockByNumber`.
    pub async fn get_block(&self, block_number: u64) -> Result<Block, RpcError> {
        let params = vec![
            Value::String(format!("0x{:x}", block_number)),
            Value::Bool(true), // full transaction objects, not just hashes
        ];

        let result = self.make_request("eth_getBlockByNumber", params).await?;

        if result.is_null() {
            return Err(RpcError::BlockNotFound { block_number });
        }

        serde_json::from_value(result).map_err(RpcError::Json)
    }
}

#[async_trait]
impl BlockSource for RpcClient {
    async fn latest_network_block(&self) -> Result<u64, RpcError> {
        self.get_latest_block_number().await
    }

    async fn parse_block(
        &self,
        block_number: u64,
    ) -> Result<Vec<TransactionRecord>, RpcError> {
        Ok(self.get_block(block_number).await?.transactions)
    }
}

fn parse_hex_to_u64(hex_str: &str) -> Result<u64, RpcError> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(digits, 16).map_err(|e| {
        RpcError::InvalidResponse(format!("failed to parse block number '{}': {}", hex_str, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "eth_blockNumber".to_string(),
            params: vec![],
            id: 1,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        let expected = r#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#;
        assert_eq!(serialized, expected);
    }

    #[test]
    fn test_parse_hex_to_u64() {
        assert_eq!(parse_hex_to_u64("0x1234").unwrap(), 0x1234u64);
        assert_eq!(parse_hex_to_u64("1234").unwrap(), 0x1234u64);
        assert_eq!(parse_hex_to_u64("0x0").unwrap(), 0u64);
        assert!(parse_hex_to_u64("invalid").is_err());
    }

    #[tokio::test]
    async fn test_latest_block_number_parses_hex_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x10d4f"
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        let head = client.get_latest_block_number().await.unwrap();
        assert_eq!(head, 0x10d4f);
    }

    #[tokio::test]
    async fn test_rpc_error_object_maps_to_method_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32601, "message": "Method not found" }
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        let result = client.get_latest_block_number().await;
        assert!(matches!(
            result,
            Err(RpcError::Method { code: -32601, .. })
        ));
    }

    #[tokio::test]
    async fn test_null_block_maps_to_block_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        let result = client.get_block(99).await;
        assert!(matches!(
            result,
            Err(RpcError::BlockNotFound { block_number: 99 })
        ));
    }

    #[tokio::test]
    async fn test_block_transactions_deserialize() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "number": "0x65",
                    "hash": "0xblockhash",
                    "transactions": [
                        {
                            "hash": "0xtx1",
                            "from": "0xaaa",
                            "to": "0xbbb",
                            "value": "0xde0b6b3a7640000",
                            "blockNumber": "0x65"
                        },
                        {
                            "hash": "0xtx2",
                            "from": "0xccc",
                            "to": null,
                            "value": "0x0",
                            "blockNumber": "0x65"
                        }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        let transactions = client.parse_block(0x65).await.unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].hash, "0xtx1");
        assert_eq!(transactions[0].block_number, "0x65");
        // Contract creation: null `to` comes through as empty.
        assert_eq!(transactions[1].to, "");
    }
}
