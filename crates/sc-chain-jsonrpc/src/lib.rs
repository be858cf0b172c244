use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sc_chain_client::{ChainError, ChainResult, RpcTransport, Web3Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// JSON-RPC 2.0 over HTTP POST, used for the local node fallback.
///
/// The endpoint arrives already resolved from `DappConfig`.
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Provider for a local node, polling receipts at `receipt_poll_interval`.
pub fn local_provider(endpoint: &str, receipt_poll_interval: Duration) -> Web3Provider<HttpTransport> {
    Web3Provider::new(HttpTransport::new(endpoint)).with_receipt_poll_interval(receipt_poll_interval)
}

// ── JSON-RPC envelope ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[async_trait(?Send)]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(endpoint = %self.endpoint, method, id = body.id, "json-rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("json-rpc {method} transport"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("json-rpc {method} HTTP {status}: {text}").into());
        }

        let body: RpcResponse = response
            .json()
            .await
            .with_context(|| format!("json-rpc {method} parse"))?;

        if let Some(err) = body.error {
            return Err(ChainError::from_rpc(err.code, err.message));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    async fn pause(&self, interval: Duration) {
        #[cfg(not(target_arch = "wasm32"))]
        tokio::time::sleep(interval).await;
        #[cfg(target_arch = "wasm32")]
        gloo_timers::future::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_chain_client::ChainProvider;

    #[test]
    fn endpoint_is_trimmed() {
        let transport = HttpTransport::new(" http://localhost:8545/ ");
        assert_eq!(transport.endpoint(), "http://localhost:8545");
    }

    #[test]
    fn request_envelope_is_json_rpc_2() -> anyhow::Result<()> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "net_version",
            params: serde_json::json!([]),
        };
        let value = serde_json::to_value(&body)?;
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "net_version");
        Ok(())
    }

    #[test]
    fn error_object_maps_rejection() -> anyhow::Result<()> {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User denied"}}"#,
        )?;
        let err = response.error.map(|e| ChainError::from_rpc(e.code, e.message));
        assert!(matches!(err, Some(ChainError::UserRejected)));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let provider = local_provider("http://127.0.0.1:1", Duration::from_millis(10));
        assert!(matches!(provider.network_id().await, Err(ChainError::Transport(_))));
    }
}
