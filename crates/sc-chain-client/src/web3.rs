//! Ethereum JSON-RPC implementation of [`ChainProvider`] over any [`RpcTransport`].

use crate::abi::{from_hex_data, to_hex_data};
use crate::{ChainError, ChainProvider, ChainResult, MethodCall, RpcTransport, Token};
use async_trait::async_trait;
use sc_api_types::{Address, NetworkId, TransactionRequest, TxHash, TxReceipt, Wei};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

pub struct Web3Provider<T> {
    transport: T,
    receipt_poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "blockNumber")]
    block_number: Option<String>,
}

impl<T: RpcTransport> Web3Provider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn submit(&self, tx: Value) -> ChainResult<TxReceipt> {
        let raw = self.transport.request("eth_sendTransaction", json!([tx])).await?;
        let tx_hash = TxHash(expect_str(&raw, "eth_sendTransaction")?.to_owned());
        debug!(%tx_hash, "transaction submitted, waiting for receipt");
        self.wait_for_receipt(tx_hash).await
    }

    /// Poll until the node returns a receipt. No deadline: the wallet or
    /// node decides when a transaction is dropped.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt> {
        loop {
            let raw = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx_hash.0]))
                .await?;
            if raw.is_null() {
                self.transport.pause(self.receipt_poll_interval).await;
                continue;
            }

            let receipt: RpcReceipt = serde_json::from_value(raw)
                .map_err(|e| ChainError::Decode(format!("transaction receipt: {e}")))?;

            // pre-byzantium receipts carry no status
            let status = receipt.status.as_deref().map(parse_quantity).transpose()?;
            if status == Some(0) {
                return Err(ChainError::Reverted { tx_hash });
            }

            let block_number = receipt
                .block_number
                .as_deref()
                .map(parse_quantity)
                .transpose()?
                .and_then(|n| u64::try_from(n).ok());

            return Ok(TxReceipt {
                tx_hash,
                block_number,
            });
        }
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport> ChainProvider for Web3Provider<T> {
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        let raw = self.transport.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(raw)
    }

    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        let raw = self.transport.request("eth_accounts", json!([])).await?;
        parse_accounts(raw)
    }

    async fn network_id(&self) -> ChainResult<NetworkId> {
        let raw = self.transport.request("net_version", json!([])).await?;
        let id = match &raw {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| ChainError::Decode(format!("network id {n} is not a u64")))?,
            Value::String(s) => u64::try_from(parse_quantity(s)?)
                .map_err(|_| ChainError::Decode(format!("network id {s} is too large")))?,
            other => return Err(ChainError::Decode(format!("unexpected net_version result {other}"))),
        };
        Ok(NetworkId(id))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> ChainResult<TxReceipt> {
        self.submit(json!({
            "from": tx.from.0,
            "to": tx.to.0,
            "value": to_quantity(tx.value),
        }))
        .await
    }

    async fn call(&self, contract: &Address, method: &MethodCall) -> ChainResult<Vec<Token>> {
        let data = to_hex_data(&method.encode()?);
        let raw = self
            .transport
            .request("eth_call", json!([{ "to": contract.0, "data": data }, "latest"]))
            .await?;
        let bytes = from_hex_data(expect_str(&raw, "eth_call")?)?;
        method.decode_output(&bytes)
    }

    async fn send(&self, contract: &Address, method: &MethodCall, from: &Address) -> ChainResult<TxReceipt> {
        let data = to_hex_data(&method.encode()?);
        self.submit(json!({
            "from": from.0,
            "to": contract.0,
            "data": data,
        }))
        .await
    }
}

/// Hex quantity as used in JSON-RPC payloads.
pub fn to_quantity(value: Wei) -> String {
    format!("0x{value:x}")
}

/// Accepts `0x`-prefixed hex or plain decimal.
pub fn parse_quantity(raw: &str) -> ChainResult<u128> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x") {
        Some("") => Ok(0),
        Some(hex) => u128::from_str_radix(hex, 16),
        None => raw.parse::<u128>(),
    };
    parsed.map_err(|e| ChainError::Decode(format!("invalid quantity '{raw}': {e}")))
}

fn parse_accounts(raw: Value) -> ChainResult<Vec<Address>> {
    let accounts: Vec<String> = serde_json::from_value(raw)
        .map_err(|e| ChainError::Decode(format!("account list: {e}")))?;
    Ok(accounts.into_iter().map(Address).collect())
}

fn expect_str<'a>(raw: &'a Value, method: &str) -> ChainResult<&'a str> {
    raw.as_str()
        .ok_or_else(|| ChainError::Decode(format!("{method} returned {raw}, expected a string")))
}
