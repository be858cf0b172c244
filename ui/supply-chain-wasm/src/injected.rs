//! Wallet providers injected into the page, plus provider discovery.
//!
//! `window.ethereum` speaks EIP-1193 (`request({method, params})` returning a
//! promise). The older `window.web3.currentProvider` only offers the
//! callback based `sendAsync(payload, cb)`.

use anyhow::anyhow;
use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use sc_chain_client::{ChainError, ChainProvider, ChainResult, RpcTransport, Web3Provider};
use sc_dapp_core::{DappConfig, ProviderDiscovery};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

// ── Modern provider ──

pub struct Eip1193Transport {
    ethereum: JsValue,
}

impl Eip1193Transport {
    pub fn new(ethereum: JsValue) -> Self {
        Self { ethereum }
    }
}

#[async_trait(?Send)]
impl RpcTransport for Eip1193Transport {
    async fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        debug!(method, "injected request");
        let args = to_js(&json!({ "method": method, "params": params }))?;
        let request = method_of(&self.ethereum, "request")?;
        let promise: Promise = request
            .call1(&self.ethereum, &args)
            .map_err(provider_error)?
            .dyn_into()
            .map_err(|_| ChainError::Transport(anyhow!("ethereum.request did not return a promise")))?;

        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        from_js(result)
    }

    async fn pause(&self, interval: Duration) {
        gloo_timers::future::sleep(interval).await;
    }
}

// ── Legacy provider ──

pub struct LegacyTransport {
    provider: JsValue,
    next_id: Cell<u64>,
}

#[derive(Serialize)]
struct LegacyPayload<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    result: Value,
    error: Option<LegacyError>,
}

#[derive(Deserialize)]
struct LegacyError {
    code: i64,
    message: String,
}

impl LegacyTransport {
    pub fn new(provider: JsValue) -> Self {
        Self {
            provider,
            next_id: Cell::new(1),
        }
    }
}

#[async_trait(?Send)]
impl RpcTransport for LegacyTransport {
    async fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        debug!(method, id, "legacy request");

        let payload = to_js(&LegacyPayload {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })?;
        let send_async = method_of(&self.provider, "sendAsync")?;
        let provider = self.provider.clone();

        let mut dispatch_error = None;
        let promise = Promise::new(&mut |resolve: Function, reject: Function| {
            let callback = Closure::once_into_js(move |err: JsValue, response: JsValue| {
                if err.is_null() || err.is_undefined() {
                    let _ = resolve.call1(&JsValue::NULL, &response);
                } else {
                    let _ = reject.call1(&JsValue::NULL, &err);
                }
            });
            if let Err(err) = send_async.call2(&provider, &payload, &callback) {
                dispatch_error = Some(err);
            }
        });
        if let Some(err) = dispatch_error {
            return Err(provider_error(err));
        }

        let raw = JsFuture::from(promise).await.map_err(provider_error)?;
        let response: LegacyResponse = serde_wasm_bindgen::from_value(raw)
            .map_err(|e| ChainError::Decode(format!("legacy response: {e}")))?;
        match response.error {
            Some(err) => Err(ChainError::from_rpc(err.code, err.message)),
            None => Ok(response.result),
        }
    }

    async fn pause(&self, interval: Duration) {
        gloo_timers::future::sleep(interval).await;
    }
}

// ── Discovery ──

/// Looks for wallets on `window`, falling back to the configured local node.
pub struct BrowserDiscovery {
    config: DappConfig,
}

impl BrowserDiscovery {
    pub fn new(config: DappConfig) -> Self {
        Self { config }
    }

    fn global(path: &[&str]) -> Option<JsValue> {
        let mut value: JsValue = web_sys::window()?.into();
        for key in path {
            value = Reflect::get(&value, &JsValue::from_str(key)).ok()?;
            if value.is_undefined() || value.is_null() {
                return None;
            }
        }
        Some(value)
    }
}

impl ProviderDiscovery for BrowserDiscovery {
    fn injected(&self) -> Option<Arc<dyn ChainProvider>> {
        let ethereum = Self::global(&["ethereum"])?;
        let provider = Web3Provider::new(Eip1193Transport::new(ethereum))
            .with_receipt_poll_interval(self.config.receipt_poll_interval());
        Some(Arc::new(provider))
    }

    fn legacy(&self) -> Option<Arc<dyn ChainProvider>> {
        let current = Self::global(&["web3", "currentProvider"])?;
        let provider = Web3Provider::new(LegacyTransport::new(current))
            .with_receipt_poll_interval(self.config.receipt_poll_interval());
        Some(Arc::new(provider))
    }

    fn local_fallback(&self) -> Arc<dyn ChainProvider> {
        Arc::new(sc_chain_jsonrpc::local_provider(
            &self.config.fallback_rpc_url,
            self.config.receipt_poll_interval(),
        ))
    }
}

// ── JS interop helpers ──

fn method_of(target: &JsValue, name: &str) -> ChainResult<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| ChainError::Unsupported(format!("provider has no {name}()")))
}

fn to_js<T: Serialize>(value: &T) -> ChainResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ChainError::Encode(e.to_string()))
}

fn from_js(value: JsValue) -> ChainResult<Value> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| ChainError::Decode(e.to_string()))
}

/// Wallet errors carry `{code, message}`; anything else is a transport failure.
fn provider_error(err: JsValue) -> ChainError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ChainError::from_rpc(code as i64, message),
        None => ChainError::Transport(anyhow!(message)),
    }
}
