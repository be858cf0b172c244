//! Front-end settings, resolved once at load.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const RPC_URL_KEY: &str = "sc_rpc_url";
pub const RECEIPT_POLL_KEY: &str = "sc_receipt_poll_ms";
pub const ARTIFACT_URL_KEY: &str = "sc_artifact_url";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappConfig {
    /// Node used when no wallet is injected into the page, without a
    /// trailing slash.
    pub fallback_rpc_url: String,
    pub receipt_poll_interval_ms: u64,
    /// Where the contract build artifact (with its `networks` map) is served.
    pub artifact_url: String,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            fallback_rpc_url: "http://127.0.0.1:7545".to_owned(),
            receipt_poll_interval_ms: 1_000,
            artifact_url: "contracts/ItemManager.json".to_owned(),
        }
    }
}

impl DappConfig {
    /// Defaults overridden by whatever `lookup` returns for the known keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(RECEIPT_POLL_KEY) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.receipt_poll_interval_ms = ms,
                _ => warn!("ignoring invalid {RECEIPT_POLL_KEY} '{raw}'"),
            }
        }
        if let Some(url) = lookup(ARTIFACT_URL_KEY).filter(|v| !v.trim().is_empty()) {
            config.artifact_url = url.trim().to_owned();
        }

        config.with_rpc_override(lookup(RPC_URL_KEY))
    }

    pub fn with_rpc_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|v| !v.trim().is_empty()) {
            self.fallback_rpc_url = url.trim().trim_end_matches('/').to_owned();
        }
        self
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
