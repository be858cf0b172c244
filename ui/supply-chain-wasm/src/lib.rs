//! Supply chain dApp WASM front-end.
//!
//! Connects to a wallet (or a local node), loads the `ItemManager`
//! deployment and drives the item form and table.

pub mod api;
pub mod dom;
pub mod events;
pub mod injected;
pub mod item_ops;
pub mod item_table;
pub mod logging;
pub mod state;

use sc_chain_client::DeploymentRegistry;
use sc_dapp_core::{DappConfig, ItemController, LoadState, bootstrap};
use tracing::{error, info};
use wasm_bindgen::prelude::*;

const LOAD_FAILED: &str = "Failed to load web3, accounts, or contract.";

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    let config = load_config(&els);
    events::bind_config_events(&els);

    let artifact = match api::load_artifact(&config.artifact_url).await {
        Ok(artifact) => artifact,
        Err(err) => {
            error!(error = %format!("{err:#}"), "contract artifact unavailable");
            dom::alert(LOAD_FAILED);
            return Ok(());
        }
    };
    let registry = DeploymentRegistry::from_artifact(&artifact);
    let discovery = injected::BrowserDiscovery::new(config);

    let result = bootstrap(&discovery, &registry).await;
    if let Err(err) = &result {
        error!(error = %err, "bootstrap failed");
    }

    match LoadState::from_bootstrap(result) {
        LoadState::Ready(session) => {
            info!(account = ?session.primary_account(), "ready");
            state::set_controller(ItemController::new(session));
            dom::set_hidden(&els.loading, true);
            dom::set_hidden(&els.app, false);
            events::bind_events(&els);
            item_ops::on_refresh(&els).await;
        }
        LoadState::Loading => {}
        LoadState::Failed(_) => dom::alert(LOAD_FAILED),
    }
    Ok(())
}

/// Settings stored in localStorage, with a typed `#rpcUrl` taking precedence.
fn load_config(els: &dom::Elements) -> DappConfig {
    let typed = els
        .rpc_url
        .as_ref()
        .map(dom::get_input_value)
        .filter(|v| !v.trim().is_empty());
    let config = DappConfig::from_lookup(state::local_get).with_rpc_override(typed.clone());

    if typed.is_none() {
        if let Some(input) = &els.rpc_url {
            input.set_value(&config.fallback_rpc_url);
        }
    }
    config
}
