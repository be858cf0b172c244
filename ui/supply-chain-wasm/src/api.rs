//! Static asset fetching.

use crate::dom;
use anyhow::{Context, anyhow};
use sc_api_types::ContractArtifact;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

/// Fetch a URL and return the body as a plain string.
pub async fn fetch_text(url: &str) -> anyhow::Result<String> {
    let opts = RequestInit::new();
    opts.set_method("GET");

    let request = Request::new_with_str_and_init(url, &opts).map_err(|e| anyhow!("{e:?}"))?;

    let window = dom::window().map_err(|e| anyhow!("{e:?}"))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| anyhow!("fetch error: {e:?}"))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| anyhow!("not a Response"))?;

    let text = JsFuture::from(resp.text().map_err(|e| anyhow!("{e:?}"))?)
        .await
        .map_err(|e| anyhow!("text error: {e:?}"))?;
    let body = text.as_string().unwrap_or_default();

    if !resp.ok() {
        return Err(anyhow!("{} {}: {}", resp.status(), resp.status_text(), body));
    }
    Ok(body)
}

/// Load the contract build artifact holding the per-network deployments.
pub async fn load_artifact(url: &str) -> anyhow::Result<ContractArtifact> {
    let raw = fetch_text(url)
        .await
        .with_context(|| format!("failed to fetch contract artifact from {url}"))?;
    ContractArtifact::from_json(&raw).with_context(|| format!("invalid contract artifact at {url}"))
}
