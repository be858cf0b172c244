//! Event binding.
//!
//! Wires all static UI event listeners. Async handlers are spawned via
//! `wasm_bindgen_futures::spawn_local`.

use crate::dom::{self, Elements};
use crate::item_ops;
use crate::item_table;
use crate::state;
use sc_dapp_core::{FilterTab, SortKey, config};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;

/// Helper: attach async click handler to an HtmlElement.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        listen(&$el, "click", cb);
    }};
}

/// Helper: attach sync handler for `input` events.
macro_rules! on_input {
    ($el:expr, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::Event)>);
        listen(&$el, "input", cb);
    }};
}

fn listen<E: ?Sized + WasmClosure>(target: &web_sys::EventTarget, event: &str, cb: Closure<E>) {
    match target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref()) {
        Ok(()) => cb.forget(),
        Err(err) => tracing::warn!(event, error = ?err, "failed to bind listener"),
    }
}

/// Bind all UI event listeners. Call once the controller is installed.
pub fn bind_events(els: &Elements) {
    // ── Writes ──
    on_click_async!(els.create_btn, els, item_ops::on_create_item);
    on_click_async!(els.deliver_btn, els, item_ops::on_mark_delivered);
    on_click_async!(els.refresh_btn, els, item_ops::on_refresh);

    // ── Draft form ──
    on_input!(els.item_name, |e: web_sys::Event| {
        if let (Some(c), Some(v)) = (state::controller(), input_value(&e)) {
            c.set_draft_name(v);
        }
    });
    on_input!(els.cost, |e: web_sys::Event| {
        if let (Some(c), Some(v)) = (state::controller(), input_value(&e)) {
            c.set_draft_cost(v);
        }
    });
    on_input!(els.deliver_index, |e: web_sys::Event| {
        if let (Some(c), Some(v)) = (state::controller(), input_value(&e)) {
            c.set_draft_index(v);
        }
    });

    // ── Search ──
    {
        let els2 = els.clone();
        on_input!(els.search, move |e: web_sys::Event| {
            if let (Some(c), Some(v)) = (state::controller(), input_value(&e)) {
                c.set_search_text(v);
                item_table::render(&els2, &c);
            }
        });
    }

    // ── Filter tabs ──
    for tab in &els.filter_tabs {
        let Some(filter) = tab.get_attribute("data-tab").as_deref().and_then(FilterTab::parse) else {
            continue;
        };
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            if let Some(c) = state::controller() {
                c.set_tab(filter);
                item_table::render(&els2, &c);
            }
        }) as Box<dyn FnMut(_)>);
        listen(tab, "click", cb);
    }

    // ── Sort headers ──
    for header in &els.sort_headers {
        let Some(key) = header.get_attribute("data-sort").as_deref().and_then(SortKey::parse) else {
            continue;
        };
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            if let Some(c) = state::controller() {
                c.select_sort(key);
                item_table::render(&els2, &c);
            }
        }) as Box<dyn FnMut(_)>);
        listen(header, "click", cb);
    }
}

/// Persist the fallback node override; it takes effect on the next load.
pub fn bind_config_events(els: &Elements) {
    if let Some(rpc_url) = &els.rpc_url {
        on_input!(rpc_url, |e: web_sys::Event| {
            if let Some(v) = input_value(&e) {
                state::local_set(config::RPC_URL_KEY, v.trim());
            }
        });
    }
}

fn input_value(e: &web_sys::Event) -> Option<String> {
    e.target()?
        .dyn_into::<web_sys::HtmlInputElement>()
        .ok()
        .map(|input| dom::get_input_value(&input))
}
