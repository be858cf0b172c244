//! DOM element bindings.
//!
//! All fields are resolved once at startup. Rows of the item table are
//! rebuilt on every render and wired in `item_table.rs`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

// ── Helpers ──

pub fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn doc() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().ok()?.get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn query_all(selector: &str) -> Vec<Element> {
    doc()
        .and_then(|d| d.query_selector_all(selector))
        .map(|nl| collect_elements(&nl))
        .unwrap_or_default()
}

pub fn query_all_within(parent: &Element, selector: &str) -> Vec<Element> {
    parent
        .query_selector_all(selector)
        .map(|nl| collect_elements(&nl))
        .unwrap_or_default()
}

fn collect_elements(nl: &web_sys::NodeList) -> Vec<Element> {
    (0..nl.length())
        .filter_map(|i| nl.item(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect()
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_inner_html(el: &Element, html: &str) {
    el.set_inner_html(html);
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value()
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn set_hidden(el: &Element, hidden: bool) {
    toggle_class(el, "hidden", hidden);
}

pub fn alert(message: &str) {
    if let Ok(w) = window() {
        let _ = w.alert_with_message(message);
    }
}

/// Escape text for interpolation into generated markup.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Elements struct ──

/// All DOM element references used by the supply chain UI.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Layout
    pub loading: Element,
    pub app: Element,
    pub rpc_url: Option<HtmlInputElement>,

    // Create item
    pub item_name: HtmlInputElement,
    pub cost: HtmlInputElement,
    pub create_btn: HtmlElement,

    // Deliver
    pub deliver_index: HtmlInputElement,
    pub deliver_btn: HtmlElement,

    // List controls
    pub filter_tabs: Vec<Element>,
    pub sort_headers: Vec<Element>,
    pub search: HtmlInputElement,
    pub refresh_btn: HtmlElement,

    // Output
    pub item_rows: Element,
    pub last_tx_panel: Element,
    pub last_tx_item: Element,
    pub last_tx_hash: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once at module start.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            loading: get_el!("loading"),
            app: get_el!("app"),
            rpc_url: by_id_typed::<HtmlInputElement>("rpcUrl"),

            item_name: get_input!("itemName"),
            cost: get_input!("cost"),
            create_btn: get_html!("createItemBtn"),

            deliver_index: get_input!("deliverIndex"),
            deliver_btn: get_html!("deliverBtn"),

            filter_tabs: query_all(".filter-tab"),
            sort_headers: query_all("th[data-sort]"),
            search: get_input!("searchText"),
            refresh_btn: get_html!("refreshBtn"),

            item_rows: get_el!("itemRows"),
            last_tx_panel: get_el!("lastTransaction"),
            last_tx_item: get_el!("lastTxItem"),
            last_tx_hash: get_el!("lastTxHash"),
        })
    }
}
