//! Item table rendering.
//!
//! Rebuilds the rows from the controller's visible items and wires the
//! per-row Pay buttons.

use crate::dom::{self, Elements};
use crate::item_ops;
use sc_api_types::{Item, Step};
use sc_dapp_core::{ItemController, SortOrder, ViewState};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

pub fn render(els: &Elements, controller: &ItemController) {
    let view = controller.view();
    render_controls(els, &view);

    let items = controller.visible_items();
    let rows = &els.item_rows;
    if items.is_empty() {
        dom::set_inner_html(rows, r#"<tr class="empty"><td colspan="6">No items</td></tr>"#);
    } else {
        let html: String = items.iter().map(row_html).collect();
        dom::set_inner_html(rows, &html);
        wire_pay_buttons(els);
    }

    render_last_transaction(els, controller);
}

fn row_html(item: &Item) -> String {
    let action = match item.step {
        Step::Created => format!(
            r#"<button class="pay-btn" data-index="{}" data-owner="{}" data-price="{}">Pay</button>"#,
            item.index,
            dom::escape(&item.owner_address.0),
            item.price,
        ),
        Step::Paid | Step::Delivered => String::new(),
    };
    format!(
        r#"<tr>
          <td>{}</td>
          <td>{}</td>
          <td>{}</td>
          <td><span class="step {}">{}</span></td>
          <td><code>{}</code></td>
          <td>{}</td>
        </tr>"#,
        item.index,
        dom::escape(&item.name),
        item.price,
        item.step.css_class(),
        item.step.label(),
        dom::escape(&item.owner_address.0),
        action,
    )
}

fn render_controls(els: &Elements, view: &ViewState) {
    for tab in &els.filter_tabs {
        let active = tab.get_attribute("data-tab").as_deref() == Some(view.tab.as_str());
        dom::toggle_class(tab, "active", active);
    }
    for header in &els.sort_headers {
        let sorted = header.get_attribute("data-sort").as_deref() == Some(view.sort_key.as_str());
        dom::toggle_class(header, "sorted", sorted);
        dom::toggle_class(header, "asc", sorted && view.sort_order == SortOrder::Asc);
        dom::toggle_class(header, "desc", sorted && view.sort_order == SortOrder::Desc);
    }
}

fn render_last_transaction(els: &Elements, controller: &ItemController) {
    match controller.last_transaction() {
        Some(last) => {
            dom::set_text(&els.last_tx_item, &last.item_name);
            dom::set_text(&els.last_tx_hash, &last.tx_hash.0);
            dom::set_hidden(&els.last_tx_panel, false);
        }
        None => dom::set_hidden(&els.last_tx_panel, true),
    }
}

/// Wire click events on the freshly rendered Pay buttons.
fn wire_pay_buttons(els: &Elements) {
    for btn in dom::query_all_within(&els.item_rows, ".pay-btn") {
        let Some(request) = PayRequest::from_button(&btn) else {
            tracing::warn!("pay button without item data");
            continue;
        };
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els3 = els2.clone();
            let request = request.clone();
            wasm_bindgen_futures::spawn_local(async move {
                item_ops::on_pay(&els3, request).await;
            });
        }) as Box<dyn FnMut(_)>);
        if btn
            .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .is_ok()
        {
            cb.forget();
        }
    }
}

/// Payment details carried on a row's Pay button.
#[derive(Debug, Clone)]
pub struct PayRequest {
    pub index: u64,
    pub owner: sc_api_types::Address,
    pub price: sc_api_types::Wei,
}

impl PayRequest {
    fn from_button(btn: &web_sys::Element) -> Option<Self> {
        Some(Self {
            index: btn.get_attribute("data-index")?.parse().ok()?,
            owner: sc_api_types::Address(btn.get_attribute("data-owner")?),
            price: btn.get_attribute("data-price")?.parse().ok()?,
        })
    }
}
