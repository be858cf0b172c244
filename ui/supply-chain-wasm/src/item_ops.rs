//! Item write and refresh handlers.
//!
//! Each handler runs one controller operation, reports the outcome with a
//! blocking alert and re-renders the table. Wired in `events.rs`.

use crate::dom::{self, Elements};
use crate::item_table::{self, PayRequest};
use crate::state;
use sc_dapp_core::DappError;
use tracing::{error, warn};

const TRANSACTION_FAILED: &str = "Transaction failed.";

pub async fn on_create_item(els: &Elements) {
    let Some(controller) = state::controller() else {
        return;
    };
    controller.set_draft_name(dom::get_input_value(&els.item_name));
    controller.set_draft_cost(dom::get_input_value(&els.cost));

    match controller.create_item_from_draft().await {
        Ok(receipt) => {
            let name = controller
                .last_transaction()
                .map(|t| t.item_name)
                .unwrap_or_default();
            sync_draft_inputs(els);
            item_table::render(els, &controller);
            dom::alert(&format!(
                "Item \"{name}\" created successfully.\nTransaction Hash: {}",
                receipt.tx_hash
            ));
        }
        Err(err) => report(&err),
    }
}

pub async fn on_pay(els: &Elements, request: PayRequest) {
    let Some(controller) = state::controller() else {
        return;
    };
    match controller
        .pay_for_item(request.index, &request.owner, request.price)
        .await
    {
        Ok(_) => item_table::render(els, &controller),
        Err(err) => {
            report(&err);
            // a stale step means the list itself is out of date
            if matches!(err, DappError::StaleStep { .. }) {
                on_refresh(els).await;
            }
        }
    }
}

pub async fn on_mark_delivered(els: &Elements) {
    let Some(controller) = state::controller() else {
        return;
    };
    controller.set_draft_index(dom::get_input_value(&els.deliver_index));

    match controller.mark_delivered_from_draft().await {
        Ok(_) => {
            sync_draft_inputs(els);
            item_table::render(els, &controller);
        }
        Err(err) => report(&err),
    }
}

pub async fn on_refresh(els: &Elements) {
    let Some(controller) = state::controller() else {
        return;
    };
    if let Err(err) = controller.refresh_items().await {
        warn!(error = %err, "refresh failed, showing previous list");
    }
    item_table::render(els, &controller);
}

/// Copy the controller's draft back into the form inputs.
fn sync_draft_inputs(els: &Elements) {
    if let Some(controller) = state::controller() {
        let draft = controller.view().draft;
        els.item_name.set_value(&draft.item_name);
        els.cost.set_value(&draft.cost);
        els.deliver_index.set_value(&draft.index);
    }
}

fn report(err: &DappError) {
    error!(error = %err, "item operation failed");
    if err.is_validation() {
        dom::alert(&err.to_string());
    } else {
        dom::alert(TRANSACTION_FAILED);
    }
}
