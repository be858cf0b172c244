//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! The controller is set once bootstrap succeeds and never replaced.

use gloo_storage::{LocalStorage, Storage};
use sc_dapp_core::ItemController;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct AppState {
    pub controller: Option<Rc<ItemController>>,
}

// ── Thread-local singleton ──

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

// ── Convenience accessors ──

/// `None` until the session is ready.
pub fn controller() -> Option<Rc<ItemController>> {
    with(|s| s.controller.clone())
}

pub fn set_controller(controller: ItemController) -> Rc<ItemController> {
    let controller = Rc::new(controller);
    with_mut(|s| s.controller = Some(controller.clone()));
    controller
}

// ── localStorage helpers ──

pub fn local_get(key: &str) -> Option<String> {
    LocalStorage::get::<String>(key).ok()
}

pub fn local_set(key: &str, value: &str) {
    if let Err(err) = LocalStorage::set(key, value) {
        tracing::warn!(key, error = %err, "failed to persist setting");
    }
}
