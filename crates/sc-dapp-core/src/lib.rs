//! Supply chain dApp core: session bootstrap and the item view-model.
//!
//! Everything here is platform neutral; the browser front-end supplies the
//! providers through [`bootstrap::ProviderDiscovery`].

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod error;
pub mod snapshot;
pub mod view;

pub use bootstrap::{LoadState, ProviderDiscovery, ProviderKind, Session, bootstrap};
pub use config::DappConfig;
pub use controller::{ItemController, LastTransaction, parse_cost, parse_index};
pub use error::DappError;
pub use snapshot::{ItemSnapshot, RefreshOutcome};
pub use view::{DraftForm, FilterTab, SortKey, SortOrder, ViewState, compute_visible_items};
