//! Versioned, immutable item list snapshots.
//!
//! Each refresh takes a ticket before its first read. A finished refresh is
//! installed only if its ticket is newer than the installed snapshot, so an
//! overlapping slower refresh can never overwrite a fresher list.

use sc_api_types::Item;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// 0 until the first refresh lands.
    pub version: u64,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { version: u64, len: usize },
    Discarded { ticket: u64, current: u64 },
}

#[derive(Debug, Default)]
pub(crate) struct SnapshotStore {
    current: RwLock<Arc<ItemSnapshot>>,
    tickets: AtomicU64,
}

impl SnapshotStore {
    pub(crate) fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.tickets.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn current(&self) -> Arc<ItemSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn install(&self, ticket: RefreshTicket, items: Vec<Item>) -> RefreshOutcome {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 <= current.version {
            debug!(ticket = ticket.0, current = current.version, "discarding stale refresh");
            return RefreshOutcome::Discarded {
                ticket: ticket.0,
                current: current.version,
            };
        }

        let len = items.len();
        *current = Arc::new(ItemSnapshot {
            version: ticket.0,
            items,
        });
        RefreshOutcome::Applied {
            version: ticket.0,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_api_types::{Address, Step};

    fn item(index: u64) -> Item {
        Item {
            index,
            name: format!("item-{index}"),
            price: 10,
            step: Step::Created,
            owner_address: Address(format!("0x{index:040x}")),
        }
    }

    #[test]
    fn slower_older_refresh_is_discarded() {
        let store = SnapshotStore::default();
        let older = store.begin();
        let newer = store.begin();

        assert_eq!(
            store.install(newer, vec![item(0), item(1)]),
            RefreshOutcome::Applied { version: 2, len: 2 }
        );
        assert_eq!(
            store.install(older, vec![item(0)]),
            RefreshOutcome::Discarded { ticket: 1, current: 2 }
        );
        assert_eq!(store.current().items.len(), 2);
    }

    #[test]
    fn readers_keep_their_snapshot_across_installs() {
        let store = SnapshotStore::default();
        let first = store.begin();
        store.install(first, vec![item(0)]);
        let held = store.current();

        let second = store.begin();
        store.install(second, vec![item(0), item(1), item(2)]);

        assert_eq!(held.items.len(), 1);
        assert_eq!(store.current().version, 2);
    }
}
