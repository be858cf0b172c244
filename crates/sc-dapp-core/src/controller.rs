//! Item view-model: the cached item list, the draft form and the write
//! operations that keep both in step with the contract.

use crate::bootstrap::Session;
use crate::error::DappError;
use crate::snapshot::{ItemSnapshot, RefreshOutcome, SnapshotStore};
use crate::view::{FilterTab, SortKey, ViewState, compute_visible_items};
use sc_api_types::{Address, Item, ItemIndex, Step, TxHash, TxReceipt, Wei};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};

/// Most recent successful item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastTransaction {
    pub item_name: String,
    pub tx_hash: TxHash,
}

pub struct ItemController {
    session: Session,
    snapshots: SnapshotStore,
    view: RwLock<ViewState>,
    last_transaction: RwLock<Option<LastTransaction>>,
}

impl ItemController {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            snapshots: SnapshotStore::default(),
            view: RwLock::new(ViewState::default()),
            last_transaction: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> Arc<ItemSnapshot> {
        self.snapshots.current()
    }

    /// Re-read every item and install the result as one new snapshot.
    pub async fn refresh_items(&self) -> Result<RefreshOutcome, DappError> {
        let ticket = self.snapshots.begin();
        let contract = self.session.contract();

        let count = contract.get_index().await.map_err(|err| {
            warn!(error = %err, "failed to read item count");
            DappError::ReadFailure(err)
        })?;

        let mut items = Vec::new();
        for index in 0..count {
            let item = contract.get_item(index).await.map_err(|err| {
                warn!(index, error = %err, "failed to read item, keeping previous list");
                DappError::ReadFailure(err)
            })?;
            items.push(item);
        }

        let outcome = self.snapshots.install(ticket, items);
        if let RefreshOutcome::Applied { version, len } = outcome {
            info!(version, items = len, "item list refreshed");
        }
        Ok(outcome)
    }

    pub async fn create_item(&self, name: &str, cost: &str) -> Result<TxReceipt, DappError> {
        let cost = parse_cost(cost)?;
        let from = self.sender()?;

        let receipt = self
            .session
            .contract()
            .create_item(name, cost, &from)
            .await
            .map_err(|err| write_failure("createItem", err))?;
        info!(tx_hash = %receipt.tx_hash, item = name, cost = %cost, "item created");

        *write(&self.last_transaction) = Some(LastTransaction {
            item_name: name.to_owned(),
            tx_hash: receipt.tx_hash.clone(),
        });
        {
            let mut view = write(&self.view);
            view.draft.item_name.clear();
            view.draft.cost.clear();
        }
        self.refresh_after_write("createItem").await;
        Ok(receipt)
    }

    pub async fn create_item_from_draft(&self) -> Result<TxReceipt, DappError> {
        let draft = read(&self.view).draft.clone();
        self.create_item(&draft.item_name, &draft.cost).await
    }

    /// Send exactly `price` to the item's payment address.
    pub async fn pay_for_item(&self, index: ItemIndex, owner_address: &Address, price: Wei) -> Result<TxReceipt, DappError> {
        self.expect_step(index, Step::Created)?;
        let from = self.sender()?;

        let receipt = self
            .session
            .contract()
            .pay(owner_address, price, &from)
            .await
            .map_err(|err| write_failure("pay", err))?;
        info!(tx_hash = %receipt.tx_hash, index, price = %price, "item paid");

        self.refresh_after_write("pay").await;
        Ok(receipt)
    }

    pub async fn mark_delivered(&self, index: ItemIndex) -> Result<TxReceipt, DappError> {
        self.expect_step(index, Step::Paid)?;
        let from = self.sender()?;

        let receipt = self
            .session
            .contract()
            .trigger_delivery(index, &from)
            .await
            .map_err(|err| write_failure("triggerDelivery", err))?;
        info!(tx_hash = %receipt.tx_hash, index, "item delivered");

        write(&self.view).draft.index.clear();
        self.refresh_after_write("triggerDelivery").await;
        Ok(receipt)
    }

    pub async fn mark_delivered_from_draft(&self) -> Result<TxReceipt, DappError> {
        let raw = read(&self.view).draft.index.clone();
        self.mark_delivered(parse_index(&raw)?).await
    }

    pub fn set_draft_name(&self, value: impl Into<String>) {
        write(&self.view).draft.item_name = value.into();
    }

    pub fn set_draft_cost(&self, value: impl Into<String>) {
        write(&self.view).draft.cost = value.into();
    }

    pub fn set_draft_index(&self, value: impl Into<String>) {
        write(&self.view).draft.index = value.into();
    }

    pub fn set_tab(&self, tab: FilterTab) {
        write(&self.view).tab = tab;
    }

    pub fn set_search_text(&self, value: impl Into<String>) {
        write(&self.view).search_text = value.into();
    }

    pub fn select_sort(&self, key: SortKey) {
        write(&self.view).select_sort(key);
    }

    pub fn view(&self) -> ViewState {
        read(&self.view).clone()
    }

    pub fn visible_items(&self) -> Vec<Item> {
        let view = self.view();
        compute_visible_items(&self.snapshots.current().items, &view)
    }

    pub fn last_transaction(&self) -> Option<LastTransaction> {
        read(&self.last_transaction).clone()
    }

    fn sender(&self) -> Result<Address, DappError> {
        self.session
            .primary_account()
            .cloned()
            .ok_or(DappError::NoAccount)
    }

    fn expect_step(&self, index: ItemIndex, expected: Step) -> Result<(), DappError> {
        let snapshot = self.snapshots.current();
        let item = snapshot
            .items
            .iter()
            .find(|item| item.index == index)
            .ok_or(DappError::UnknownItem(index))?;
        if item.step != expected {
            return Err(DappError::StaleStep {
                index,
                expected,
                actual: item.step,
            });
        }
        Ok(())
    }

    /// The write already confirmed; a failed refresh only leaves the list stale.
    async fn refresh_after_write(&self, action: &str) {
        if let Err(err) = self.refresh_items().await {
            warn!(action, error = %err, "write confirmed but refresh failed");
        }
    }
}

/// Whole, non-negative amount in wei.
pub fn parse_cost(raw: &str) -> Result<Wei, DappError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DappError::InvalidCost(raw.to_owned()));
    }
    trimmed
        .parse()
        .map_err(|_| DappError::InvalidCost(raw.to_owned()))
}

pub fn parse_index(raw: &str) -> Result<ItemIndex, DappError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DappError::InvalidIndex(raw.to_owned()));
    }
    trimmed
        .parse()
        .map_err(|_| DappError::InvalidIndex(raw.to_owned()))
}

fn write_failure(method: &str, err: sc_chain_client::ChainError) -> DappError {
    error!(method, error = %err, "transaction failed");
    DappError::WriteFailure(err)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ProviderKind;
    use sc_api_types::NetworkId;
    use sc_chain_client::{ChainError, InMemoryChain, ItemManager};

    fn account(n: u8) -> Address {
        Address(format!("0x{:040x}", n))
    }

    fn controller_with(accounts: Vec<Address>) -> (Arc<InMemoryChain>, ItemController) {
        let chain = Arc::new(InMemoryChain::new(NetworkId(5777), accounts.clone()));
        let contract = ItemManager::new(chain.clone(), chain.contract_address());
        let session = Session::new(accounts, contract, NetworkId(5777), ProviderKind::LocalFallback);
        (chain, ItemController::new(session))
    }

    #[tokio::test]
    async fn created_item_appears_after_refresh() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);

        controller.create_item("Widget", "1000").await?;

        let items = controller.snapshot().items.clone();
        assert_eq!(
            items,
            vec![Item {
                index: 0,
                name: "Widget".to_owned(),
                price: 1000,
                step: Step::Created,
                owner_address: chain.item_address(0),
            }]
        );
        let last = controller.last_transaction().expect("last transaction recorded");
        assert_eq!(last.item_name, "Widget");
        Ok(())
    }

    #[tokio::test]
    async fn successive_creates_are_indexed_in_order() -> anyhow::Result<()> {
        let (_chain, controller) = controller_with(vec![account(0xa)]);

        for n in 0..4 {
            controller.create_item(&format!("crate {n}"), "10").await?;
        }
        controller.refresh_items().await?;

        let snapshot = controller.snapshot();
        let indices: Vec<u64> = snapshot.items.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(snapshot.items[2].name, "crate 2");
        Ok(())
    }

    #[tokio::test]
    async fn payment_transfers_exact_price_then_shows_paid() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xb)]);
        controller.create_item("Widget", "1000").await?;

        let owner = chain.item_address(0);
        controller.pay_for_item(0, &owner, 1000).await?;

        let transfers = chain.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].to, owner);
        assert_eq!(transfers[0].value, 1000);
        assert_eq!(transfers[0].from, account(0xb));
        assert_eq!(controller.snapshot().items[0].step, Step::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn delivery_triggers_contract_and_clears_index() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("Widget", "1000").await?;
        controller.pay_for_item(0, &chain.item_address(0), 1000).await?;

        controller.set_draft_index("0");
        controller.mark_delivered_from_draft().await?;

        assert_eq!(chain.submitted(), vec!["createItem", "triggerDelivery"]);
        assert_eq!(controller.snapshot().items[0].step, Step::Delivered);
        assert!(controller.view().draft.index.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_read_keeps_previous_list() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("first", "1").await?;
        controller.create_item("second", "2").await?;
        let before = controller.snapshot();

        chain.fail_item_read(Some(1));
        let err = controller.refresh_items().await.unwrap_err();
        assert!(matches!(err, DappError::ReadFailure(_)));
        assert_eq!(*controller.snapshot(), *before);

        chain.fail_item_read(None);
        chain.fail_count_read(true);
        assert!(controller.refresh_items().await.is_err());
        assert_eq!(*controller.snapshot(), *before);
        Ok(())
    }

    #[tokio::test]
    async fn confirmed_write_survives_failed_refresh() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("first", "1").await?;

        chain.fail_count_read(true);
        controller.create_item("second", "2").await?;

        assert_eq!(chain.item_count(), 2);
        assert_eq!(controller.snapshot().items.len(), 1);
        assert_eq!(controller.last_transaction().map(|t| t.item_name), Some("second".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn write_failure_preserves_draft() {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.set_draft_name("Widget");
        controller.set_draft_cost("1000");
        chain.reject_writes(true);

        let err = controller.create_item_from_draft().await.unwrap_err();
        assert!(matches!(err, DappError::WriteFailure(_)));

        let draft = controller.view().draft;
        assert_eq!(draft.item_name, "Widget");
        assert_eq!(draft.cost, "1000");
        assert!(controller.last_transaction().is_none());
    }

    #[tokio::test]
    async fn successful_create_clears_draft() -> anyhow::Result<()> {
        let (_chain, controller) = controller_with(vec![account(0xa)]);
        controller.set_draft_name("Widget");
        controller.set_draft_cost("1000");
        controller.set_draft_index("3");

        controller.create_item_from_draft().await?;

        let draft = controller.view().draft;
        assert!(draft.item_name.is_empty());
        assert!(draft.cost.is_empty());
        assert_eq!(draft.index, "3");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_is_never_submitted() {
        let (chain, controller) = controller_with(vec![account(0xa)]);

        for cost in ["", "12a", "-5", "1.5", "  "] {
            let err = controller.create_item("Widget", cost).await.unwrap_err();
            assert!(matches!(err, DappError::InvalidCost(_)), "cost {cost:?}");
            assert!(err.is_validation());
        }

        controller.set_draft_index("zero");
        assert!(matches!(
            controller.mark_delivered_from_draft().await,
            Err(DappError::InvalidIndex(_))
        ));
        assert!(chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn stale_steps_are_rejected_before_submission() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("Widget", "1000").await?;

        let err = controller.mark_delivered(0).await.unwrap_err();
        assert!(matches!(
            err,
            DappError::StaleStep {
                index: 0,
                expected: Step::Paid,
                actual: Step::Created
            }
        ));

        controller.pay_for_item(0, &chain.item_address(0), 1000).await?;
        let err = controller.pay_for_item(0, &chain.item_address(0), 1000).await.unwrap_err();
        assert!(matches!(err, DappError::StaleStep { expected: Step::Created, actual: Step::Paid, .. }));

        assert!(matches!(
            controller.mark_delivered(9).await,
            Err(DappError::UnknownItem(9))
        ));
        assert_eq!(chain.transfers().len(), 1);
        assert_eq!(chain.submitted(), vec!["createItem"]);
        Ok(())
    }

    #[tokio::test]
    async fn session_without_accounts_cannot_write() {
        let (chain, controller) = controller_with(vec![]);
        assert!(matches!(
            controller.create_item("Widget", "1").await,
            Err(DappError::NoAccount)
        ));
        assert_eq!(chain.item_count(), 0);
    }

    #[tokio::test]
    async fn visible_items_follow_view_state() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("Widget", "300").await?;
        controller.create_item("gadget", "100").await?;
        controller.create_item("Wide belt", "200").await?;
        controller.pay_for_item(1, &chain.item_address(1), 100).await?;

        controller.set_tab(FilterTab::Pending);
        controller.set_search_text("wid");
        controller.select_sort(SortKey::Price);
        let names: Vec<String> = controller.visible_items().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Wide belt", "Widget"]);

        controller.select_sort(SortKey::Price);
        let names: Vec<String> = controller.visible_items().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Widget", "Wide belt"]);
        Ok(())
    }

    #[tokio::test]
    async fn blank_names_are_submitted_as_typed() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);

        controller.create_item("", "10").await?;
        controller.create_item("  crate  ", "20").await?;

        assert_eq!(chain.submitted(), vec!["createItem", "createItem"]);
        let names: Vec<String> = controller.snapshot().items.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["", "  crate  "]);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_item_count_fails_on_first_missing_item() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("Widget", "1000").await?;
        let before = controller.snapshot();

        chain.report_item_count(Some(1 << 61));
        let err = controller.refresh_items().await.unwrap_err();

        assert!(matches!(err, DappError::ReadFailure(_)));
        assert_eq!(*controller.snapshot(), *before);
        Ok(())
    }

    #[tokio::test]
    async fn payment_reverted_by_out_of_band_step_change() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xb)]);
        controller.create_item("Widget", "1000").await?;
        let before = controller.snapshot();

        // someone else paid; the cached list still says Created
        chain.set_step(0, Step::Paid);
        let err = controller.pay_for_item(0, &chain.item_address(0), 1000).await.unwrap_err();

        assert!(matches!(err, DappError::WriteFailure(ChainError::Reverted { .. })));
        assert!(!err.is_validation());
        assert!(chain.transfers().is_empty());
        assert_eq!(*controller.snapshot(), *before);
        assert_eq!(controller.snapshot().items[0].step, Step::Created);
        Ok(())
    }

    #[tokio::test]
    async fn reverted_delivery_keeps_draft_index() -> anyhow::Result<()> {
        let (chain, controller) = controller_with(vec![account(0xa)]);
        controller.create_item("Widget", "1000").await?;
        controller.pay_for_item(0, &chain.item_address(0), 1000).await?;
        let before = controller.snapshot();

        chain.set_step(0, Step::Created);
        controller.set_draft_index("0");
        let err = controller.mark_delivered_from_draft().await.unwrap_err();

        assert!(matches!(err, DappError::WriteFailure(ChainError::Reverted { .. })));
        assert_eq!(controller.view().draft.index, "0");
        assert_eq!(*controller.snapshot(), *before);
        assert_eq!(controller.snapshot().items[0].step, Step::Paid);
        Ok(())
    }

    #[test]
    fn amounts_parse_as_whole_numbers() -> anyhow::Result<()> {
        assert_eq!(parse_cost(" 1000 ")?, 1000);
        assert_eq!(parse_cost("0")?, 0);
        assert!(parse_cost("340282366920938463463374607431768211456").is_err());
        assert_eq!(parse_index("7")?, 7);
        assert!(parse_index("+7").is_err());
        Ok(())
    }
}
