//! In-process chain with a simulated item contract.
//!
//! Mirrors the deployed contract's observable behavior: append-only items,
//! full-price payment to the item's own address, delivery only after
//! payment. Failure switches let callers exercise error paths.

use crate::abi::{MethodCall, Token};
use crate::item_manager::{CREATE_ITEM, GET_INDEX, GET_ITEM, TRIGGER_DELIVERY};
use crate::{ChainError, ChainProvider, ChainResult};
use async_trait::async_trait;
use sc_api_types::{Address, NetworkId, Step, TransactionRequest, TxHash, TxReceipt, Wei};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const CONTRACT_SEED: u64 = 0x00c0_ffee;
const ITEM_ADDRESS_BASE: u64 = 0x1000;

#[derive(Debug, Clone)]
struct StoredItem {
    name: String,
    price: Wei,
    step_code: u8,
}

#[derive(Debug, Default)]
struct ChainState {
    items: Vec<StoredItem>,
    block_number: u64,
    deny_authorization: bool,
    fail_count_read: bool,
    fail_item_read: Option<u64>,
    reported_count: Option<u128>,
    reject_writes: bool,
    transfers: Vec<TransactionRequest>,
    submitted: Vec<String>,
}

pub struct InMemoryChain {
    network: NetworkId,
    accounts: Vec<Address>,
    contract: Address,
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new(network: NetworkId, accounts: Vec<Address>) -> Self {
        Self {
            network,
            accounts,
            contract: Address(format!("0x{CONTRACT_SEED:040x}")),
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract.clone()
    }

    /// Payment address assigned to the item at `index`.
    pub fn item_address(&self, index: u64) -> Address {
        Address(format!("0x{:040x}", ITEM_ADDRESS_BASE + index))
    }

    pub fn item_count(&self) -> usize {
        self.state().items.len()
    }

    pub fn deny_authorization(&self, deny: bool) {
        self.state().deny_authorization = deny;
    }

    pub fn fail_count_read(&self, fail: bool) {
        self.state().fail_count_read = fail;
    }

    pub fn fail_item_read(&self, index: Option<u64>) {
        self.state().fail_item_read = index;
    }

    /// Answer `getIndex()` with `count` instead of the stored length.
    pub fn report_item_count(&self, count: Option<u128>) {
        self.state().reported_count = count;
    }

    pub fn reject_writes(&self, reject: bool) {
        self.state().reject_writes = reject;
    }

    /// Change an item's step out of band, as another account would.
    pub fn set_step(&self, index: u64, step: Step) {
        self.force_step_code(index, step.code());
    }

    pub fn force_step_code(&self, index: u64, code: u8) {
        if let Some(item) = self.state().items.get_mut(index as usize) {
            item.step_code = code;
        }
    }

    /// Value transfers seen so far, in order.
    pub fn transfers(&self) -> Vec<TransactionRequest> {
        self.state().transfers.clone()
    }

    /// Names of contract methods sent so far, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_contract(&self, contract: &Address) -> ChainResult<()> {
        if contract.normalized() != self.contract.normalized() {
            return Err(ChainError::from_rpc(
                -32000,
                format!("no contract code at {contract}"),
            ));
        }
        Ok(())
    }

    fn mine(state: &mut ChainState) -> TxReceipt {
        state.block_number += 1;
        TxReceipt {
            tx_hash: TxHash(format!("0x{:064x}", state.block_number)),
            block_number: Some(state.block_number),
        }
    }

    fn revert(state: &mut ChainState, reason: &str) -> ChainError {
        let receipt = Self::mine(state);
        debug!(tx_hash = %receipt.tx_hash, reason, "simulated revert");
        ChainError::Reverted {
            tx_hash: receipt.tx_hash,
        }
    }
}

fn uint_arg(method: &MethodCall, position: usize) -> ChainResult<u128> {
    method
        .args
        .get(position)
        .cloned()
        .ok_or_else(|| ChainError::Encode(format!("{} is missing argument {position}", method.name())))?
        .into_uint()
}

#[async_trait(?Send)]
impl ChainProvider for InMemoryChain {
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        if self.state().deny_authorization {
            return Err(ChainError::UserRejected);
        }
        Ok(self.accounts.clone())
    }

    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn network_id(&self) -> ChainResult<NetworkId> {
        Ok(self.network)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> ChainResult<TxReceipt> {
        let mut state = self.state();
        if state.reject_writes {
            return Err(ChainError::from_rpc(-32603, "transaction rejected"));
        }

        let target = tx.to.normalized();
        let position = (0..state.items.len() as u64).find(|i| self.item_address(*i) == target);
        if let Some(index) = position {
            let (price, step_code) = {
                let item = &state.items[index as usize];
                (item.price, item.step_code)
            };
            if price != tx.value {
                return Err(Self::revert(&mut state, "only full payments accepted"));
            }
            if step_code != Step::Created.code() {
                return Err(Self::revert(&mut state, "item is further in the chain"));
            }
            state.items[index as usize].step_code = Step::Paid.code();
        }

        state.transfers.push(tx);
        Ok(Self::mine(&mut state))
    }

    async fn call(&self, contract: &Address, method: &MethodCall) -> ChainResult<Vec<Token>> {
        self.check_contract(contract)?;
        method.encode()?;
        let state = self.state();

        match method.signature {
            GET_INDEX => {
                if state.fail_count_read {
                    return Err(ChainError::from_rpc(-32000, "simulated read failure"));
                }
                let count = state.reported_count.unwrap_or(state.items.len() as u128);
                Ok(vec![Token::Uint(count)])
            }
            GET_ITEM => {
                let index = uint_arg(method, 0)?;
                if state.fail_item_read.map(u128::from) == Some(index) {
                    return Err(ChainError::from_rpc(-32000, "simulated read failure"));
                }
                let item = usize::try_from(index)
                    .ok()
                    .and_then(|i| state.items.get(i))
                    .ok_or_else(|| ChainError::from_rpc(-32000, "VM Exception: invalid opcode"))?;
                Ok(vec![
                    Token::String(item.name.clone()),
                    Token::Uint(item.price),
                    Token::Uint(u128::from(item.step_code)),
                    Token::Address(self.item_address(index as u64)),
                ])
            }
            other => Err(ChainError::Unsupported(format!("call {other}"))),
        }
    }

    async fn send(&self, contract: &Address, method: &MethodCall, _from: &Address) -> ChainResult<TxReceipt> {
        self.check_contract(contract)?;
        method.encode()?;
        let mut state = self.state();
        if state.reject_writes {
            return Err(ChainError::from_rpc(-32603, "transaction rejected"));
        }
        state.submitted.push(method.name().to_owned());

        match method.signature {
            CREATE_ITEM => {
                let name = method
                    .args
                    .first()
                    .cloned()
                    .ok_or_else(|| ChainError::Encode("createItem is missing its name".to_owned()))?
                    .into_string()?;
                let price = uint_arg(method, 1)?;
                state.items.push(StoredItem {
                    name,
                    price,
                    step_code: Step::Created.code(),
                });
                Ok(Self::mine(&mut state))
            }
            TRIGGER_DELIVERY => {
                let index = uint_arg(method, 0)?;
                let len = state.items.len();
                let Some(position) = usize::try_from(index).ok().filter(|i| *i < len) else {
                    return Err(Self::revert(&mut state, "no such item"));
                };
                if state.items[position].step_code != Step::Paid.code() {
                    return Err(Self::revert(&mut state, "item is not paid yet"));
                }
                state.items[position].step_code = Step::Delivered.code();
                Ok(Self::mine(&mut state))
            }
            other => Err(ChainError::Unsupported(format!("send {other}"))),
        }
    }
}
