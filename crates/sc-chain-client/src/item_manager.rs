//! Typed handle for the deployed `ItemManager` contract.

use crate::abi::{MethodCall, ParamKind, Token};
use crate::{ChainError, ChainProvider, ChainResult};
use sc_api_types::{Address, Item, ItemIndex, Step, TransactionRequest, TxReceipt, Wei};
use std::fmt;
use std::sync::Arc;

pub const CREATE_ITEM: &str = "createItem(string,uint256)";
pub const GET_ITEM: &str = "getItem(uint256)";
pub const GET_INDEX: &str = "getIndex()";
pub const TRIGGER_DELIVERY: &str = "triggerDelivery(uint256)";

const GET_ITEM_OUTPUTS: &[ParamKind] = &[
    ParamKind::String,
    ParamKind::Uint,
    ParamKind::Uint,
    ParamKind::Address,
];
const GET_INDEX_OUTPUTS: &[ParamKind] = &[ParamKind::Uint];

#[derive(Clone)]
pub struct ItemManager {
    provider: Arc<dyn ChainProvider>,
    address: Address,
}

impl fmt::Debug for ItemManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemManager").field("address", &self.address).finish_non_exhaustive()
    }
}

impl ItemManager {
    pub fn new(provider: Arc<dyn ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn provider(&self) -> &Arc<dyn ChainProvider> {
        &self.provider
    }

    pub async fn create_item(&self, name: &str, cost: Wei, from: &Address) -> ChainResult<TxReceipt> {
        let call = MethodCall::new(
            CREATE_ITEM,
            vec![Token::String(name.to_owned()), Token::Uint(cost)],
            &[],
        );
        self.provider.send(&self.address, &call, from).await
    }

    /// Number of items created so far.
    pub async fn get_index(&self) -> ChainResult<u64> {
        let call = MethodCall::new(GET_INDEX, vec![], GET_INDEX_OUTPUTS);
        let mut tokens = self.provider.call(&self.address, &call).await?.into_iter();
        let count = next_token(&mut tokens, GET_INDEX)?.into_uint()?;
        u64::try_from(count).map_err(|_| ChainError::Decode(format!("item count {count} exceeds u64")))
    }

    pub async fn get_item(&self, index: ItemIndex) -> ChainResult<Item> {
        let call = MethodCall::new(GET_ITEM, vec![Token::Uint(u128::from(index))], GET_ITEM_OUTPUTS);
        let mut tokens = self.provider.call(&self.address, &call).await?.into_iter();

        let name = next_token(&mut tokens, GET_ITEM)?.into_string()?;
        let price = next_token(&mut tokens, GET_ITEM)?.into_uint()?;
        let code = next_token(&mut tokens, GET_ITEM)?.into_uint()?;
        let owner_address = next_token(&mut tokens, GET_ITEM)?.into_address()?;

        let step = u8::try_from(code)
            .ok()
            .and_then(Step::from_code)
            .ok_or_else(|| ChainError::Decode(format!("unknown step {code} for item {index}")))?;

        Ok(Item {
            index,
            name,
            price,
            step,
            owner_address,
        })
    }

    pub async fn trigger_delivery(&self, index: ItemIndex, from: &Address) -> ChainResult<TxReceipt> {
        let call = MethodCall::new(TRIGGER_DELIVERY, vec![Token::Uint(u128::from(index))], &[]);
        self.provider.send(&self.address, &call, from).await
    }

    /// Fund an item by sending its price to the item's payment address.
    pub async fn pay(&self, to: &Address, value: Wei, from: &Address) -> ChainResult<TxReceipt> {
        self.provider
            .send_transaction(TransactionRequest {
                from: from.clone(),
                to: to.clone(),
                value,
            })
            .await
    }
}

fn next_token(tokens: &mut impl Iterator<Item = Token>, method: &str) -> ChainResult<Token> {
    tokens
        .next()
        .ok_or_else(|| ChainError::Decode(format!("{method} returned too few values")))
}
