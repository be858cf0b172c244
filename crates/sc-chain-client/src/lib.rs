pub mod abi;
pub mod in_memory;
pub mod item_manager;
pub mod web3;

use async_trait::async_trait;
use sc_api_types::{Address, ContractArtifact, DeploymentRecord, NetworkId, TransactionRequest, TxHash, TxReceipt};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

pub use abi::{MethodCall, ParamKind, Token};
pub use in_memory::InMemoryChain;
pub use item_manager::ItemManager;
pub use web3::Web3Provider;

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("transport error: {0:#}")]
    Transport(#[from] anyhow::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("request rejected by user")]
    UserRejected,
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ChainError {
    /// Map a JSON-RPC error object onto the error taxonomy.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            ChainError::UserRejected
        } else {
            ChainError::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Everything the dApp needs from a connection to the chain.
///
/// Futures are not `Send`: browser providers live on the single JS thread.
#[async_trait(?Send)]
pub trait ChainProvider {
    /// Ask the wallet for account access. Providers without an
    /// authorization step simply return their accounts.
    async fn request_accounts(&self) -> ChainResult<Vec<Address>>;
    async fn accounts(&self) -> ChainResult<Vec<Address>>;
    async fn network_id(&self) -> ChainResult<NetworkId>;
    /// Value transfer; resolves once the transaction is mined.
    async fn send_transaction(&self, tx: TransactionRequest) -> ChainResult<TxReceipt>;
    /// Read-only contract call.
    async fn call(&self, contract: &Address, method: &MethodCall) -> ChainResult<Vec<Token>>;
    /// State-changing contract call; resolves once the transaction is mined.
    async fn send(&self, contract: &Address, method: &MethodCall, from: &Address) -> ChainResult<TxReceipt>;
}

/// Raw JSON-RPC request channel (HTTP endpoint, injected wallet, ...).
#[async_trait(?Send)]
pub trait RpcTransport {
    async fn request(&self, method: &str, params: Value) -> ChainResult<Value>;
    /// Wait between receipt polls using the platform's timer.
    async fn pause(&self, interval: Duration);
}

/// Network id to deployed contract address.
#[derive(Debug, Default, Clone)]
pub struct DeploymentRegistry {
    deployments: HashMap<NetworkId, DeploymentRecord>,
}

impl DeploymentRegistry {
    pub fn from_artifact(artifact: &ContractArtifact) -> Self {
        let mut registry = Self::default();
        for (key, record) in &artifact.networks {
            match key.trim().parse::<u64>() {
                Ok(id) => registry.register(NetworkId(id), record.clone()),
                Err(_) => warn!("skipping deployment with non-numeric network id '{key}'"),
            }
        }
        registry
    }

    pub fn register(&mut self, network: NetworkId, record: DeploymentRecord) {
        self.deployments.insert(network, record);
    }

    pub fn lookup(&self, network: NetworkId) -> Option<&DeploymentRecord> {
        self.deployments.get(&network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_skips_bad_network_keys() {
        let mut artifact = ContractArtifact::default();
        let record = DeploymentRecord {
            address: Address("0x5b1869d9a4c187f2eaa108f3062412ecf0526b24".to_owned()),
            transaction_hash: None,
        };
        artifact.networks.insert("5777".to_owned(), record.clone());
        artifact.networks.insert("dev".to_owned(), record.clone());

        let registry = DeploymentRegistry::from_artifact(&artifact);
        assert_eq!(registry.lookup(NetworkId(5777)), Some(&record));
        assert_eq!(registry.lookup(NetworkId(1)), None);
    }

    #[test]
    fn rejection_code_maps_to_user_rejected() {
        assert!(matches!(
            ChainError::from_rpc(4001, "User denied account authorization"),
            ChainError::UserRejected
        ));
        assert!(matches!(
            ChainError::from_rpc(-32000, "revert"),
            ChainError::Rpc { code: -32000, .. }
        ));
    }
}
