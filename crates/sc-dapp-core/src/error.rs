use sc_api_types::{ItemIndex, NetworkId, Step};
use sc_chain_client::ChainError;

#[derive(Debug, thiserror::Error)]
pub enum DappError {
    #[error("no usable chain provider: {0}")]
    ProviderUnavailable(#[source] ChainError),
    #[error("account access was denied")]
    AuthorizationDenied,
    #[error("ItemManager is not deployed to network {network}")]
    DeploymentNotFound { network: NetworkId },
    #[error("failed to read items: {0}")]
    ReadFailure(#[source] ChainError),
    #[error("transaction failed: {0}")]
    WriteFailure(#[source] ChainError),
    #[error("cost must be a non-negative whole number, got '{0}'")]
    InvalidCost(String),
    #[error("item index must be a non-negative whole number, got '{0}'")]
    InvalidIndex(String),
    #[error("item {0} is not in the current list")]
    UnknownItem(ItemIndex),
    #[error("item {index} is {actual}, expected {expected}")]
    StaleStep {
        index: ItemIndex,
        expected: Step,
        actual: Step,
    },
    #[error("session has no account to send from")]
    NoAccount,
}

impl DappError {
    /// Errors that leave the application permanently not ready.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DappError::ProviderUnavailable(_)
                | DappError::AuthorizationDenied
                | DappError::DeploymentNotFound { .. }
        )
    }

    /// Rejected locally, before anything reached the chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DappError::InvalidCost(_)
                | DappError::InvalidIndex(_)
                | DappError::UnknownItem(_)
                | DappError::StaleStep { .. }
                | DappError::NoAccount
        )
    }
}
