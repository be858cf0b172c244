//! Connection bootstrap: pick a provider, find the contract, load accounts.
//!
//! Runs once, sequentially, with no retries. Any failure leaves the
//! application not ready until the page is reloaded.

use crate::error::DappError;
use sc_api_types::{Address, NetworkId};
use sc_chain_client::{ChainError, ChainProvider, DeploymentRegistry, ItemManager};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Injected,
    LegacyInjected,
    LocalFallback,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Injected => "injected",
            ProviderKind::LegacyInjected => "legacy-injected",
            ProviderKind::LocalFallback => "local-fallback",
        })
    }
}

/// Source of candidate providers, consulted in priority order.
pub trait ProviderDiscovery {
    /// Modern wallet provider that requires account authorization.
    fn injected(&self) -> Option<Arc<dyn ChainProvider>>;
    /// Older injected provider, used without an authorization step.
    fn legacy(&self) -> Option<Arc<dyn ChainProvider>>;
    /// Local node endpoint.
    fn local_fallback(&self) -> Arc<dyn ChainProvider>;
}

#[derive(Debug, Clone)]
pub struct Session {
    accounts: Vec<Address>,
    contract: ItemManager,
    network: NetworkId,
    provider_kind: ProviderKind,
    ready: bool,
}

impl Session {
    pub fn new(accounts: Vec<Address>, contract: ItemManager, network: NetworkId, provider_kind: ProviderKind) -> Self {
        Self {
            accounts,
            contract,
            network,
            provider_kind,
            ready: true,
        }
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Account every transaction is sent from.
    pub fn primary_account(&self) -> Option<&Address> {
        self.accounts.first()
    }

    pub fn contract(&self) -> &ItemManager {
        &self.contract
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider_kind
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

pub async fn bootstrap(discovery: &dyn ProviderDiscovery, registry: &DeploymentRegistry) -> Result<Session, DappError> {
    let (provider, kind) = acquire_provider(discovery).await?;

    let network = provider
        .network_id()
        .await
        .map_err(DappError::ProviderUnavailable)?;

    let Some(deployment) = registry.lookup(network) else {
        error!(%network, "ItemManager not deployed to detected network");
        return Err(DappError::DeploymentNotFound { network });
    };

    let contract = ItemManager::new(provider.clone(), deployment.address.clone());
    let accounts = provider
        .accounts()
        .await
        .map_err(DappError::ProviderUnavailable)?;
    if accounts.is_empty() {
        warn!("provider exposes no accounts; transactions will be refused");
    }

    info!(
        contract = %deployment.address,
        provider = %kind,
        %network,
        accounts = accounts.len(),
        "session ready"
    );
    Ok(Session::new(accounts, contract, network, kind))
}

async fn acquire_provider(discovery: &dyn ProviderDiscovery) -> Result<(Arc<dyn ChainProvider>, ProviderKind), DappError> {
    if let Some(provider) = discovery.injected() {
        return match provider.request_accounts().await {
            Ok(_) => Ok((provider, ProviderKind::Injected)),
            Err(ChainError::UserRejected) => {
                warn!("account authorization denied");
                Err(DappError::AuthorizationDenied)
            }
            Err(err) => Err(DappError::ProviderUnavailable(err)),
        };
    }

    if let Some(provider) = discovery.legacy() {
        info!("injected web3 detected");
        return Ok((provider, ProviderKind::LegacyInjected));
    }

    info!("no web3 instance injected, using local node");
    Ok((discovery.local_fallback(), ProviderKind::LocalFallback))
}

/// What the page shows while and after bootstrapping.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Session),
    Failed(String),
}

impl LoadState {
    /// A missing deployment leaves the page on its loading screen; every
    /// other failure is reported.
    pub fn from_bootstrap(result: Result<Session, DappError>) -> Self {
        match result {
            Ok(session) => LoadState::Ready(session),
            Err(DappError::DeploymentNotFound { .. }) => LoadState::Loading,
            Err(err) => LoadState::Failed(err.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(session) if session.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_api_types::DeploymentRecord;
    use sc_chain_client::InMemoryChain;

    struct Candidates {
        injected: Option<Arc<InMemoryChain>>,
        legacy: Option<Arc<InMemoryChain>>,
        local: Arc<InMemoryChain>,
    }

    impl ProviderDiscovery for Candidates {
        fn injected(&self) -> Option<Arc<dyn ChainProvider>> {
            self.injected.clone().map(|p| p as Arc<dyn ChainProvider>)
        }

        fn legacy(&self) -> Option<Arc<dyn ChainProvider>> {
            self.legacy.clone().map(|p| p as Arc<dyn ChainProvider>)
        }

        fn local_fallback(&self) -> Arc<dyn ChainProvider> {
            self.local.clone()
        }
    }

    fn account(n: u8) -> Address {
        Address(format!("0x{:040x}", n))
    }

    fn chain(network: u64) -> Arc<InMemoryChain> {
        Arc::new(InMemoryChain::new(NetworkId(network), vec![account(0xa), account(0xb)]))
    }

    fn registry_for(chain: &InMemoryChain, network: u64) -> DeploymentRegistry {
        let mut registry = DeploymentRegistry::default();
        registry.register(
            NetworkId(network),
            DeploymentRecord {
                address: chain.contract_address(),
                transaction_hash: None,
            },
        );
        registry
    }

    #[tokio::test]
    async fn injected_provider_wins_over_others() -> anyhow::Result<()> {
        let injected = chain(5777);
        let registry = registry_for(&injected, 5777);
        let candidates = Candidates {
            injected: Some(injected),
            legacy: Some(chain(5777)),
            local: chain(5777),
        };

        let session = bootstrap(&candidates, &registry).await?;
        assert_eq!(session.provider_kind(), ProviderKind::Injected);
        assert_eq!(session.primary_account(), Some(&account(0xa)));
        assert_eq!(session.accounts().len(), 2);
        assert!(session.is_ready());
        Ok(())
    }

    #[tokio::test]
    async fn denied_authorization_fails_without_falling_back() {
        let injected = chain(5777);
        injected.deny_authorization(true);
        let registry = registry_for(&injected, 5777);
        let candidates = Candidates {
            injected: Some(injected),
            legacy: Some(chain(5777)),
            local: chain(5777),
        };

        let err = bootstrap(&candidates, &registry).await.unwrap_err();
        assert!(matches!(err, DappError::AuthorizationDenied));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn legacy_then_local_are_used_in_order() -> anyhow::Result<()> {
        let legacy = chain(5777);
        legacy.deny_authorization(true);
        let registry = registry_for(&legacy, 5777);

        let with_legacy = Candidates {
            injected: None,
            legacy: Some(legacy),
            local: chain(5777),
        };
        let session = bootstrap(&with_legacy, &registry).await?;
        assert_eq!(session.provider_kind(), ProviderKind::LegacyInjected);

        let local_only = Candidates {
            injected: None,
            legacy: None,
            local: chain(5777),
        };
        let session = bootstrap(&local_only, &registry).await?;
        assert_eq!(session.provider_kind(), ProviderKind::LocalFallback);
        Ok(())
    }

    #[tokio::test]
    async fn missing_deployment_is_fatal_and_keeps_loading() {
        let local = chain(5777);
        let registry = registry_for(&local, 1);
        let candidates = Candidates {
            injected: None,
            legacy: None,
            local,
        };

        let result = bootstrap(&candidates, &registry).await;
        assert!(matches!(
            result,
            Err(DappError::DeploymentNotFound { network: NetworkId(5777) })
        ));

        let state = LoadState::from_bootstrap(result);
        assert!(matches!(state, LoadState::Loading));
        assert!(!state.is_ready());
    }

    #[test]
    fn other_failures_are_reported() {
        let state = LoadState::from_bootstrap(Err(DappError::AuthorizationDenied));
        assert!(matches!(state, LoadState::Failed(message) if message.contains("denied")));
    }
}
