use crate::{
    collector::AssetSource,
    discovery::{discover_by_probing, probe_upper_bound},
    models::{AssetRecord, Container, SourceKind, TokenId},
};
use async_trait::async_trait;
use eth::{
    rpc::EthNodeReading,
    types::{Address, NftId},
};
use futures::future::join;
use metadata_retriever::{media::MediaLinks, MetadataFetching};
use std::sync::Arc;

/// IP asset collections deployed on the Story Aeneid testnet.
pub const KNOWN_COLLECTIONS: [&str; 7] = [
    "0x7CaFa3F46E3F07dE23ccE856e92BB5460AC77e98",
    "0xFe3838BFb30B34170F00030B52eA4893d8aAC6bC",
    "0x76ba2c2428F756010683c4ece6f49296b4756C1A",
    "0x937BEF10bA6Fb941ED84b8d249Abc76031429A9a",
    "0x98Caab9438337Aa19AC2ef05864A5E3273f39Dab",
    "0xc32A8a0FF3beDDDa58393d022aF433e78739FAbc",
    "0x4b2bf7072F4EC096896eC5a16282293756fE0d83",
];

pub fn known_collections() -> Vec<Address> {
    KNOWN_COLLECTIONS
        .iter()
        .filter_map(|address| address.parse().ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Overrides the supply based upper bound.
    pub max_ids: Option<u64>,
    pub batch_size: u64,
    pub workers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_ids: None,
            batch_size: 100,
            workers: 10,
        }
    }
}

/// Enumerates a fixed set of contracts by asking the node directly.
pub struct ChainSource {
    node: Arc<dyn EthNodeReading>,
    fetcher: Arc<dyn MetadataFetching>,
    addresses: Vec<Address>,
    probe: ProbeConfig,
}

impl ChainSource {
    pub fn new(
        node: Arc<dyn EthNodeReading>,
        fetcher: Arc<dyn MetadataFetching>,
        addresses: Vec<Address>,
        probe: ProbeConfig,
    ) -> Self {
        Self {
            node,
            fetcher,
            addresses,
            probe,
        }
    }

    pub async fn container(&self, address: Address) -> Container {
        Container::from(self.node.get_contract_details(address).await)
    }

    /// Owner, token URI and the document behind it. Each lookup that fails
    /// only nulls its own field.
    pub async fn resolve_metadata(
        &self,
        container: &Container,
        token_id: TokenId,
    ) -> Option<AssetRecord> {
        let Some(numeric_id) = token_id.as_u256() else {
            tracing::warn!("cannot query non-numeric token id {token_id} on chain");
            return None;
        };
        let token = NftId::new(container.address, numeric_id);
        let (owner, token_uri) = join(self.node.owner_of(token), self.node.token_uri(token)).await;
        let owner = owner
            .map_err(|err| tracing::debug!("no owner for {token}: {err}"))
            .ok();
        let token_uri = token_uri
            .map_err(|err| tracing::debug!("no token uri for {token}: {err}"))
            .ok();

        let metadata = match token_uri.as_deref().map(str::trim) {
            Some(uri) if !uri.is_empty() => match self.fetcher.get_nft_metadata(uri).await {
                Ok(metadata) => Some(metadata),
                Err(err) => {
                    tracing::warn!("metadata for {token} not found ({err:#}). Using None");
                    None
                }
            },
            _ => None,
        };
        let media = metadata
            .as_ref()
            .map(MediaLinks::from_metadata)
            .unwrap_or_default();

        Some(AssetRecord {
            owner: owner.map(|owner| owner.to_string()),
            token_uri,
            metadata,
            image_url: media.image_url,
            animation_url: media.animation_url,
            ..AssetRecord::new(container, token_id, SourceKind::ChainProbe)
        })
    }
}

#[async_trait]
impl AssetSource for ChainSource {
    type Member = TokenId;

    fn kind(&self) -> SourceKind {
        SourceKind::ChainProbe
    }

    async fn containers(&self) -> Vec<Container> {
        let details = self.node.get_contracts_details(&self.addresses).await;
        self.addresses
            .iter()
            .filter_map(|address| details.get(address).cloned())
            .map(Container::from)
            .collect()
    }

    async fn discover(&self, container: &Container) -> Vec<TokenId> {
        let Some(upper_bound) = probe_upper_bound(container.declared_supply(), self.probe.max_ids)
        else {
            tracing::warn!(
                "skipping {}: declared supply {} is too large to enumerate",
                container.address,
                container.total_supply.as_deref().unwrap_or("unknown")
            );
            return Vec::new();
        };
        tracing::info!(
            "probing ids 1..={upper_bound} of {} (declared supply {})",
            container.address,
            container.total_supply.as_deref().unwrap_or("unknown")
        );
        let address = container.address;
        discover_by_probing(upper_bound, self.probe.batch_size, self.probe.workers, |id| {
            let node = self.node.clone();
            async move { node.token_exists(NftId::new(address, id)).await }
        })
        .await
        .into_iter()
        .map(TokenId::from)
        .collect()
    }

    async fn resolve(&self, container: &Container, token_id: TokenId) -> Option<AssetRecord> {
        self.resolve_metadata(container, token_id).await
    }
}
