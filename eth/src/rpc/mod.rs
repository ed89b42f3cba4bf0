pub mod ethers;
use crate::types::{Address, ContractDetails, NftId};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

/// Read-only view of an EVM node restricted to what the asset collector needs:
/// chain identity, ERC-721 metadata calls and `Transfer` log discovery.
#[async_trait]
pub trait EthNodeReading: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    async fn block_number(&self) -> Result<u64>;

    async fn get_contract_details(&self, address: Address) -> ContractDetails;

    async fn owner_of(&self, token: NftId) -> Result<Address>;

    async fn token_uri(&self, token: NftId) -> Result<String>;

    /// Addresses of all contracts that emitted a `Transfer` event in the
    /// inclusive block range `[start, end]`.
    async fn transfer_emitters(&self, start: u64, end: u64) -> Result<HashSet<Address>>;

    /// A token exists exactly when `ownerOf` can be read for it.
    /// Any error (including transport errors) counts as non-existence.
    async fn token_exists(&self, token: NftId) -> bool {
        self.owner_of(token).await.is_ok()
    }

    async fn get_contracts_details(
        &self,
        addresses: &[Address],
    ) -> HashMap<Address, ContractDetails> {
        tracing::debug!("Preparing {} Contract Details Requests", addresses.len());
        let details = join_all(addresses.iter().map(|&a| self.get_contract_details(a))).await;
        addresses.iter().copied().zip(details).collect()
    }
}
