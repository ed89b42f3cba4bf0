use crate::types::{Address, ContractDetails, NftId};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::{
    middleware::Middleware,
    prelude::abigen,
    providers::{Http, Provider},
    types::{Filter, Log, U256},
    utils::hex,
};
use futures::future::join3;
use reqwest::Url;
use std::{collections::HashSet, sync::Arc, time::Duration};

use super::EthNodeReading;

abigen!(
    ERC721Metadata,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function totalSupply() external view returns (uint256)
        function ownerOf(uint256 tokenId) external view returns (address)
        function tokenURI(uint256 tokenId) external view returns (string)
    ]"#
);

const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
/// ERC-721 indexes the token id, ERC-20 logs with the same signature carry
/// one topic less.
const ERC721_TRANSFER_TOPICS: usize = 4;
const MAX_RETRIES: u32 = 3;
const RETRY_WAIT_SECS: u64 = 1;

fn erc721_contract_at_address(
    address: Address,
    provider: Arc<Provider<Http>>,
) -> ERC721Metadata<Provider<Http>> {
    ERC721Metadata::new(address.0, provider)
}

#[async_trait::async_trait]
trait RetryGet<T: Send> {
    async fn try_get(&self) -> Result<T>;

    fn is_retryable_error(error: &anyhow::Error) -> bool {
        let error_string = error.to_string();
        if error_string.contains("Contract call reverted with data:") {
            let decoded_message = error_string
                .split_whitespace()
                .last()
                .map(|data| data.trim_start_matches("0x"))
                .and_then(|data| hex::decode(data).ok())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            tracing::warn!("Contract call reverted with message: {}", decoded_message);
            return false;
        }
        true
    }

    async fn retry_get(&self, max_retries: u32, wait_secs: u64) -> Result<T> {
        let mut retries = 0;
        loop {
            match self.try_get().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    if !Self::is_retryable_error(&err) || retries >= max_retries {
                        return Err(err);
                    } else {
                        tracing::debug!(
                            "failed rpc request attempt {} with error {} - trying again in {} seconds",
                            retries,
                            err,
                            wait_secs
                        );
                        tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    }
                }
            }
        }
    }
}

struct GetName {
    provider: Arc<Provider<Http>>,
    address: Address,
}

#[async_trait::async_trait]
impl RetryGet<String> for GetName {
    async fn try_get(&self) -> Result<String> {
        let contract = erc721_contract_at_address(self.address, self.provider.clone());
        contract
            .name()
            .call()
            .await
            .map(|name| name.replace('\0', ""))
            .map_err(|err| anyhow!(err.to_string()))
    }
}

struct GetSymbol {
    provider: Arc<Provider<Http>>,
    address: Address,
}

#[async_trait::async_trait]
impl RetryGet<String> for GetSymbol {
    async fn try_get(&self) -> Result<String> {
        let contract = erc721_contract_at_address(self.address, self.provider.clone());
        contract
            .symbol()
            .call()
            .await
            .map(|symbol| symbol.replace('\0', ""))
            .map_err(|err| anyhow!(err.to_string()))
    }
}

struct GetTotalSupply {
    provider: Arc<Provider<Http>>,
    address: Address,
}

#[async_trait::async_trait]
impl RetryGet<U256> for GetTotalSupply {
    async fn try_get(&self) -> Result<U256> {
        let contract = erc721_contract_at_address(self.address, self.provider.clone());
        contract
            .total_supply()
            .call()
            .await
            .map_err(|err| anyhow!(err.to_string()))
    }
}

struct GetErc721Uri {
    provider: Arc<Provider<Http>>,
    token: NftId,
}

#[async_trait::async_trait]
impl RetryGet<String> for GetErc721Uri {
    async fn try_get(&self) -> Result<String> {
        let contract = erc721_contract_at_address(self.token.address, self.provider.clone());
        contract
            .token_uri(self.token.token_id)
            .call()
            .await
            .map(|uri| uri.replace('\0', ""))
            .map_err(|err| anyhow!(err.to_string()))
    }
}

struct GetOwner {
    provider: Arc<Provider<Http>>,
    token: NftId,
}

#[async_trait::async_trait]
impl RetryGet<Address> for GetOwner {
    async fn try_get(&self) -> Result<Address> {
        let contract = erc721_contract_at_address(self.token.address, self.provider.clone());
        contract
            .owner_of(self.token.token_id)
            .call()
            .await
            .map(Address::from)
            .map_err(|err| anyhow!(err.to_string()))
    }
}

pub struct Client {
    provider: Arc<Provider<Http>>,
}

#[async_trait]
impl EthNodeReading for Client {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self
            .provider
            .get_chainid()
            .await
            .context("eth_chainId")?
            .as_u64())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self
            .provider
            .get_block_number()
            .await
            .context("eth_blockNumber")?
            .as_u64())
    }

    async fn get_contract_details(&self, address: Address) -> ContractDetails {
        let (name, symbol, total_supply) = join3(
            self.get_name(address),
            self.get_symbol(address),
            self.get_total_supply(address),
        )
        .await;
        ContractDetails {
            address,
            name,
            symbol,
            total_supply,
        }
    }

    // Never retried: a failed read is the definition of a missing token.
    async fn owner_of(&self, token: NftId) -> Result<Address> {
        GetOwner {
            provider: self.provider.clone(),
            token,
        }
        .try_get()
        .await
    }

    async fn token_uri(&self, token: NftId) -> Result<String> {
        GetErc721Uri {
            provider: self.provider.clone(),
            token,
        }
        .retry_get(MAX_RETRIES, RETRY_WAIT_SECS)
        .await
    }

    async fn transfer_emitters(&self, start: u64, end: u64) -> Result<HashSet<Address>> {
        let filter = Filter::new()
            .from_block(start)
            .to_block(end)
            .event(TRANSFER_EVENT);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .with_context(|| format!("eth_getLogs for blocks {start}..={end}"))?;
        tracing::debug!("found {} Transfer events in {start}..={end}", logs.len());
        Ok(erc721_emitters(logs))
    }
}

fn erc721_emitters(logs: impl IntoIterator<Item = Log>) -> HashSet<Address> {
    logs.into_iter()
        .filter(|log| log.topics.len() == ERC721_TRANSFER_TOPICS)
        .map(|log| Address::from(log.address))
        .collect()
}

impl Client {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build node http client")?;
        let url = Url::parse(url).with_context(|| format!("invalid node url {url}"))?;
        Ok(Self {
            provider: Arc::new(Provider::new(Http::new_with_client(url, http_client))),
        })
    }

    async fn get_name(&self, address: Address) -> Option<String> {
        GetName {
            provider: self.provider.clone(),
            address,
        }
        .retry_get(MAX_RETRIES, RETRY_WAIT_SECS)
        .await
        .map_err(|err| tracing::debug!("name() failed for {address}: {err}"))
        .ok()
    }

    async fn get_symbol(&self, address: Address) -> Option<String> {
        GetSymbol {
            provider: self.provider.clone(),
            address,
        }
        .retry_get(MAX_RETRIES, RETRY_WAIT_SECS)
        .await
        .map_err(|err| tracing::debug!("symbol() failed for {address}: {err}"))
        .ok()
    }

    async fn get_total_supply(&self, address: Address) -> Option<U256> {
        GetTotalSupply {
            provider: self.provider.clone(),
            address,
        }
        .retry_get(MAX_RETRIES, RETRY_WAIT_SECS)
        .await
        .map_err(|err| tracing::debug!("totalSupply() failed for {address}: {err}"))
        .ok()
    }
}
