//! In-memory stand-ins for the node and the HTTP transport.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use eth::{
    rpc::EthNodeReading,
    types::{Address, ContractDetails, NftId},
};
use serde_json::Value;
use shared::http::HttpTransport;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};
use url::Url;

#[derive(Default)]
pub struct MockNode {
    pub contracts: HashMap<Address, ContractDetails>,
    pub owners: HashMap<NftId, Address>,
    pub uris: HashMap<NftId, String>,
    /// Emitting contracts keyed by the first block of a scan window.
    pub emitters: HashMap<u64, Vec<Address>>,
    pub failing_windows: HashSet<u64>,
    pub scanned: Mutex<Vec<(u64, u64)>>,
    pub described: Mutex<Vec<Address>>,
}

impl MockNode {
    pub fn scanned_windows(&self) -> Vec<(u64, u64)> {
        self.scanned.lock().unwrap().clone()
    }

    /// Contracts whose details were requested, in request order.
    pub fn described_contracts(&self) -> Vec<Address> {
        self.described.lock().unwrap().clone()
    }
}

#[async_trait]
impl EthNodeReading for MockNode {
    async fn chain_id(&self) -> Result<u64> {
        Ok(1315)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(2_500)
    }

    async fn get_contract_details(&self, address: Address) -> ContractDetails {
        self.described.lock().unwrap().push(address);
        self.contracts
            .get(&address)
            .cloned()
            .unwrap_or(ContractDetails {
                address,
                ..Default::default()
            })
    }

    async fn owner_of(&self, token: NftId) -> Result<Address> {
        self.owners
            .get(&token)
            .copied()
            .ok_or_else(|| anyhow!("Contract call reverted with message: ERC721: invalid token ID"))
    }

    async fn token_uri(&self, token: NftId) -> Result<String> {
        self.uris
            .get(&token)
            .cloned()
            .ok_or_else(|| anyhow!("Contract call reverted with data: 0x"))
    }

    async fn transfer_emitters(&self, start: u64, end: u64) -> Result<HashSet<Address>> {
        self.scanned.lock().unwrap().push((start, end));
        if self.failing_windows.contains(&start) {
            return Err(anyhow!("query returned more than 10000 results"));
        }
        Ok(self
            .emitters
            .get(&start)
            .map(|emitters| emitters.iter().copied().collect())
            .unwrap_or_default())
    }
}

/// Serves fixed JSON documents by URL and records every request.
#[derive(Default)]
pub struct StaticTransport {
    pub responses: HashMap<String, Value>,
    pub requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn new(responses: HashMap<String, Value>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for StaticTransport {
    async fn get_json(&self, url: Url) -> Result<Value> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for url ({url})"))
    }
}
