use eth::types::{Address, ContractDetails, U256};
use explorer::models::{TokenInfo, TokenInstance};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Identifier of a member within its container. Kept in decimal string form
/// since explorer ids are not guaranteed to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form for contract calls.
    pub fn as_u256(&self) -> Option<U256> {
        U256::from_dec_str(&self.0).ok()
    }
}

impl From<u64> for TokenId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<U256> for TokenId {
    fn from(id: U256) -> Self {
        Self(id.to_string())
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collection contract, as read from the node or the explorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    /// Advisory only. Contracts and explorers both get this wrong.
    pub total_supply: Option<String>,
    pub holders: Option<String>,
}

impl Container {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            name: None,
            symbol: None,
            token_type: None,
            total_supply: None,
            holders: None,
        }
    }

    /// Explorer listing entry, `None` when it carries no usable address.
    pub fn from_token_info(info: &TokenInfo) -> Option<Self> {
        let address = match info.address()?.parse::<Address>() {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!("ignoring token with invalid address {:?}: {err}", info.address());
                return None;
            }
        };
        Some(Self {
            address,
            name: info.name.clone(),
            symbol: info.symbol.clone(),
            token_type: info.token_type.clone(),
            total_supply: info.total_supply.clone(),
            holders: info.holders().map(str::to_string),
        })
    }

    /// Declared supply clamped to `u64`, zero when absent or unparsable.
    pub fn declared_supply(&self) -> u64 {
        self.total_supply
            .as_deref()
            .and_then(|supply| U256::from_dec_str(supply).ok())
            .map(|supply| {
                if supply > U256::from(u64::MAX) {
                    u64::MAX
                } else {
                    supply.as_u64()
                }
            })
            .unwrap_or_default()
    }
}

impl From<ContractDetails> for Container {
    fn from(details: ContractDetails) -> Self {
        Self {
            name: details.name,
            symbol: details.symbol,
            total_supply: details.total_supply.map(|supply| supply.to_string()),
            ..Self::new(details.address)
        }
    }
}

/// Strategy that produced an [`AssetRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ChainProbe,
    TokenTransfers,
    TokenInstancesPagination,
}

/// Uniform output record. Every field but the identity pair and `source`
/// may be null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    pub token_id: TokenId,
    pub token_address: Address,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub token_type: Option<String>,
    pub total_supply: Option<String>,
    pub holders: Option<String>,
    pub owner: Option<String>,
    pub token_uri: Option<String>,
    pub metadata: Option<Value>,
    pub image_url: Option<String>,
    pub animation_url: Option<String>,
    pub source: SourceKind,
}

impl AssetRecord {
    /// Record carrying only what is known about the container.
    pub fn new(container: &Container, token_id: TokenId, source: SourceKind) -> Self {
        Self {
            token_id,
            token_address: container.address,
            token_name: container.name.clone(),
            token_symbol: container.symbol.clone(),
            token_type: container.token_type.clone(),
            total_supply: container.total_supply.clone(),
            holders: container.holders.clone(),
            owner: None,
            token_uri: None,
            metadata: None,
            image_url: None,
            animation_url: None,
            source,
        }
    }

    pub fn from_instance(
        container: &Container,
        token_id: TokenId,
        instance: &TokenInstance,
        source: SourceKind,
    ) -> Self {
        Self {
            owner: instance.owner().map(str::to_string),
            metadata: instance.metadata.clone().filter(|metadata| !metadata.is_null()),
            image_url: instance.image_url.clone(),
            animation_url: instance.animation_url.clone(),
            ..Self::new(container, token_id, source)
        }
    }

    pub fn key(&self) -> (Address, TokenId) {
        (self.token_address, self.token_id.clone())
    }
}
