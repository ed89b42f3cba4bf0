use crate::types::Address;
use ethers::types::U256;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
pub struct NftId {
    pub address: Address,
    pub token_id: U256,
}

impl Display for NftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.token_id)
    }
}

impl NftId {
    pub fn new(address: Address, token_id: impl Into<U256>) -> Self {
        Self {
            address,
            token_id: token_id.into(),
        }
    }
}

/// Collection level information read from an ERC-721 contract.
/// Each field is `None` when the corresponding call failed.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ContractDetails {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<U256>,
}
