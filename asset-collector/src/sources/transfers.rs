use crate::{
    collector::AssetSource,
    models::{AssetRecord, Container, SourceKind, TokenId},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use eth::types::Address;
use explorer::{models::TokenTransfer, ExplorerClient, Listing};
use std::{collections::HashMap, sync::Arc};

/// ERC-721 collections and ids seen in the explorer's recent transfers.
pub struct TransferSource {
    explorer: Arc<ExplorerClient>,
    found: Vec<(Container, Vec<TokenId>)>,
}

impl TransferSource {
    /// Walks the `/token-transfers` listing once up front; containers and
    /// members are both derived from it.
    pub async fn load(explorer: Arc<ExplorerClient>, page_size: u32, max_pages: usize) -> Self {
        let transfers: Vec<TokenTransfer> = explorer
            .paginate(&Listing::TokenTransfers, page_size, max_pages)
            .await;
        tracing::info!("loaded {} token transfers", transfers.len());
        Self {
            explorer,
            found: group_transfers(&transfers),
        }
    }
}

/// ERC-721 transfers grouped by collection, each id once, in order of first
/// appearance.
fn group_transfers(transfers: &[TokenTransfer]) -> Vec<(Container, Vec<TokenId>)> {
    let mut found: Vec<(Container, Vec<TokenId>)> = Vec::new();
    let mut positions: HashMap<Address, usize> = HashMap::new();
    for transfer in transfers {
        let (Some(token), Some(token_id)) = (&transfer.token, transfer.token_id()) else {
            continue;
        };
        if !token.is_erc721() {
            continue;
        }
        let Some(container) = Container::from_token_info(token) else {
            continue;
        };
        let position = *positions.entry(container.address).or_insert_with(|| {
            found.push((container, Vec::new()));
            found.len() - 1
        });
        let ids = &mut found[position].1;
        let token_id = TokenId::new(token_id);
        if !ids.contains(&token_id) {
            ids.push(token_id);
        }
    }
    found
}

#[async_trait]
impl AssetSource for TransferSource {
    type Member = TokenId;

    fn kind(&self) -> SourceKind {
        SourceKind::TokenTransfers
    }

    async fn containers(&self) -> Vec<Container> {
        self.found.iter().map(|(container, _)| container.clone()).collect()
    }

    async fn discover(&self, container: &Container) -> Vec<TokenId> {
        self.found
            .iter()
            .find(|(known, _)| known.address == container.address)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    }

    async fn resolve(&self, container: &Container, token_id: TokenId) -> Option<AssetRecord> {
        match self
            .explorer
            .instance(&container.address, token_id.as_str())
            .await
        {
            Ok(instance) => Some(AssetRecord::from_instance(
                container,
                token_id,
                &instance,
                SourceKind::TokenTransfers,
            )),
            Err(err) => {
                tracing::warn!(
                    "failed to get details for {}:{token_id}: {err:#}",
                    container.address
                );
                None
            }
        }
    }
}

/// A single token looked up by collection and id. `None` when the explorer
/// has no such instance; a failing collection lookup is an error.
pub async fn fetch_single_asset(
    explorer: &ExplorerClient,
    address: Address,
    token_id: TokenId,
) -> Result<Option<AssetRecord>> {
    let info = explorer
        .token(&address)
        .await
        .with_context(|| format!("token info for {address}"))?;
    let container = Container {
        name: info.name.clone(),
        symbol: info.symbol.clone(),
        token_type: info.token_type.clone(),
        total_supply: info.total_supply.clone(),
        holders: info.holders().map(str::to_string),
        ..Container::new(address)
    };
    Ok(match explorer.instance(&address, token_id.as_str()).await {
        Ok(instance) => Some(AssetRecord::from_instance(
            &container,
            token_id,
            &instance,
            SourceKind::TokenTransfers,
        )),
        Err(err) => {
            tracing::warn!("failed to get details for {address}:{token_id}: {err:#}");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collector::Collector, testing::StaticTransport};
    use maplit::hashmap;
    use serde_json::{json, Value};

    const BASE: &str = "https://aeneid.storyscan.xyz/api/v2";

    fn collection() -> Address {
        "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap()
    }

    fn transfer(address: &str, kind: &str, token_id: Value) -> Value {
        json!({
            "token": {"address": address, "name": "Story", "type": kind},
            "total": {"token_id": token_id},
        })
    }

    #[test]
    fn groups_erc721_transfers() {
        let address = collection().to_string();
        let other = Address::from(2).to_string();
        let transfers: Vec<TokenTransfer> = serde_json::from_value(json!([
            transfer(&address, "ERC-721", json!("1")),
            transfer(&other, "ERC-20", json!(null)),
            transfer(&other, "ERC-721", json!(4)),
            transfer(&address, "ERC-721", json!("1")),
            transfer(&address, "ERC-721", json!("2")),
            {"token": null, "total": {"token_id": "9"}},
            transfer(&address, "ERC-721", json!(null)),
        ]))
        .unwrap();
        let grouped: Vec<(Address, Vec<String>)> = group_transfers(&transfers)
            .into_iter()
            .map(|(container, ids)| {
                (
                    container.address,
                    ids.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        assert_eq!(
            grouped,
            vec![
                (collection(), vec!["1".to_string(), "2".to_string()]),
                (Address::from(2), vec!["4".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn resolves_through_instance_lookup() {
        let address = collection();
        let transport = Arc::new(StaticTransport::new(hashmap! {
            format!("{BASE}/token-transfers?limit=100") => json!({
                "items": [
                    transfer(&address.to_string(), "ERC-721", json!("1")),
                    transfer(&address.to_string(), "ERC-721", json!("2")),
                ],
                "next_page_params": null,
            }),
            format!("{BASE}/tokens/{address}/instances/1") => json!({
                "id": "1",
                "metadata": {"name": "One"},
                "image_url": "https://example.com/1.png",
                "owner": {"hash": "0x0000000000000000000000000000000000000007"},
            }),
        }));
        let explorer = Arc::new(ExplorerClient::new(BASE, transport.clone()).unwrap());
        let source = TransferSource::load(explorer, 100, 20).await;
        let mut collector = Collector::new(5);
        assert_eq!(collector.collect(&source).await, 1);

        let record = &collector.records()[0];
        assert_eq!(record.token_id.as_str(), "1");
        assert_eq!(record.token_name.as_deref(), Some("Story"));
        assert_eq!(record.metadata, Some(json!({"name": "One"})));
        assert_eq!(record.image_url.as_deref(), Some("https://example.com/1.png"));
        assert_eq!(
            record.owner.as_deref(),
            Some("0x0000000000000000000000000000000000000007")
        );
        assert_eq!(record.source, SourceKind::TokenTransfers);
        // instance 2 is unknown to the explorer
        assert!(transport
            .requests()
            .contains(&format!("{BASE}/tokens/{address}/instances/2")));
    }

    #[tokio::test]
    async fn single_asset() {
        let address = collection();
        let transport = Arc::new(StaticTransport::new(hashmap! {
            format!("{BASE}/tokens/{address}") => json!({
                "address_hash": address.to_string(),
                "name": "Story",
                "type": "ERC-721",
                "holders_count": "3",
            }),
            format!("{BASE}/tokens/{address}/instances/8") => json!({"id": "8"}),
        }));
        let explorer = ExplorerClient::new(BASE, transport).unwrap();

        let record = fetch_single_asset(&explorer, address, TokenId::from(8))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.holders.as_deref(), Some("3"));
        assert_eq!(record.token_type.as_deref(), Some("ERC-721"));
        assert_eq!(record.metadata, None);

        let missing = fetch_single_asset(&explorer, address, TokenId::from(9))
            .await
            .unwrap();
        assert_eq!(missing, None);

        assert!(fetch_single_asset(&explorer, Address::from(1), TokenId::from(1))
            .await
            .is_err());
    }
}
