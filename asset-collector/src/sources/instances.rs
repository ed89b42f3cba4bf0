use crate::{
    collector::AssetSource,
    models::{AssetRecord, Container, SourceKind, TokenId},
};
use async_trait::async_trait;
use explorer::{
    models::{TokenInfo, TokenInstance},
    ExplorerClient, Listing,
};
use std::sync::Arc;

/// Page limits for the `/tokens` and `/tokens/{address}/instances` listings.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancePaging {
    pub page_size: u32,
    pub max_token_pages: usize,
    pub max_instance_pages: usize,
}

impl Default for InstancePaging {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_token_pages: 20,
            max_instance_pages: 10,
        }
    }
}

/// ERC-721 collections listed by the explorer, with members taken straight
/// from the instance listing (which already embeds metadata).
pub struct InstanceSource {
    explorer: Arc<ExplorerClient>,
    paging: InstancePaging,
}

impl InstanceSource {
    pub fn new(explorer: Arc<ExplorerClient>, paging: InstancePaging) -> Self {
        Self { explorer, paging }
    }
}

#[async_trait]
impl AssetSource for InstanceSource {
    type Member = TokenInstance;

    fn kind(&self) -> SourceKind {
        SourceKind::TokenInstancesPagination
    }

    async fn containers(&self) -> Vec<Container> {
        let tokens: Vec<TokenInfo> = self
            .explorer
            .paginate(
                &Listing::Tokens,
                self.paging.page_size,
                self.paging.max_token_pages,
            )
            .await;
        tokens
            .iter()
            .filter(|token| token.is_erc721())
            .filter_map(Container::from_token_info)
            .collect()
    }

    async fn discover(&self, container: &Container) -> Vec<TokenInstance> {
        let instances: Vec<TokenInstance> = self
            .explorer
            .paginate(
                &Listing::Instances(container.address),
                self.paging.page_size,
                self.paging.max_instance_pages,
            )
            .await;
        instances
            .into_iter()
            .filter(|instance| instance.token_id().is_some())
            .collect()
    }

    async fn resolve(&self, container: &Container, instance: TokenInstance) -> Option<AssetRecord> {
        let token_id = TokenId::new(instance.token_id()?);
        Some(AssetRecord::from_instance(
            container,
            token_id,
            &instance,
            SourceKind::TokenInstancesPagination,
        ))
    }
}
