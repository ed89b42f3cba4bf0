use crate::models::{Page, PageCursor, TokenInfo, TokenInstance};
use anyhow::{anyhow, Context, Result};
use eth::types::Address;
use serde::de::DeserializeOwned;
use shared::http::HttpTransport;
use std::sync::Arc;
use url::Url;

/// Paginated listings exposed by the explorer.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Tokens,
    TokenTransfers,
    Instances(Address),
}

impl Listing {
    fn segments(&self) -> Vec<String> {
        match self {
            Listing::Tokens => vec!["tokens".into()],
            Listing::TokenTransfers => vec!["token-transfers".into()],
            Listing::Instances(address) => {
                vec!["tokens".into(), address.to_string(), "instances".into()]
            }
        }
    }
}

/// Client for a Blockscout style `api/v2` REST explorer.
pub struct ExplorerClient {
    base: Url,
    transport: Arc<dyn HttpTransport>,
}

impl ExplorerClient {
    pub fn new(base: &str, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid explorer url {base}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("explorer url {base} cannot be a base"));
        }
        Ok(Self { base, transport })
    }

    fn url(&self, segments: &[String], query: &[(String, String)]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("explorer url {} cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn page(
        &self,
        listing: &Listing,
        page_size: u32,
        cursor: Option<&PageCursor>,
    ) -> Result<Page> {
        let mut query = vec![("limit".to_string(), page_size.to_string())];
        if let Some(PageCursor(params)) = cursor {
            query.extend(params.iter().cloned());
        }
        let url = self.url(&listing.segments(), &query)?;
        let value = self.transport.get_json(url.clone()).await?;
        serde_json::from_value(value).with_context(|| format!("unexpected page shape from {url}"))
    }

    /// Follow `listing` page by page until an empty page, a page without a
    /// cursor, a failed request or `max_pages` requests, whichever is first.
    /// Items of every page fetched successfully are kept.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        listing: &Listing,
        page_size: u32,
        max_pages: usize,
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut cursor: Option<PageCursor> = None;
        for page_number in 1..=max_pages {
            tracing::debug!("fetching {listing:?} page {page_number}");
            let page = match self.page(listing, page_size, cursor.as_ref()).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!("stopping {listing:?} at page {page_number}: {err:#}");
                    break;
                }
            };
            if page.items.is_empty() {
                tracing::debug!("{listing:?} page {page_number} is empty");
                break;
            }
            items.extend(page.parse_items::<T>());
            match page.next_cursor() {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        tracing::debug!("collected {} items from {listing:?}", items.len());
        items
    }

    pub async fn token(&self, address: &Address) -> Result<TokenInfo> {
        let url = self.url(&["tokens".into(), address.to_string()], &[])?;
        let value = self.transport.get_json(url).await?;
        serde_json::from_value(value).with_context(|| format!("unexpected token shape for {address}"))
    }

    pub async fn instance(&self, address: &Address, token_id: &str) -> Result<TokenInstance> {
        let url = self.url(
            &[
                "tokens".into(),
                address.to_string(),
                "instances".into(),
                token_id.to_string(),
            ],
            &[],
        )?;
        let value = self.transport.get_json(url).await?;
        serde_json::from_value(value)
            .with_context(|| format!("unexpected instance shape for {address}:{token_id}"))
    }
}
