use crate::{data_url::decode_data_url, uri::UriType, MetadataFetching};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use shared::http::HttpTransport;
use std::{str::FromStr, sync::Arc};

/// Resolves metadata documents without third party NFT APIs: HTTP and gateway
/// URLs go through the transport, inline documents are decoded in place.
pub struct Homebrew {
    transport: Arc<dyn HttpTransport>,
}

impl Homebrew {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MetadataFetching for Homebrew {
    async fn get_nft_metadata(&self, uri: &str) -> Result<Value> {
        let metadata_url = match UriType::from_str(uri)? {
            UriType::Url(url) => url,
            UriType::Ipfs(path) => path.gateway_url()?,
            UriType::Data(data) => return Ok(decode_data_url(&data)?),
            UriType::Json(value) => return Ok(value),
            UriType::InvalidUrl(err) => return Err(anyhow!("invalid token uri {uri:?}: {err}")),
        };
        tracing::debug!("Reqwest content at {metadata_url}");
        let value = self.transport.get_json(metadata_url).await?;
        tracing::debug!("Reqwest response {:?}", value);
        Ok(value)
    }
}
