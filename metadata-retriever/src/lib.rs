use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod data_url;
pub mod homebrew;
pub mod ipfs;
pub mod media;
pub mod uri;
mod util;

pub use homebrew::Homebrew;

#[async_trait]
pub trait MetadataFetching: Send + Sync {
    /// Resolve the metadata document a token URI points at.
    async fn get_nft_metadata(&self, uri: &str) -> Result<Value>;
}
