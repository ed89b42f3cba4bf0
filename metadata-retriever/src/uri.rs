use crate::{
    ipfs::IpfsPath,
    util::{http_link_ipfs, TryFromStr, ARWEAVE_GATEWAY},
};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::str::FromStr;
use url::Url;

/// Classification of a token URI by how its document can be obtained.
#[derive(Debug, PartialEq)]
pub enum UriType {
    /// Directly retrievable over HTTP(S), gateway rewrites already applied.
    Url(Url),
    /// Content addressed, retrievable through the IPFS gateway.
    Ipfs(IpfsPath),
    /// Self contained `data:` URL, decoded locally.
    Data(String),
    /// The URI itself is a JSON document.
    Json(Value),
    InvalidUrl(String),
}

impl FromStr for UriType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Inline documents first: base64 payloads can contain CID lookalikes.
        if s.starts_with("data:") {
            return Ok(Self::Data(s.to_string()));
        }
        // A bare JSON document is inline too, even when its fields mention a CID.
        if s.starts_with('{') || s.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(s) {
                return Ok(Self::Json(value));
            }
        }
        // Any embedded CID is served from the gateway, whatever host it was pinned on.
        if let Some(path) = IpfsPath::try_from_str(s) {
            return Ok(Self::Ipfs(path));
        }
        match Url::parse(s) {
            Ok(url) => {
                if url.cannot_be_a_base() {
                    return Ok(Self::Data(s.to_string()));
                }
                match url.scheme() {
                    "ar" => {
                        let hash = url
                            .host_str()
                            .ok_or_else(|| anyhow!("arweave uri without hash: {s}"))?;
                        Ok(Self::Url(Url::parse(&format!(
                            "{ARWEAVE_GATEWAY}{hash}{}",
                            url.path()
                        ))?))
                    }
                    "ipfs" => Ok(Self::Url(http_link_ipfs(&url)?)),
                    _ => Ok(Self::Url(url)),
                }
            }
            Err(err) => Ok(serde_json::from_str::<Value>(s)
                .map(Self::Json)
                .unwrap_or_else(|_| Self::InvalidUrl(err.to_string()))),
        }
    }
}

impl UriType {
    /// A browsable link for the locator: gateway URL for content addressed
    /// pointers, the locator itself otherwise.
    pub fn link(locator: &str) -> Option<String> {
        match UriType::from_str(locator).ok()? {
            UriType::Url(url) => Some(url.to_string()),
            UriType::Ipfs(path) => path.gateway_url().ok().map(|url| url.to_string()),
            UriType::Data(data) => Some(data),
            UriType::Json(_) | UriType::InvalidUrl(_) => None,
        }
    }
}
