use anyhow::anyhow;
use url::Url;

pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
pub const ARWEAVE_GATEWAY: &str = "https://arweave.net/";

/// Returns an HTTP url for an IPFS object.
pub fn http_link_ipfs(url: &Url) -> anyhow::Result<Url> {
    Url::parse(IPFS_GATEWAY)?
        .join(
            url.as_str()
                .trim_start_matches("ipfs://")
                .trim_start_matches("ipfs/"),
        )
        .map_err(|e| anyhow!(e.to_string()))
}

pub trait TryFromStr: Sized {
    fn try_from_str(s: &str) -> Option<Self>;
}
