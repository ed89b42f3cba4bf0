use crate::util::{TryFromStr, IPFS_GATEWAY};
use cid::Cid;
use regex::Regex;
use std::{fmt, sync::OnceLock};
use url::Url;

pub const CID_REGEX: &str = r"(Qm[1-9A-HJ-NP-Za-km-z]{44}|b[A-Za-z2-7]{58,}|B[A-Z2-7]{58,}|z[1-9A-HJ-NP-Za-km-z]{48,}|F[0-9A-F]{50,})";

fn cid_regex() -> &'static Regex {
    static CID_RE: OnceLock<Regex> = OnceLock::new();
    CID_RE.get_or_init(|| Regex::new(CID_REGEX).expect("static CID pattern"))
}

/// A content-addressed object: a CID plus an optional path inside it.
#[derive(Debug, PartialEq, Clone)]
pub struct IpfsPath {
    cid: Cid,
    ext: Option<String>,
}

impl fmt::Display for IpfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ext {
            Some(value) => write!(f, "{}/{}", self.cid, value),
            None => write!(f, "{}", self.cid),
        }
    }
}

impl IpfsPath {
    /// Location of this object on the public gateway.
    pub fn gateway_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{IPFS_GATEWAY}{self}"))
    }
}

impl TryFromStr for IpfsPath {
    /// Finds the first valid CID anywhere in `s` (gateway URL, subdomain
    /// gateway, `ipfs://` or bare) and keeps the path that follows it.
    fn try_from_str(s: &str) -> Option<Self> {
        let found = cid_regex().find(s)?;
        let cid = found.as_str().parse::<Cid>().ok()?;
        let tail = s[found.end()..].split(['?', '#']).next().unwrap_or_default();
        let ext = tail
            .split_once('/')
            .map(|(_, path)| path)
            .filter(|path| !path.is_empty())
            .map(str::to_string);
        Some(Self { cid, ext })
    }
}
