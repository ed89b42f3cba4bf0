use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `"123"`, `123` or `null` for fields the explorer is not
/// consistent about.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Opaque continuation handed out by the explorer in `next_page_params`.
/// Sent back verbatim as query parameters (usually just `page_key`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(pub Vec<(String, String)>);

/// One page of any listing endpoint: `{items: [...], next_page_params: {...}}`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Page {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Value>,
    #[serde(default)]
    pub next_page_params: Option<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Page {
    pub fn next_cursor(&self) -> Option<PageCursor> {
        let params = self.next_page_params.as_ref()?.as_object()?;
        let pairs: Vec<(String, String)> = params
            .iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) if !s.is_empty() => Some((key.clone(), s.clone())),
                Value::Number(n) => Some((key.clone(), n.to_string())),
                Value::Bool(b) => Some((key.clone(), b.to_string())),
                _ => None,
            })
            .collect();
        (!pairs.is_empty()).then_some(PageCursor(pairs))
    }

    /// Typed items of the page. `null` entries and entries that do not fit `T`
    /// are skipped.
    pub fn parse_items<T: DeserializeOwned>(&self) -> Vec<T> {
        self.items
            .iter()
            .filter(|item| !item.is_null())
            .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::warn!("skipping unrecognized listing item ({err}): {item}");
                    None
                }
            })
            .collect()
    }
}

/// Token (collection) record from `/tokens` and `/tokens/{address}`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TokenInfo {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    address_hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub total_supply: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    holders: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    holders_count: Option<String>,
}

impl TokenInfo {
    pub const ERC721: &'static str = "ERC-721";

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().or(self.address_hash.as_deref())
    }

    pub fn holders(&self) -> Option<&str> {
        self.holders.as_deref().or(self.holders_count.as_deref())
    }

    pub fn is_erc721(&self) -> bool {
        self.token_type.as_deref() == Some(Self::ERC721)
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Owner {
    #[serde(default)]
    pub hash: Option<String>,
}

/// A single NFT from `/tokens/{address}/instances[/{id}]`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TokenInstance {
    #[serde(default, deserialize_with = "string_or_number")]
    token_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub animation_url: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

impl TokenInstance {
    pub fn token_id(&self) -> Option<&str> {
        self.token_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_ref()?.hash.as_deref()
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TransferTotal {
    #[serde(default, deserialize_with = "string_or_number")]
    pub token_id: Option<String>,
}

/// Item of `/token-transfers`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TokenTransfer {
    #[serde(default)]
    pub token: Option<TokenInfo>,
    #[serde(default)]
    pub total: Option<TransferTotal>,
}

impl TokenTransfer {
    pub fn token_id(&self) -> Option<&str> {
        self.total
            .as_ref()?
            .token_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}
