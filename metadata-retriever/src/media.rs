use crate::uri::UriType;
use serde_json::Value;

/// Media locators advertised by a metadata document.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct MediaLinks {
    pub image_url: Option<String>,
    pub animation_url: Option<String>,
}

impl MediaLinks {
    pub fn from_metadata(metadata: &Value) -> Self {
        let link = |field: &str| {
            metadata
                .get(field)
                .and_then(Value::as_str)
                .filter(|locator| !locator.trim().is_empty())
                .and_then(UriType::link)
        };
        Self {
            image_url: link("image").or_else(|| link("image_url")),
            animation_url: link("animation_url"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn links_from_document() {
        let metadata = json!({
            "name": "Story NFT #3",
            "image": "ipfs://QmQVHMRMhVGqQH4vPDgxK2Y3rnToQSVbbhbyTq7qnVbgoA",
            "animation_url": "https://example.com/3.mp4",
        });
        assert_eq!(
            MediaLinks::from_metadata(&metadata),
            MediaLinks {
                image_url: Some(
                    "https://ipfs.io/ipfs/QmQVHMRMhVGqQH4vPDgxK2Y3rnToQSVbbhbyTq7qnVbgoA".into()
                ),
                animation_url: Some("https://example.com/3.mp4".into()),
            }
        );
    }

    #[test]
    fn missing_or_unusable_links() {
        assert_eq!(
            MediaLinks::from_metadata(&json!({"image": "", "animation_url": 7})),
            MediaLinks::default()
        );
        assert_eq!(MediaLinks::from_metadata(&json!("just a string")), MediaLinks::default());
    }
}
