use data_url::{forgiving_base64::InvalidBase64, DataUrl, DataUrlError};
use serde_json::Value;
use std::{error::Error, fmt};

/// Why an inline `data:` token URI did not yield a metadata document.
#[derive(Debug)]
pub enum InlineDocumentError {
    Malformed(DataUrlError),
    Base64(InvalidBase64),
    Json(serde_json::Error),
    /// Images, svg and other non-JSON payloads.
    NotJson(String),
}

impl fmt::Display for InlineDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed data url: {err}"),
            Self::Base64(err) => write!(f, "invalid base64 payload: {err}"),
            Self::Json(err) => write!(f, "invalid JSON document: {err}"),
            Self::NotJson(mime) => write!(f, "{mime} payload is not a metadata document"),
        }
    }
}

impl Error for InlineDocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Base64(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::NotJson(_) => None,
        }
    }
}

impl From<DataUrlError> for InlineDocumentError {
    fn from(err: DataUrlError) -> Self {
        Self::Malformed(err)
    }
}

impl From<InvalidBase64> for InlineDocumentError {
    fn from(err: InvalidBase64) -> Self {
        Self::Base64(err)
    }
}

impl From<serde_json::Error> for InlineDocumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Decode a `data:` URL carrying a JSON document in place.
///
/// `application/json` bodies must be valid JSON. `text/*` bodies are accepted
/// when they happen to contain JSON, which is common for on-chain metadata.
pub fn decode_data_url(uri: &str) -> Result<Value, InlineDocumentError> {
    // `;utf8,` is a frequent misspelling of the charset parameter and a raw
    // `#` would otherwise start a fragment inside the document.
    let uri = uri.replace(";utf8,", ";charset=utf8,").replace('#', "%23");
    let data_url = DataUrl::process(&uri)?;
    let (body, _) = data_url.decode_to_vec()?;
    let mime = data_url.mime_type();
    let is_json = match mime.type_.as_str() {
        "application" => mime.subtype == "json",
        "text" => true,
        _ => false,
    };
    if !is_json {
        return Err(InlineDocumentError::NotJson(mime.to_string()));
    }
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn utf8_json() {
        let data = r#"data:application/json;utf8,{"name":"Story #1","question":"?"}"#;
        assert_eq!(
            decode_data_url(data).unwrap(),
            json!({"name": "Story #1", "question": "?"})
        );
    }

    #[test]
    fn base64_json() {
        // {"name": "IP Asset 7", "image": "ipfs://QmQVHMRMhVGqQH4vPDgxK2Y3rnToQSVbbhbyTq7qnVbgoA"}
        let data = "data:application/json;base64,eyJuYW1lIjogIklQIEFzc2V0IDciLCAiaW1hZ2UiOiAiaXBmczovL1FtUVZITVJNaFZHcVFINHZQRGd4SzJZM3JuVG9RU1ZiYmhieVRxN3FuVmJnb0EifQ==";
        let value = decode_data_url(data).unwrap();
        assert_eq!(value["name"], json!("IP Asset 7"));
        assert_eq!(
            value["image"],
            json!("ipfs://QmQVHMRMhVGqQH4vPDgxK2Y3rnToQSVbbhbyTq7qnVbgoA")
        );
    }

    #[test]
    fn percent_encoded_text() {
        let data = "data:text/plain,%7B%22name%22%3A%22License%20Token%22%2C%22attributes%22%3A%5B%5D%7D";
        assert_eq!(
            decode_data_url(data).unwrap(),
            json!({"name": "License Token", "attributes": []})
        );
    }

    #[test]
    fn rejects_broken_payloads() {
        assert!(decode_data_url("data:application/json;base64,eyJuYW1lIjoi")
            .unwrap_err()
            .to_string()
            .starts_with("invalid JSON document: EOF while parsing a string"));
        assert!(matches!(
            decode_data_url("data:application/json;base64,e"),
            Err(InlineDocumentError::Base64(_))
        ));
        assert!(matches!(
            decode_data_url("https://ipfs.io/ipfs/QmeP3a2bFdeTMNeyM9UcDswtJg7Y2PUDYmYLvscVCmLvqX"),
            Err(InlineDocumentError::Malformed(_))
        ));
        assert!(decode_data_url("data:text/plain;charset=utf-8,%E2%98%B3%0A").is_err());
    }

    #[test]
    fn images_are_not_documents() {
        assert_eq!(
            decode_data_url("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=")
                .unwrap_err()
                .to_string(),
            "image/svg+xml payload is not a metadata document"
        );
    }
}
