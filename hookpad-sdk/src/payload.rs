// ABOUTME: Decoded webhook response bodies prior to normalization
// ABOUTME: Chooses the JSON, binary, or text decoding path from the declared content type

use crate::constants::content_types;
use crate::error::HookpadError;

/// The decoded body of a remote response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Text(String),
    Structured(serde_json::Value),
    Binary(Vec<u8>),
}

/// How a response body should be decoded, derived from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    Json,
    Binary,
    Text,
}

impl DecodePath {
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains(content_types::JSON) => DecodePath::Json,
            Some(ct)
                if ct.contains(content_types::IMAGE_PREFIX)
                    || ct.contains(content_types::OCTET_STREAM) =>
            {
                DecodePath::Binary
            }
            _ => DecodePath::Text,
        }
    }
}

impl Payload {
    /// Decode a raw body. A JSON body that fails to parse is an error, as is
    /// the case for any caller expecting structured data. An empty text body
    /// decodes to [`Payload::Empty`].
    pub fn decode(body: &[u8], content_type: Option<&str>) -> Result<Self, HookpadError> {
        match DecodePath::for_content_type(content_type) {
            DecodePath::Json => {
                let value: serde_json::Value = serde_json::from_slice(body)?;
                Ok(Payload::Structured(value))
            }
            DecodePath::Binary => Ok(Payload::Binary(body.to_vec())),
            DecodePath::Text if body.is_empty() => Ok(Payload::Empty),
            DecodePath::Text => Ok(Payload::Text(decode_text(body))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Text(_) => "text",
            Payload::Structured(_) => "structured",
            Payload::Binary(_) => "binary",
        }
    }
}

/// Decode a text-typed body. Bodies that begin with a known binary file
/// signature are mapped byte-for-char (Latin-1) so the prefix survives for
/// downstream string sniffing; everything else is lossy UTF-8.
pub fn decode_text(body: &[u8]) -> String {
    if has_binary_prefix(body) {
        body.iter().map(|&b| b as char).collect()
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

fn has_binary_prefix(body: &[u8]) -> bool {
    body.starts_with(&[0xFF, 0xD8, 0xFF])
        || body.starts_with(&[0x89, b'P', b'N', b'G'])
        || body.starts_with(b"GIF8")
        || body.starts_with(b"RIFF")
}

/// Response of a webhook call: decoded payload plus declared content type.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub payload: Payload,
    pub content_type: Option<String>,
}
