//! Content-type classification.
//!
//! Decides whether a body goes through the HTML pipeline, is read as plain
//! text, or cannot be treated as text at all.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use pagetext_core::Error;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_BYTES: usize = 1024;

/// How a response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Text,
    Binary,
}

/// Media type without parameters, lowercased.
pub fn media_type(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Classify by `Content-Type`, sniffing the body when the header is absent.
pub fn classify(content_type: Option<&str>, body: &[u8]) -> ContentKind {
    let Some(mime) = content_type.map(media_type).filter(|m| !m.is_empty()) else {
        return if looks_binary(body) { ContentKind::Binary } else { ContentKind::Html };
    };

    match mime.as_str() {
        "text/html" | "application/xhtml+xml" => ContentKind::Html,
        "application/json" | "application/xml" | "application/javascript" | "application/ecmascript" => {
            ContentKind::Text
        }
        m if m.starts_with("text/") || m.ends_with("+xml") || m.ends_with("+json") => ContentKind::Text,
        _ => ContentKind::Binary,
    }
}

/// Classify and apply the text fallback for binary-declared bodies.
///
/// Servers often mislabel pages as `application/octet-stream`; such a body is
/// still read when it is valid UTF-8 without NUL bytes.
pub fn resolve(content_type: Option<&str>, body: &[u8]) -> Result<ContentKind, Error> {
    match classify(content_type, body) {
        ContentKind::Binary => {
            if looks_binary(body) || std::str::from_utf8(body).is_err() {
                return Err(Error::Parse(format!(
                    "binary content ({}) cannot be read as text",
                    content_type.map(media_type).unwrap_or_else(|| "unknown type".into())
                )));
            }

            let starts_with_markup = body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<');
            tracing::debug!(?content_type, "binary content type holds text, falling back");
            Ok(if starts_with_markup { ContentKind::Html } else { ContentKind::Text })
        }
        kind => Ok(kind),
    }
}

/// NUL bytes near the start mean binary, unless a UTF-16 BOM explains them.
pub fn looks_binary(body: &[u8]) -> bool {
    if let Some((enc, _)) = Encoding::for_bom(body)
        && (enc == UTF_16LE || enc == UTF_16BE)
    {
        return false;
    }
    body[..body.len().min(BINARY_SNIFF_BYTES)].contains(&0)
}
