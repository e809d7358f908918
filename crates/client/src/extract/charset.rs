//! Character encoding detection and decoding.
//!
//! Precedence: `Content-Type` charset, then byte-order mark, then a
//! `<meta>` declaration near the top of the document, then UTF-8.
//! Decoding never fails; malformed sequences become U+FFFD.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::Regex;

/// How far into the body a `<meta>` charset declaration is looked for.
const META_SNIFF_BYTES: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*?\bcharset\s*=\s*["']?\s*([A-Za-z0-9._:\-]+)"#).expect("valid meta charset regex")
});

/// Where the encoding decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    Header,
    Bom,
    Meta,
    Default,
}

/// Encoding chosen for a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedCharset {
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
}

/// Text produced by decoding a body.
#[derive(Debug, Clone)]
pub struct DecodedBody {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
    /// Whether any malformed sequence was replaced.
    pub had_errors: bool,
}

/// Resolve a charset label, tolerating common non-WHATWG spellings.
///
/// `latin-1`, `utf8` or `ISO_8859_1` resolve the same as their registered labels.
pub fn lookup_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().trim_matches(|c| c == '"' || c == '\'');
    if label.is_empty() {
        return None;
    }

    Encoding::for_label(label.as_bytes()).or_else(|| {
        let squashed: String = label.chars().filter(|c| *c != '-' && *c != '_').collect();
        Encoding::for_label(squashed.as_bytes())
    })
}

/// Pull the `charset` parameter out of a `Content-Type` value.
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Find a `<meta charset>` or `<meta http-equiv="Content-Type">` declaration.
pub fn sniff_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str();

    // A document that declares UTF-16 in ASCII-compatible bytes is not UTF-16.
    lookup_label(label).map(|enc| if enc == UTF_16LE || enc == UTF_16BE { UTF_8 } else { enc })
}

/// Decide which encoding to decode `bytes` with.
pub fn detect_charset(bytes: &[u8], content_type: Option<&str>) -> DetectedCharset {
    if let Some(encoding) = content_type.and_then(charset_param).and_then(lookup_label) {
        return DetectedCharset { encoding, source: CharsetSource::Header };
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return DetectedCharset { encoding, source: CharsetSource::Bom };
    }

    if let Some(encoding) = sniff_meta(bytes) {
        return DetectedCharset { encoding, source: CharsetSource::Meta };
    }

    DetectedCharset { encoding: UTF_8, source: CharsetSource::Default }
}

/// Decode a body with the detected encoding, replacing malformed input.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedBody {
    let detected = detect_charset(bytes, content_type);
    let (text, had_errors) = detected.encoding.decode_with_bom_removal(bytes);

    if had_errors {
        tracing::debug!(encoding = detected.encoding.name(), "replaced malformed byte sequences while decoding");
    }

    DecodedBody { text: text.into_owned(), encoding: detected.encoding, source: detected.source, had_errors }
}
