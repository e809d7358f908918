//! Whitespace normalization for extracted text.

/// Collapse every run of Unicode whitespace to a single space and trim.
///
/// `&nbsp;` and other non-breaking spaces count as whitespace.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
