//! # Content-Type Consistency
//!
//! Compares a declared media type with the root namespace actually found.
//! Only five well-known media types imply a namespace; anything else is
//! never questioned.

use verity_core::preset::{NS_ATOM, NS_DOCBOOK, NS_SVG, NS_XHTML};

/// Media types that imply a root namespace, sorted by media type.
pub const KNOWN_CONTENT_TYPES: [(&str, &str); 5] = [
    ("application/atom+xml", NS_ATOM),
    ("application/docbook+xml", NS_DOCBOOK),
    ("application/xhtml+xml", NS_XHTML),
    ("application/xv+xml", NS_XHTML),
    ("image/svg+xml", NS_SVG),
];

/// Namespace implied by `content_type`. Parameters (`; charset=...`) and
/// letter case are ignored.
pub fn expected_namespace(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    KNOWN_CONTENT_TYPES
        .binary_search_by(|(known, _)| (*known).cmp(essence.as_str()))
        .ok()
        .map(|i| KNOWN_CONTENT_TYPES[i].1)
}

/// Warning text when `content_type` is inappropriate for a document whose
/// root is in `namespace` (empty for no namespace), or `None`.
pub fn check(content_type: &str, namespace: &str) -> Option<String> {
    let expected = expected_namespace(content_type)?;
    if expected == namespace {
        return None;
    }
    Some(if namespace.is_empty() {
        format!(
            "\u{201C}{content_type}\u{201D} is not an appropriate Content-Type for a document whose root element is not in a namespace."
        )
    } else {
        format!(
            "\u{201C}{content_type}\u{201D} is not an appropriate Content-Type for a document whose root namespace is \u{201C}{namespace}\u{201D}."
        )
    })
}
