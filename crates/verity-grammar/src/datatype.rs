//! # URL Attribute Datatype
//!
//! The datatype grammar engines consult for URL-valued attributes. The base
//! [`IriRef`] accepts every value; refining collaborators implement
//! [`UrlDatatype`] themselves, overriding [`UrlDatatype::check_valid`] and the
//! policy hooks, and build on the scheme helpers below.

use thiserror::Error;

/// Values longer than this are elided in messages.
pub const ELIDE_LIMIT: usize = 50;

/// A literal was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvalidValue {
    /// What was wrong.
    pub message: String,
}

impl InvalidValue {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// URL datatype capability.
pub trait UrlDatatype: Send + Sync {
    /// Name used in messages.
    fn name(&self) -> &str {
        "URL"
    }

    /// Check one attribute value.
    fn check_valid(&self, _literal: &str) -> Result<(), InvalidValue> {
        Ok(())
    }

    /// Whether relative references are rejected.
    fn is_absolute(&self) -> bool {
        false
    }

    /// Whether only `http`/`https` are allowed.
    fn must_be_http_or_https(&self) -> bool {
        false
    }

    /// Whether messages quote the offending value.
    fn report_value(&self) -> bool {
        false
    }
}

/// The unrefined URL datatype. Never rejects.
#[derive(Debug, Default, Clone, Copy)]
pub struct IriRef;

impl UrlDatatype for IriRef {}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{000C}' | '\r')
}

/// Split `iri` at its scheme. Leading HTML whitespace is skipped; the scheme
/// is returned lowercased together with everything after the colon. `None`
/// when there is no syntactically valid scheme.
pub fn split_scheme(iri: &str) -> Option<(String, &str)> {
    let trimmed = iri.trim_start_matches(is_html_space);
    let mut scheme = String::new();
    for (i, c) in trimmed.char_indices() {
        let c = c.to_ascii_lowercase();
        if i == 0 {
            if !c.is_ascii_lowercase() {
                return None;
            }
            scheme.push(c);
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '+' || c == '.' {
            scheme.push(c);
        } else if c == ':' {
            return Some((scheme, &trimmed[i + 1..]));
        } else {
            return None;
        }
    }
    None
}

/// Strip leading and trailing HTML whitespace.
pub fn trim_html_spaces(value: &str) -> &str {
    value.trim_matches(is_html_space)
}

/// `http` or `https`.
pub fn is_http_or_https(scheme: &str) -> bool {
    matches!(scheme, "http" | "https")
}

/// Schemes that are aliases for `http`.
pub fn is_http_alias(scheme: &str) -> bool {
    matches!(scheme, "feed" | "webcal")
}

/// Schemes whose syntax is well known.
pub fn is_well_known_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https" | "ftp" | "mailto" | "file")
}

/// `value` shortened to [`ELIDE_LIMIT`] characters with a trailing ellipsis.
pub fn elide(value: &str) -> String {
    match value.char_indices().nth(ELIDE_LIMIT) {
        Some((cut, _)) => format!("{}\u{2026}", &value[..cut]),
        None => value.to_string(),
    }
}
