//! # Local Grammar Catalog
//!
//! Resolves grammar locators of the form `scheme://host/path` to files under
//! a local root (`<root>/host/path`), so grammars that ship with the binary
//! are read from disk and never fetched over the network.
//!
//! Locators ending in `/` name programmatic checkers, not files, and are
//! reported as unsupported.

use std::path::{Component, Path, PathBuf};

use crate::traits::{Transport, TransportError, TypedInput, COMPACT_SYNTAX_MEDIA_TYPE};

/// File-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
}

impl LocalCatalog {
    /// A catalog rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Catalog root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a locator maps to, or `None` if the locator is not a
    /// file-shaped URL or tries to escape the root.
    pub fn path_for(&self, locator: &str) -> Option<PathBuf> {
        let (_scheme, rest) = locator.split_once("://")?;
        if rest.is_empty() || rest.ends_with('/') {
            return None;
        }
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let relative = Path::new(rest);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

/// Media type implied by a grammar file's extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("rnc") => Some(COMPACT_SYNTAX_MEDIA_TYPE),
        Some("rng" | "sch" | "xml" | "xsd" | "nvdl") => Some("application/xml"),
        _ => None,
    }
}

impl Transport for LocalCatalog {
    fn fetch(&self, locator: &str) -> Result<TypedInput, TransportError> {
        let path = self
            .path_for(locator)
            .ok_or_else(|| TransportError::Unsupported(locator.to_string()))?;

        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TransportError::NotFound(locator.to_string())
            } else {
                TransportError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        tracing::trace!(locator, path = %path.display(), len = bytes.len(), "read grammar from catalog");

        Ok(TypedInput {
            locator: locator.to_string(),
            media_type: media_type_for(&path).map(str::to_string),
            bytes,
        })
    }
}
