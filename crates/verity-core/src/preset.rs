//! # Preset Table
//!
//! Immutable mapping from a small integer type id to a human label, an
//! ordered list of grammar locators (highest priority first) and, for
//! presets selectable by root namespace, an XML namespace.
//!
//! Built once at startup, either from the built-in rows, from tab-separated
//! text (`type_id<TAB>label<TAB>locators<TAB>namespace`), or from any serde
//! source of [`PresetRow`]s. The table is then shared by `Arc` and never
//! mutated.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationFault;

/// XHTML namespace.
pub const NS_XHTML: &str = "http://www.w3.org/1999/xhtml";
/// SVG namespace.
pub const NS_SVG: &str = "http://www.w3.org/2000/svg";
/// Atom namespace.
pub const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
/// DocBook 5 namespace.
pub const NS_DOCBOOK: &str = "http://docbook.org/ns/docbook";

/// Preset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    /// XHTML 1.0 Transitional (also used for HTML 4 Transitional doctypes).
    pub const XHTML1_TRANSITIONAL: TypeId = TypeId(1);
    /// XHTML 1.0 Strict (also used for HTML 4 Strict doctypes).
    pub const XHTML1_STRICT: TypeId = TypeId(2);
    /// The modern HTML preset; the fallback for unknown doctypes.
    pub const HTML: TypeId = TypeId(3);
    /// XHTML 1.0 Frameset.
    pub const XHTML1_FRAMESET: TypeId = TypeId(4);
    /// XHTML served as XML.
    pub const XHTML5: TypeId = TypeId(7);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A preset as written in configuration: locators as one space-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRow {
    /// Unique id.
    pub type_id: TypeId,
    /// Human label used in notes.
    pub label: String,
    /// Space-separated locators, highest priority first.
    pub locators: String,
    /// Root namespace that selects this preset; empty for none.
    #[serde(default)]
    pub namespace: String,
}

/// A validated preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetEntry {
    /// Unique id.
    pub type_id: TypeId,
    /// Human label used in notes.
    pub label: String,
    /// Locators, highest priority first. May contain aggregate tokens.
    pub locators: Vec<String>,
    /// Root namespace that selects this preset; empty for none.
    pub namespace: String,
}

impl PresetEntry {
    /// Locators re-joined with single spaces, the form the combinator consumes.
    pub fn locator_list(&self) -> String {
        self.locators.join(" ")
    }
}

/// The immutable preset table.
#[derive(Debug, Clone)]
pub struct PresetTable {
    entries: Vec<PresetEntry>,
    by_type: HashMap<TypeId, usize>,
    by_namespace: HashMap<String, usize>,
}

const BUILTIN_ROWS: &[(u32, &str, &str, &str)] = &[
    (
        1,
        "XHTML 1.0 Transitional",
        "http://s.validator.nu/xhtml10/xhtml-transitional.rnc http://s.validator.nu/html4/assertions.sch http://c.validator.nu/all-html4/",
        "",
    ),
    (
        2,
        "XHTML 1.0 Strict",
        "http://s.validator.nu/xhtml10/xhtml-strict.rnc http://s.validator.nu/html4/assertions.sch http://c.validator.nu/all-html4/",
        "",
    ),
    (
        3,
        "HTML",
        "http://s.validator.nu/html5-all.rnc http://s.validator.nu/html5/assertions.sch http://c.validator.nu/all/",
        "",
    ),
    (
        4,
        "XHTML 1.0 Frameset",
        "http://s.validator.nu/xhtml10/xhtml-frameset.rnc http://s.validator.nu/html4/assertions.sch http://c.validator.nu/all-html4/",
        "",
    ),
    (
        6,
        "SVG 1.1 + URL + XHTML + MathML 3.0",
        "http://s.validator.nu/svg-xhtml5-rdf-mathml.rnc http://s.validator.nu/html5/assertions.sch http://c.validator.nu/all/",
        NS_SVG,
    ),
    (
        7,
        "XHTML + SVG 1.1 + MathML 3.0",
        "http://s.validator.nu/xhtml5-all.rnc http://s.validator.nu/html5/assertions.sch http://c.validator.nu/all/",
        NS_XHTML,
    ),
    (
        8,
        "Atom 1.0",
        "http://s.validator.nu/atom/atom.rnc http://c.validator.nu/nfc/",
        NS_ATOM,
    ),
];

impl PresetTable {
    /// Build a table, enforcing unique type ids and unique non-empty namespaces.
    pub fn new(rows: impl IntoIterator<Item = PresetRow>) -> Result<Self, ConfigurationFault> {
        let mut table = Self {
            entries: Vec::new(),
            by_type: HashMap::new(),
            by_namespace: HashMap::new(),
        };

        for row in rows {
            let index = table.entries.len();
            if table.by_type.insert(row.type_id, index).is_some() {
                return Err(ConfigurationFault::DuplicateTypeId(row.type_id));
            }
            if !row.namespace.is_empty() {
                if let Some(&first) = table.by_namespace.get(&row.namespace) {
                    return Err(ConfigurationFault::DuplicateNamespace {
                        namespace: row.namespace,
                        first: table.entries[first].type_id,
                        second: row.type_id,
                    });
                }
                table.by_namespace.insert(row.namespace.clone(), index);
            }
            table.entries.push(PresetEntry {
                type_id: row.type_id,
                label: row.label,
                locators: row.locators.split_whitespace().map(str::to_string).collect(),
                namespace: row.namespace,
            });
        }

        Ok(table)
    }

    /// The rows the binary ships with.
    pub fn builtin_rows() -> Vec<PresetRow> {
        BUILTIN_ROWS
            .iter()
            .map(|&(id, label, locators, namespace)| PresetRow {
                type_id: TypeId(id),
                label: label.to_string(),
                locators: locators.to_string(),
                namespace: namespace.to_string(),
            })
            .collect()
    }

    /// The built-in table.
    pub fn builtin() -> Result<Self, ConfigurationFault> {
        Self::new(Self::builtin_rows())
    }

    /// Parse tab-separated preset rows. Blank lines and `#` comments are
    /// skipped; a missing fourth column means "no namespace".
    pub fn parse_rows(text: &str) -> Result<Self, ConfigurationFault> {
        let mut rows = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let malformed = |reason: String| ConfigurationFault::MalformedPresetRow {
                line: i + 1,
                reason,
            };
            let fields: Vec<&str> = line.split('\t').collect();
            if !(3..=4).contains(&fields.len()) {
                return Err(malformed(format!(
                    "expected 3 or 4 tab-separated fields, found {}",
                    fields.len()
                )));
            }
            let type_id = fields[0]
                .trim()
                .parse::<u32>()
                .map_err(|e| malformed(format!("bad type id '{}': {e}", fields[0])))?;
            rows.push(PresetRow {
                type_id: TypeId(type_id),
                label: fields[1].trim().to_string(),
                locators: fields[2].trim().to_string(),
                namespace: fields.get(3).map(|s| s.trim().to_string()).unwrap_or_default(),
            });
        }
        Self::new(rows)
    }

    /// All presets in configuration order.
    pub fn entries(&self) -> &[PresetEntry] {
        &self.entries
    }

    /// Look up a preset by id.
    pub fn by_type_id(&self, type_id: TypeId) -> Option<&PresetEntry> {
        self.by_type.get(&type_id).map(|&i| &self.entries[i])
    }

    /// Look up a preset by id, treating absence as a deployment fault.
    pub fn require(&self, type_id: TypeId) -> Result<&PresetEntry, ConfigurationFault> {
        self.by_type_id(type_id)
            .ok_or(ConfigurationFault::MissingPreset(type_id))
    }

    /// Reverse lookup by root namespace. The empty namespace never matches.
    pub fn by_namespace(&self, namespace: &str) -> Option<&PresetEntry> {
        self.by_namespace.get(namespace).map(|&i| &self.entries[i])
    }

    /// Label of a preset.
    pub fn label(&self, type_id: TypeId) -> Option<&str> {
        self.by_type_id(type_id).map(|p| p.label.as_str())
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no presets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
