//! # DOCTYPE Table
//!
//! Exact-match rules from legacy DOCTYPE public identifiers to presets, and
//! the informational note each emits. Anything unmatched, including a
//! missing DOCTYPE, selects the modern HTML preset.

use verity_core::TypeId;

const APPENDIX_C: &str = "Appendix C is not supported. Proceeding anyway for your convenience. \
The parser is still an HTML parser, so namespace processing is not performed and \
\u{201C}xml:*\u{201D} attributes are not supported.";

const QUIRKS_ENABLED: &str = " HTML4-specific tokenization errors are enabled.";
const QUIRKS_NOT_ENABLED: &str = " HTML4-specific tokenization errors are not enabled.";

/// Note emitted for repeat document-mode signals with quirks on.
pub const QUIRKS_NOTE: &str = "HTML4-specific tokenization errors are enabled.";

/// How the note reacts to the HTML4 quirks flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuirksNote {
    /// Mention quirks only when they are on.
    WhenEnabled,
    /// Mention quirks only when they are off.
    WhenDisabled,
}

/// One recognized public identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctypeRule {
    /// Exact public identifier.
    pub public_id: &'static str,
    /// Preset it selects.
    pub type_id: TypeId,
    lead: &'static str,
    quirks: QuirksNote,
}

/// The recognized legacy DOCTYPEs.
pub const DOCTYPE_RULES: [DoctypeRule; 7] = [
    DoctypeRule {
        public_id: "-//W3C//DTD XHTML 1.0 Transitional//EN",
        type_id: TypeId::XHTML1_TRANSITIONAL,
        lead: "XHTML 1.0 Transitional doctype seen.",
        quirks: QuirksNote::WhenEnabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD XHTML 1.0 Strict//EN",
        type_id: TypeId::XHTML1_STRICT,
        lead: "XHTML 1.0 Strict doctype seen.",
        quirks: QuirksNote::WhenEnabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD XHTML 1.0 Frameset//EN",
        type_id: TypeId::XHTML1_FRAMESET,
        lead: "XHTML 1.0 Frameset doctype seen.",
        quirks: QuirksNote::WhenEnabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD HTML 4.01 Transitional//EN",
        type_id: TypeId::XHTML1_TRANSITIONAL,
        lead: "HTML 4.01 Transitional doctype seen.",
        quirks: QuirksNote::WhenDisabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD HTML 4.01//EN",
        type_id: TypeId::XHTML1_STRICT,
        lead: "HTML 4.01 Strict doctype seen.",
        quirks: QuirksNote::WhenDisabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD HTML 4.0 Transitional//EN",
        type_id: TypeId::XHTML1_TRANSITIONAL,
        lead: "Legacy HTML 4.0 Transitional doctype seen. Please consider using HTML 4.01 Transitional instead.",
        quirks: QuirksNote::WhenDisabled,
    },
    DoctypeRule {
        public_id: "-//W3C//DTD HTML 4.0//EN",
        type_id: TypeId::XHTML1_STRICT,
        lead: "Legacy HTML 4.0 Strict doctype seen. Please consider using HTML 4.01 instead.",
        quirks: QuirksNote::WhenDisabled,
    },
];

/// Outcome of looking up a public identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctypeMatch {
    /// Preset to use.
    pub type_id: TypeId,
    /// The matching rule; `None` for the default.
    pub rule: Option<&'static DoctypeRule>,
}

impl DoctypeMatch {
    /// Informational note naming the preset `label`.
    pub fn note(&self, label: &str, html4_quirks: bool) -> String {
        let Some(rule) = self.rule else {
            let suffix = if html4_quirks { QUIRKS_ENABLED } else { "" };
            return format!("Using the schema for {label}.{suffix}");
        };

        let body = if rule.public_id.contains("XHTML") {
            format!("{} {APPENDIX_C} Using the schema for {label}.", rule.lead)
        } else if rule.lead.starts_with("Legacy") {
            format!(
                "{} Proceeding anyway for your convenience with the schema for {label}.",
                rule.lead
            )
        } else {
            format!("{} Using the schema for {label}.", rule.lead)
        };
        let suffix = match (rule.quirks, html4_quirks) {
            (QuirksNote::WhenEnabled, true) => QUIRKS_ENABLED,
            (QuirksNote::WhenDisabled, false) => QUIRKS_NOT_ENABLED,
            _ => "",
        };
        format!("{body}{suffix}")
    }
}

/// Map a DOCTYPE public identifier to a preset.
pub fn classify(public_id: Option<&str>) -> DoctypeMatch {
    let rule = public_id.and_then(|id| DOCTYPE_RULES.iter().find(|r| r.public_id == id));
    DoctypeMatch {
        type_id: rule.map_or(TypeId::HTML, |r| r.type_id),
        rule,
    }
}

/// Every preset the table can select, default included.
pub fn referenced_type_ids() -> Vec<TypeId> {
    let mut ids: Vec<TypeId> = DOCTYPE_RULES.iter().map(|r| r.type_id).collect();
    ids.push(TypeId::HTML);
    ids.sort_unstable();
    ids.dedup();
    ids
}
