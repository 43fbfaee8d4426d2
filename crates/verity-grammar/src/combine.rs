//! # Validator Combination
//!
//! Turns a whitespace-separated locator list (highest priority first) into
//! one [`CombinedValidator`] that forwards every event to every constituent.
//!
//! Two aggregate tokens stand for fixed checker sets and are expanded where
//! they appear. Tokens are folded lowest priority first, each new validator
//! becoming the first child of a new pair node, so the highest-priority
//! locator ends up outermost and sees every event first.
//!
//! Delivery order is pinned: a pair delivers to its first child, then its
//! second. For `"A B http://c.validator.nu/all/"` that is `A`, `B`, then the
//! general checkers from `xml-pi` back to `table`. Some checkers summarize
//! at end of document, so reordering changes report order.
//!
//! Every concrete locator contributes one leaf, repeats included. A repeated
//! locator gets its own validator instance so no instance sees an event
//! twice.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use verity_core::Event;

use crate::traits::{EventSink, Validator};

/// General-purpose checker aggregate.
pub const AGGREGATE_ALL: &str = "http://c.validator.nu/all/";
/// Older spelling of [`AGGREGATE_ALL`].
pub const AGGREGATE_ALL_ALIAS: &str = "http://hsivonen.iki.fi/checkers/all/";
/// Legacy-markup checker aggregate.
pub const AGGREGATE_HTML4: &str = "http://c.validator.nu/all-html4/";
/// Older spelling of [`AGGREGATE_HTML4`].
pub const AGGREGATE_HTML4_ALIAS: &str = "http://hsivonen.iki.fi/checkers/all-html4/";

/// Members of the general aggregate, in fixed order.
pub const ALL_CHECKERS: [&str; 7] = [
    "http://c.validator.nu/table/",
    "http://c.validator.nu/nfc/",
    "http://c.validator.nu/text-content/",
    "http://c.validator.nu/unchecked/",
    "http://c.validator.nu/usemap/",
    "http://c.validator.nu/obsolete/",
    "http://c.validator.nu/xml-pi/",
];

/// Members of the legacy-markup aggregate, in fixed order.
pub const HTML4_CHECKERS: [&str; 4] = [
    "http://c.validator.nu/table/",
    "http://c.validator.nu/nfc/",
    "http://c.validator.nu/unchecked/",
    "http://c.validator.nu/usemap/",
];

/// A validator instance shared between a transaction's memo and the tree.
pub type SharedValidator = Arc<Mutex<Box<dyn Validator>>>;

/// Members of an aggregate token, or `None` for a concrete locator.
pub fn aggregate_members(token: &str) -> Option<&'static [&'static str]> {
    match token {
        AGGREGATE_ALL | AGGREGATE_ALL_ALIAS => Some(&ALL_CHECKERS),
        AGGREGATE_HTML4 | AGGREGATE_HTML4_ALIAS => Some(&HTML4_CHECKERS),
        _ => None,
    }
}

/// Concrete locators in declaration order, aggregates substituted in place.
pub fn expand_tokens(list: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for token in list.split_whitespace() {
        match aggregate_members(token) {
            Some(members) => out.extend_from_slice(members),
            None => out.push(token),
        }
    }
    out
}

/// Concrete locators in the order they are folded into the tree.
pub fn fold_order(list: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for token in list.split_whitespace().rev() {
        match aggregate_members(token) {
            Some(members) => out.extend_from_slice(members),
            None => out.push(token),
        }
    }
    out
}

/// Concrete locators in the order a combined validator built from `list`
/// delivers events to them, one entry per leaf.
pub fn delivery_order(list: &str) -> Vec<&str> {
    let mut folded = fold_order(list);
    folded.reverse();
    folded
}

/// Supplies validators by locator, typically memoized per document.
pub trait ValidatorSource {
    /// Failure type of the source.
    type Error;

    /// The validator for `locator`.
    fn validator_for(&mut self, locator: &str) -> Result<SharedValidator, Self::Error>;

    /// A validator for `locator` that shares no state with any other,
    /// including the one [`validator_for`](Self::validator_for) returns.
    fn fresh_validator_for(&mut self, locator: &str) -> Result<SharedValidator, Self::Error>;
}

/// Binary composition tree over per-locator validators.
pub enum CombinedValidator {
    /// One constituent.
    Leaf {
        /// Locator the validator came from.
        locator: String,
        /// The validator.
        validator: SharedValidator,
    },
    /// Forwards to `first`, then `second`.
    Pair {
        /// Higher-priority subtree.
        first: Box<CombinedValidator>,
        /// Everything folded before it.
        second: Box<CombinedValidator>,
    },
}

impl CombinedValidator {
    /// Locators of all leaves in delivery order.
    pub fn locators(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_locators(&mut out);
        out
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Pair { first, second } => first.leaf_count() + second.leaf_count(),
        }
    }

    fn collect_locators<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Leaf { locator, .. } => out.push(locator),
            Self::Pair { first, second } => {
                first.collect_locators(out);
                second.collect_locators(out);
            }
        }
    }
}

impl EventSink for CombinedValidator {
    fn event(&mut self, event: &Event) {
        match self {
            Self::Leaf { validator, .. } => validator.lock().sink().event(event),
            Self::Pair { first, second } => {
                first.event(event);
                second.event(event);
            }
        }
    }
}

impl fmt::Debug for CombinedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedValidator")
            .field("locators", &self.locators())
            .finish()
    }
}

/// Build the combined validator for `list`. Returns `Ok(None)` when the
/// list names no locators. A locator named twice contributes two leaves
/// backed by separate instances.
pub fn combine<S: ValidatorSource>(
    list: &str,
    source: &mut S,
) -> Result<Option<CombinedValidator>, S::Error> {
    let mut acc: Option<CombinedValidator> = None;
    let mut seen = HashSet::new();

    for locator in fold_order(list) {
        let validator = if seen.insert(locator) {
            source.validator_for(locator)?
        } else {
            tracing::debug!(locator, "locator repeated; using a separate instance");
            source.fresh_validator_for(locator)?
        };
        let leaf = CombinedValidator::Leaf {
            locator: locator.to_string(),
            validator,
        };
        acc = Some(match acc {
            None => leaf,
            Some(rest) => CombinedValidator::Pair {
                first: Box::new(leaf),
                second: Box::new(rest),
            },
        });
    }

    Ok(acc)
}
