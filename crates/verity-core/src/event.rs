//! # Structural Events
//!
//! The ordered stream a tokenizer produces for one document. Events are
//! owned values so they can be buffered verbatim before the document type is
//! known and replayed later into whichever validator is chosen.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source document. Every part is optional because not all
/// producers track all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// System identifier (usually the document URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    /// 1-based line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-based column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Location {
    /// A location with line and column only.
    pub fn at(line: u32, column: u32) -> Self {
        Self {
            system_id: None,
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(system_id) = &self.system_id {
            write!(f, "{system_id}")?;
        }
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, ":{line}:{column}"),
            (Some(line), None) => write!(f, ":{line}"),
            _ => Ok(()),
        }
    }
}

/// One attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Namespace URI, empty when the attribute is in no namespace.
    #[serde(default)]
    pub namespace: String,
    /// Local name.
    pub local_name: String,
    /// Qualified name as written.
    #[serde(default)]
    pub qualified_name: String,
    /// Attribute value.
    pub value: String,
}

/// A structural event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Start of the document.
    StartDocument,
    /// End of the document.
    EndDocument,
    /// A namespace prefix comes into scope.
    StartPrefixMapping {
        /// The prefix, empty for the default namespace.
        prefix: String,
        /// The namespace URI bound to it.
        uri: String,
    },
    /// A namespace prefix goes out of scope.
    EndPrefixMapping {
        /// The prefix.
        prefix: String,
    },
    /// Start tag.
    StartElement {
        /// Namespace URI, empty when the element is in no namespace.
        #[serde(default)]
        namespace: String,
        /// Local name.
        local_name: String,
        /// Qualified name as written.
        #[serde(default)]
        qualified_name: String,
        /// Attributes in source order.
        #[serde(default)]
        attributes: Vec<Attribute>,
        /// Where the tag starts.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
    },
    /// End tag.
    EndElement {
        /// Namespace URI.
        #[serde(default)]
        namespace: String,
        /// Local name.
        local_name: String,
        /// Qualified name as written.
        #[serde(default)]
        qualified_name: String,
    },
    /// Character data.
    Characters {
        /// The text.
        text: String,
    },
    /// Whitespace the producer knows to be insignificant.
    IgnorableWhitespace {
        /// The whitespace.
        text: String,
    },
    /// Processing instruction.
    ProcessingInstruction {
        /// PI target.
        target: String,
        /// PI data.
        #[serde(default)]
        data: String,
    },
    /// Comment.
    Comment {
        /// Comment text.
        text: String,
    },
}

impl Event {
    /// Convenience constructor for a start tag without attributes.
    pub fn start_element(namespace: &str, local_name: &str) -> Self {
        Self::StartElement {
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
            qualified_name: local_name.to_string(),
            attributes: Vec::new(),
            location: None,
        }
    }

    /// Convenience constructor for an end tag.
    pub fn end_element(namespace: &str, local_name: &str) -> Self {
        Self::EndElement {
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
            qualified_name: local_name.to_string(),
        }
    }

    /// Convenience constructor for character data.
    pub fn characters(text: &str) -> Self {
        Self::Characters {
            text: text.to_string(),
        }
    }

    /// Namespace and location of a start tag; `None` for every other event.
    pub fn as_start_element(&self) -> Option<(&str, Option<&Location>)> {
        match self {
            Self::StartElement {
                namespace, location, ..
            } => Some((namespace.as_str(), location.as_ref())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display() {
        let mut loc = Location::at(3, 14);
        assert_eq!(loc.to_string(), ":3:14");
        loc.system_id = Some("doc.xhtml".to_string());
        assert_eq!(loc.to_string(), "doc.xhtml:3:14");
        assert_eq!(Location::default().to_string(), "");
    }

    #[test]
    fn start_element_accessor() {
        let ev = Event::start_element("http://www.w3.org/2000/svg", "svg");
        assert_eq!(ev.as_start_element(), Some(("http://www.w3.org/2000/svg", None)));
        assert_eq!(Event::characters("x").as_start_element(), None);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let json = r#"{"kind":"start_element","local_name":"html","namespace":"http://www.w3.org/1999/xhtml"}"#;
        let ev: Event = serde_json::from_str(json).unwrap();
        match ev {
            Event::StartElement {
                namespace,
                local_name,
                attributes,
                location,
                ..
            } => {
                assert_eq!(namespace, "http://www.w3.org/1999/xhtml");
                assert_eq!(local_name, "html");
                assert!(attributes.is_empty());
                assert!(location.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn missing_namespace_defaults_to_empty() {
        let ev: Event = serde_json::from_str(r#"{"kind":"start_element","local_name":"p"}"#).unwrap();
        assert_eq!(ev.as_start_element().map(|(ns, _)| ns), Some(""));
    }
}
