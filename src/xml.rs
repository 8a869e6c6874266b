//! XML element helpers
//!
//! Accessors that read an attribute or child element from a parsed element,
//! and builders for attributes and elements that exist only when a value is
//! present. Names use `{namespace}local` notation; a bare name matches only
//! nodes without a namespace.

use std::fmt;

use quick_xml::escape::escape;
pub use roxmltree::{Document, Node};

use crate::error::{Result, ToolkitError};
use crate::require::{self, Presence};

/// Only element nodes can carry attributes and child elements
impl Presence for Node<'_, '_> {
    fn is_absent(&self) -> bool {
        !self.is_element()
    }
}

/// Parse XML text into a read-only tree
///
/// # Errors
///
/// `InvalidArgument` for blank text, `MalformedDocument` when it does not parse.
pub fn parse(text: &str) -> Result<Document<'_>> {
    require::not_null("source", text)?;
    Document::parse(text).map_err(|e| ToolkitError::MalformedDocument {
        source_name: "<memory>".to_string(),
        details: e.to_string(),
    })
}

/// Value of the attribute `name` on `source`
///
/// A missing attribute is `XmlNodeNotFound` when `required`, else `""`.
pub fn attribute_value(source: Node<'_, '_>, name: &str, required: bool) -> Result<String> {
    require::not_null("source", &source)?;
    require::not_null("name", name)?;

    let value = match split_name(name) {
        (Some(namespace), local) => source.attribute((namespace, local)),
        (None, local) => source.attribute(local),
    };

    found_or_empty(value.map(str::to_string), "attribute", name, required)
}

/// Text of the first child element called `name`
///
/// The text is every descendant text node joined together, so markup inside
/// the element is flattened away.
pub fn element_value(source: Node<'_, '_>, name: &str, required: bool) -> Result<String> {
    require::not_null("source", &source)?;
    require::not_null("name", name)?;

    let (namespace, local) = split_name(name);
    let value = source
        .children()
        .find(|child| {
            child.is_element()
                && child.tag_name().name() == local
                && child.tag_name().namespace() == namespace
        })
        .map(|element| {
            element
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect::<String>()
        });

    found_or_empty(value, "element", name, required)
}

fn found_or_empty(
    value: Option<String>,
    kind: &'static str,
    name: &str,
    required: bool,
) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None if !required => Ok(String::new()),
        None => Err(ToolkitError::XmlNodeNotFound {
            kind,
            name: name.to_string(),
        }),
    }
}

/// `{urn:x}local` -> `(Some("urn:x"), "local")`, `local` -> `(None, "local")`
fn split_name(name: &str) -> (Option<&str>, &str) {
    let name = name.trim();
    name.strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(namespace, local)| (Some(namespace).filter(|ns| !ns.is_empty()), local))
        .unwrap_or((None, name))
}

/// An attribute ready to be written, e.g. `id="42"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for XmlAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, escape(self.value.as_str()))
    }
}

/// A text-only element ready to be written, e.g. `<note>hi</note>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{0}>{1}</{0}>", self.name, escape(self.text.as_str()))
    }
}

pub fn attribute_or_none<V: fmt::Display>(name: &str, value: Option<V>) -> Option<XmlAttribute> {
    value.map(|v| XmlAttribute::new(name, v.to_string()))
}

/// Empty text counts as no value
pub fn text_attribute_or_none(name: &str, value: Option<&str>) -> Option<XmlAttribute> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| XmlAttribute::new(name, v))
}

pub fn attribute_or_default<V: fmt::Display>(
    name: &str,
    value: Option<V>,
    default: &str,
) -> XmlAttribute {
    attribute_or_none(name, value).unwrap_or_else(|| XmlAttribute::new(name, default))
}

pub fn element_or_none<V: fmt::Display>(name: &str, value: Option<V>) -> Option<XmlElement> {
    value.map(|v| XmlElement {
        name: name.to_string(),
        text: v.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"<order id="42" xmlns:x="urn:extra" x:channel="web">
  <customer>Ada <b>Lovelace</b></customer>
  <x:note>gift</x:note>
  <empty/>
</order>"#;

    #[test]
    fn test_attribute_value() {
        let doc = parse(ORDER).unwrap();
        let order = doc.root_element();

        assert_eq!(attribute_value(order, "id", true).unwrap(), "42");
        assert_eq!(attribute_value(order, "{urn:extra}channel", true).unwrap(), "web");
        assert_eq!(attribute_value(order, "channel", false).unwrap(), "");
        assert_eq!(attribute_value(order, "status", false).unwrap(), "");
    }

    #[test]
    fn test_required_attribute_missing() {
        let doc = parse(ORDER).unwrap();

        match attribute_value(doc.root_element(), "status", true).unwrap_err() {
            ToolkitError::XmlNodeNotFound { kind, name } => {
                assert_eq!(kind, "attribute");
                assert_eq!(name, "status");
            }
            other => panic!("Expected XmlNodeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_element_value() {
        let doc = parse(ORDER).unwrap();
        let order = doc.root_element();

        assert_eq!(element_value(order, "customer", true).unwrap(), "Ada Lovelace");
        assert_eq!(element_value(order, "{urn:extra}note", true).unwrap(), "gift");
        assert_eq!(element_value(order, "empty", true).unwrap(), "");
        assert_eq!(element_value(order, "note", false).unwrap(), "");

        let err = element_value(order, "total", true).unwrap_err();
        assert_eq!(err.to_string(), "Could not find element: total");
    }

    #[test]
    fn test_blank_source_or_name_is_rejected() {
        let doc = parse(ORDER).unwrap();

        let err = attribute_value(doc.root_element(), " ", true).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "name"));

        // the document node itself is not an element
        let err = element_value(doc.root(), "order", false).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "source"));

        let err = parse("  ").unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "source"));
    }

    #[test]
    fn test_malformed_text() {
        let err = parse("<order><open></order>").unwrap_err();
        assert!(matches!(err, ToolkitError::MalformedDocument { .. }));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("{urn:x}id"), (Some("urn:x"), "id"));
        assert_eq!(split_name("{}id"), (None, "id"));
        assert_eq!(split_name("id"), (None, "id"));
    }

    #[test]
    fn test_optional_builders() {
        assert_eq!(attribute_or_none::<u32>("count", None), None);
        assert_eq!(
            attribute_or_none("count", Some(3)).unwrap().to_string(),
            r#"count="3""#
        );
        assert_eq!(text_attribute_or_none("note", Some("")), None);
        assert_eq!(
            text_attribute_or_none("note", Some("a<b")).unwrap().to_string(),
            r#"note="a&lt;b""#
        );
        assert_eq!(
            attribute_or_default::<&str>("status", None, "new"),
            XmlAttribute::new("status", "new")
        );
        assert_eq!(element_or_none::<&str>("note", None), None);
        assert_eq!(
            element_or_none("note", Some("fish & chips")).unwrap().to_string(),
            "<note>fish &amp; chips</note>"
        );
    }
}
