//! Values stored in a document body.
//!
//! An [`Element`] is what a [`Node`] field holds: a JSON scalar, a list, a
//! nested sub-object or a [`Reference`]. Converting raw JSON into an element
//! normalizes it: every object that is reference-shaped (see
//! [`is_reference`](crate::reference::is_reference)) becomes a `Reference`,
//! every other object becomes a `Node`, depth-first in a single pass.

use std::fmt;
use std::ops::Index;

use serde_json::{Number, Value};

use crate::node::Node;
use crate::reference::{EMBEDDED_RESOURCE, Reference, is_reference};

static NULL: Element = Element::Null;

/// A single value inside a document body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Element {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Element>),
    Node(Node),
    Reference(Reference),
}

impl Element {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Node(_) => "node",
            Self::Reference(_) => "reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Element>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Element>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Looks up a field when this element is a node or a reference.
    pub fn get(&self, key: &str) -> Option<&Element> {
        match self {
            Self::Node(node) => node.get(key),
            Self::Reference(reference) => reference.get(key),
            _ => None,
        }
    }

    /// Projects this element to wire JSON.
    pub fn to_json(&self) -> Value {
        crate::serialize::serialize_element(self)
    }

    /// Returns `true` when every `(key, value)` pair is present on this
    /// node or reference with an equal value.
    pub(crate) fn matches_all(&self, pairs: &[(String, Element)]) -> bool {
        pairs
            .iter()
            .all(|(key, expected)| self.get(key) == Some(expected))
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Element::from).collect()),
            Value::Object(map) => {
                let reference_shaped = is_reference(&map);
                let fields = map
                    .into_iter()
                    .map(|(key, value)| {
                        let element = match value {
                            // An embedded resource stays a node even when it looks like a reference.
                            Value::Object(resource) if reference_shaped && key == EMBEDDED_RESOURCE => {
                                Self::Node(Node::from_map(resource))
                            }
                            other => Element::from(other),
                        };
                        (key, element)
                    })
                    .collect();
                if reference_shaped {
                    Self::Reference(Reference::from_fields(fields))
                } else {
                    Self::Node(Node::from_fields(fields))
                }
            }
        }
    }
}

impl From<&Value> for Element {
    fn from(value: &Value) -> Self {
        Element::from(value.clone())
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Element {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<Node> for Element {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<Reference> for Element {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

impl<T: Into<Element>> From<Vec<T>> for Element {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl PartialEq<str> for Element {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Element {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<bool> for Element {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl Index<&str> for Element {
    type Output = Element;

    fn index(&self, key: &str) -> &Element {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Element {
    type Output = Element;

    fn index(&self, index: usize) -> &Element {
        self.as_array()
            .and_then(|items| items.get(index))
            .unwrap_or(&NULL)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

pub(crate) fn null() -> &'static Element {
    &NULL
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_resource_stays_node() {
        let element = Element::from(json!({
            "resourceType": "Patient",
            "id": "p1",
            "resource": {"resourceType": "Patient", "id": "p1"}
        }));
        let reference = element.as_reference().unwrap();
        let embedded = reference.embedded_resource().unwrap();
        assert_eq!(embedded.resource_type(), Some("Patient"));
        assert_eq!(embedded.id(), Some("p1"));
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(Element::from(json!(true)), Element::Bool(true));
        assert_eq!(Element::from(json!("x")), "x");
        assert_eq!(Element::from(json!(3)).as_i64(), Some(3));
        assert!(Element::from(json!(null)).is_null());
        assert!(Element::from(f64::NAN).is_null());
    }

    #[test]
    fn test_reference_shaped_object_is_promoted() {
        let element = Element::from(json!({"resourceType": "Patient", "id": "p1"}));
        let reference = element.as_reference().expect("promoted to reference");
        assert_eq!(reference.resource_type(), Some("Patient"));
        assert_eq!(reference.id(), Some("p1"));
    }

    #[test]
    fn test_object_with_extra_key_stays_node() {
        let element = Element::from(json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [{"text": "John"}]
        }));
        assert!(element.as_node().is_some());
    }

    #[test]
    fn test_normalization_is_recursive() {
        let element = Element::from(json!({
            "entry": [
                {"resource": {"resourceType": "Practitioner", "id": "pr1"}},
                {"link": {"url": "http://other/Practitioner/pr2", "resourceType": "Practitioner"}}
            ]
        }));
        assert!(element["entry"][0]["resource"].as_reference().is_some());
        let external = element["entry"][1]["link"].as_reference().unwrap();
        assert!(!external.is_local());
        assert!(element["entry"][0].as_node().is_some());
    }

    #[test]
    fn test_index_misses_are_null() {
        let element = Element::from(json!({"name": [{"text": "John"}]}));
        assert_eq!(element["name"][0]["text"], "John");
        assert!(element["name"][5]["text"].is_null());
        assert!(element["missing"].is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Element::from("plain").to_string(), "plain");
        assert_eq!(Element::from(json!([1, 2])).to_string(), "[1,2]");
    }
}
