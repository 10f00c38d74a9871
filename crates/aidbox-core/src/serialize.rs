//! Projection of a document graph to wire JSON.
//!
//! Nested nodes are expanded recursively; nested references are projected to
//! their [`ROOT_KEYS`] only and never recurse into the resource they name.
//! `null` fields are omitted.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::element::Element;
use crate::node::{ID, Node, RESOURCE_TYPE};
use crate::reference::{ROOT_KEYS, Reference, is_reference};

/// Serializes a node: `resourceType` first, then `id`, then every other
/// non-null field in insertion order.
pub fn serialize(node: &Node) -> Map<String, Value> {
    let fields = node.fields();
    let mut out = Map::new();
    for key in [RESOURCE_TYPE, ID] {
        if let Some(value) = fields.get(key).filter(|value| !value.is_null()) {
            out.insert(key.to_string(), serialize_element(value));
        }
    }
    for (key, value) in fields {
        if key == RESOURCE_TYPE || key == ID || value.is_null() {
            continue;
        }
        out.insert(key.clone(), serialize_element(value));
    }
    out
}

/// Serializes a reference, keeping only its root keys.
pub fn serialize_reference(reference: &Reference) -> Map<String, Value> {
    let fields = reference.fields();
    let mut out = Map::new();
    for key in ROOT_KEYS {
        if let Some(value) = fields.get(key).filter(|value| !value.is_null()) {
            out.insert(key.to_string(), serialize_element(value));
        }
    }
    out
}

pub(crate) fn serialize_element(element: &Element) -> Value {
    match element {
        Element::Null => Value::Null,
        Element::Bool(b) => Value::Bool(*b),
        Element::Number(n) => Value::Number(n.clone()),
        Element::String(s) => Value::String(s.clone()),
        Element::Array(items) => Value::Array(items.iter().map(serialize_element).collect()),
        Element::Node(node) => Value::Object(serialize(node)),
        Element::Reference(reference) => Value::Object(serialize_reference(reference)),
    }
}

impl Node {
    /// Wire JSON for this node.
    pub fn to_json(&self) -> Value {
        Value::Object(serialize(self))
    }
}

impl Reference {
    /// Wire JSON for this reference.
    pub fn to_json(&self) -> Value {
        Value::Object(serialize_reference(self))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(self).serialize(serializer)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_reference(self).serialize(serializer)
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_element(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Element::from)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Node::from_map(map)),
            _ => Err(de::Error::custom("expected a JSON object")),
        }
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Element::from(Value::deserialize(deserializer)?) {
            Element::Reference(reference) => Ok(reference),
            _ => Err(de::Error::custom(
                "expected an object with resourceType and id or url",
            )),
        }
    }
}

/// Returns `true` if serializing and re-normalizing `reference` yields a
/// reference again.
pub fn round_trips(reference: &Reference) -> bool {
    is_reference(&serialize_reference(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_resource_serialization() {
        let mut node = Node::resource("Patient").unwrap();
        node.set_id("p1");
        assert_json_eq!(node.to_json(), json!({"resourceType": "Patient", "id": "p1"}));
    }

    #[test]
    fn test_identity_fields_come_first() {
        let node = Node::new()
            .with("name", "x")
            .with("id", "p1")
            .with("resourceType", "Patient");
        let keys: Vec<String> = serialize(&node).keys().cloned().collect();
        assert_eq!(keys, vec!["resourceType", "id", "name"]);
    }

    #[test]
    fn test_nulls_are_omitted() {
        let node = Node::resource("Patient")
            .unwrap()
            .with("id", Element::Null)
            .with("contact", Node::new().with("name", Element::Null).with("gender", "male"));
        assert_json_eq!(
            node.to_json(),
            json!({"resourceType": "Patient", "contact": {"gender": "male"}})
        );
    }

    #[test]
    fn test_nested_references_and_nodes() {
        let practitioner1 = Node::resource("Practitioner").unwrap().with("id", "pr1");
        let practitioner2 = Node::resource("Practitioner").unwrap().with("id", "pr2");
        let patient = Node::resource("Patient")
            .unwrap()
            .with("id", "patient")
            .with(
                "generalPractitioner",
                vec![
                    practitioner1.to_reference().unwrap().with_display("practitioner"),
                    practitioner2.to_reference().unwrap(),
                ],
            )
            .with("contact", vec![Node::new().with("name", Node::new().with("text", "Mom"))]);

        assert_json_eq!(
            patient.to_json(),
            json!({
                "resourceType": "Patient",
                "id": "patient",
                "generalPractitioner": [
                    {"resourceType": "Practitioner", "id": "pr1", "display": "practitioner"},
                    {"resourceType": "Practitioner", "id": "pr2"}
                ],
                "contact": [{"name": {"text": "Mom"}}]
            })
        );
    }

    #[test]
    fn test_reference_projection_drops_unknown_fields() {
        let reference = Reference::local("Organization", "o1")
            .with_display("Acme")
            .with_field("_id", "internal")
            .with_field("extension", json!([{"url": "x"}]));
        let node = Node::resource("Patient")
            .unwrap()
            .with("managingOrganization", reference);

        assert_json_eq!(
            node.to_json(),
            json!({
                "resourceType": "Patient",
                "managingOrganization": {
                    "resourceType": "Organization",
                    "id": "o1",
                    "display": "Acme"
                }
            })
        );
    }

    #[test]
    fn test_embedded_resource_is_kept() {
        let embedded = Node::new().with("name", json!([{"text": "John"}]));
        let reference = Reference::local("Patient", "p1").with_resource(embedded);
        assert_json_eq!(
            reference.to_json(),
            json!({
                "resourceType": "Patient",
                "id": "p1",
                "resource": {"name": [{"text": "John"}]}
            })
        );
    }

    #[test]
    fn test_reference_round_trip() {
        let reference = Reference::local("Patient", "p1").with_display("John");
        assert!(round_trips(&reference));

        let restored = Element::from(reference.to_json());
        let restored = restored.as_reference().unwrap();
        assert_eq!(restored.resource_type(), Some("Patient"));
        assert_eq!(restored.id(), Some("p1"));
        assert_eq!(restored.display(), Some("John"));
    }

    #[test]
    fn test_serde_impls() {
        let node: Node = serde_json::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "link": [{"other": {"resourceType": "Patient", "id": "p2"}}]
        }))
        .unwrap();
        assert!(node["link"][0]["other"].as_reference().is_some());
        assert_json_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "resourceType": "Patient",
                "id": "p1",
                "link": [{"other": {"resourceType": "Patient", "id": "p2"}}]
            })
        );

        let reference: Reference =
            serde_json::from_value(json!({"resourceType": "Patient", "id": "p1"})).unwrap();
        assert_eq!(reference.to_string(), "Patient/p1");
        assert!(serde_json::from_value::<Reference>(json!({"id": "p1"})).is_err());
        assert!(serde_json::from_value::<Node>(json!("text")).is_err());
    }
}
