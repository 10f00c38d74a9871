//! The Document Node: an ordered field map shared by standalone resources and
//! embedded sub-objects.
//!
//! A node is a *resource* when it carries a `resourceType` field; once it also
//! has an `id` it can be named by a [`Reference`]. Fields are reachable by
//! name ([`Node::get`], [`Node::insert`]), by index operator
//! (`node["name"]`), or by path ([`Node::get_by_path`],
//! [`Node::set_by_path`]), all over the same backing map.
//!
//! # Example
//!
//! ```
//! use aidbox_core::{Node, path};
//! use serde_json::json;
//!
//! let mut patient = Node::resource("Patient").unwrap();
//! patient.set_id("p1");
//! patient.insert("name", json!([{"text": "John"}]));
//! patient.set_by_path(&path!["name", 0, "text"], "Ivan").unwrap();
//!
//! assert_eq!(patient["name"][0]["text"], "Ivan");
//! assert_eq!(patient.reference().as_deref(), Some("Patient/p1"));
//! ```

use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::element::{self, Element};
use crate::error::{Error, Result};
use crate::path::{PathSegment, resolve_index};
use crate::reference::Reference;

/// Wire name of the resource type field.
pub const RESOURCE_TYPE: &str = "resourceType";
/// Wire name of the resource id field.
pub const ID: &str = "id";

/// Ordered mapping from field name to [`Element`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    fields: IndexMap<String, Element>,
}

impl Node {
    /// Creates an empty embedded node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh resource of the given type, without an id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `resource_type` is empty.
    pub fn resource(resource_type: &str) -> Result<Self> {
        if resource_type.is_empty() {
            return Err(Error::invalid_argument("resource type is required"));
        }
        let mut node = Self::new();
        node.insert(RESOURCE_TYPE, resource_type);
        Ok(node)
    }

    /// Builds a node from a JSON object, promoting reference-shaped
    /// sub-objects to [`Reference`]s.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `value` is not an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(Error::invalid_argument(format!(
                "expected a JSON object, got {}",
                Element::from(other).kind()
            ))),
        }
    }

    /// Builds a node from a JSON object map without checking whether the map
    /// itself is reference-shaped.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self::from_fields(
            map.into_iter()
                .map(|(key, value)| (key, Element::from(value)))
                .collect(),
        )
    }

    pub(crate) fn from_fields(fields: IndexMap<String, Element>) -> Self {
        Self { fields }
    }

    pub(crate) fn fields(&self) -> &IndexMap<String, Element> {
        &self.fields
    }

    /// The resource type, if this node is a resource.
    pub fn resource_type(&self) -> Option<&str> {
        self.get(RESOURCE_TYPE).and_then(Element::as_str)
    }

    /// The id, once the resource has been saved or given one.
    pub fn id(&self) -> Option<&str> {
        self.get(ID)
            .and_then(Element::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.insert(ID, id.into());
    }

    /// Returns `true` if this node carries a resource type.
    pub fn is_resource(&self) -> bool {
        self.resource_type().is_some()
    }

    /// The `Type/id` string naming this resource, once it has an id.
    pub fn reference(&self) -> Option<String> {
        Some(format!("{}/{}", self.resource_type()?, self.id()?))
    }

    /// Names this resource with a local [`Reference`].
    ///
    /// Extra fields such as `display` can be chained on the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the node has no id, and
    /// `Error::InvalidArgument` if it has no resource type.
    pub fn to_reference(&self) -> Result<Reference> {
        let resource_type = self
            .resource_type()
            .ok_or_else(|| Error::invalid_argument("only resources can be referenced"))?;
        let id = self.id().ok_or_else(|| {
            Error::not_found(format!(
                "{resource_type} has no id and cannot be referenced"
            ))
        })?;
        Ok(Reference::local(resource_type, id))
    }

    /// A resource resolves to itself: returns an owned copy with no I/O.
    #[must_use]
    pub fn to_resource(&self) -> Node {
        self.clone()
    }

    pub fn get(&self, key: &str) -> Option<&Element> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Element> {
        self.fields.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Inserts or replaces a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Element>) -> Option<Element> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Element>) -> Self {
        self.insert(key, value);
        self
    }

    /// Removes a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Element> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replaces every field with the content of `other`.
    pub(crate) fn replace_with(&mut self, other: Node) {
        self.fields = other.fields;
    }

    /// Walks `path` from this node. Returns `None` as soon as a step is
    /// missing or does not fit the value it is applied to.
    pub fn get_by_path(&self, path: &[PathSegment]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        let mut cursor = self.get(key)?;
        for segment in rest {
            cursor = step(cursor, segment)?;
        }
        Some(cursor)
    }

    /// Sets the value at `path`, creating missing intermediate nodes and
    /// lists along the way. An index equal to the list length appends; a
    /// match segment with no matching item appends a node built from the
    /// match pairs.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` for an empty path, a path that does not
    /// start with a key, a list index past the end, or a step into a scalar.
    pub fn set_by_path(&mut self, path: &[PathSegment], value: impl Into<Element>) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            return Err(Error::invalid_path("path is empty"));
        };
        let PathSegment::Key(key) = first else {
            return Err(Error::invalid_path(format!(
                "path must start with a field name, got {first}"
            )));
        };
        let Some((last, middle)) = rest.split_last() else {
            self.insert(key.clone(), value);
            return Ok(());
        };

        let mut cursor = self.fields.entry(key.clone()).or_default();
        for segment in middle {
            cursor = step_mut(cursor, segment)?;
        }
        assign(cursor, last, value.into())
    }
}

fn step<'a>(cursor: &'a Element, segment: &PathSegment) -> Option<&'a Element> {
    match (cursor, segment) {
        (Element::Node(_) | Element::Reference(_), PathSegment::Key(key)) => cursor.get(key),
        (Element::Array(items), PathSegment::Index(index)) => {
            items.get(resolve_index(*index, items.len())?)
        }
        (Element::Array(items), PathSegment::Match(pairs)) => {
            items.iter().find(|item| item.matches_all(pairs))
        }
        _ => None,
    }
}

fn empty_container(segment: &PathSegment) -> Element {
    match segment {
        PathSegment::Key(_) => Element::Node(Node::new()),
        PathSegment::Index(_) | PathSegment::Match(_) => Element::Array(Vec::new()),
    }
}

fn node_from_pairs(pairs: &[(String, Element)]) -> Element {
    Element::Node(Node::from_fields(pairs.iter().cloned().collect()))
}

fn step_mut<'a>(cursor: &'a mut Element, segment: &PathSegment) -> Result<&'a mut Element> {
    if cursor.is_null() {
        *cursor = empty_container(segment);
    }
    let kind = cursor.kind();
    match (cursor, segment) {
        (Element::Node(node), PathSegment::Key(key)) => {
            Ok(node.fields.entry(key.clone()).or_default())
        }
        (Element::Reference(reference), PathSegment::Key(key)) => {
            Ok(reference.fields_mut().entry(key.clone()).or_default())
        }
        (Element::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            match resolve_index(*index, len) {
                Some(position) if position < len => Ok(&mut items[position]),
                Some(position) if position == len => {
                    items.push(Element::Null);
                    Ok(&mut items[position])
                }
                _ => Err(Error::invalid_path(format!(
                    "index {index} is out of bounds for a list of {len}"
                ))),
            }
        }
        (Element::Array(items), PathSegment::Match(pairs)) => {
            let position = match items.iter().position(|item| item.matches_all(pairs)) {
                Some(position) => position,
                None => {
                    items.push(node_from_pairs(pairs));
                    items.len() - 1
                }
            };
            Ok(&mut items[position])
        }
        (_, segment) => Err(Error::invalid_path(format!(
            "cannot step into a {kind} with {segment}"
        ))),
    }
}

fn assign(cursor: &mut Element, segment: &PathSegment, value: Element) -> Result<()> {
    if cursor.is_null() {
        *cursor = empty_container(segment);
    }
    let kind = cursor.kind();
    match (cursor, segment) {
        (Element::Node(node), PathSegment::Key(key)) => {
            node.fields.insert(key.clone(), value);
            Ok(())
        }
        (Element::Reference(reference), PathSegment::Key(key)) => {
            reference.fields_mut().insert(key.clone(), value);
            Ok(())
        }
        (Element::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            match resolve_index(*index, len) {
                Some(position) if position < len => {
                    items[position] = value;
                    Ok(())
                }
                Some(position) if position == len => {
                    items.push(value);
                    Ok(())
                }
                _ => Err(Error::invalid_path(format!(
                    "index {index} is out of bounds for a list of {len}"
                ))),
            }
        }
        (Element::Array(items), PathSegment::Match(pairs)) => {
            match items.iter().position(|item| item.matches_all(pairs)) {
                Some(position) => items[position] = value,
                None => items.push(value),
            }
            Ok(())
        }
        (_, segment) => Err(Error::invalid_path(format!(
            "cannot assign into a {kind} with {segment}"
        ))),
    }
}

impl Index<&str> for Node {
    type Output = Element;

    fn index(&self, key: &str) -> &Element {
        self.get(key).unwrap_or_else(|| element::null())
    }
}

/// Inserts `null` for a missing key, like indexing into a JSON object.
impl IndexMut<&str> for Node {
    fn index_mut(&mut self, key: &str) -> &mut Element {
        self.fields.entry(key.to_string()).or_default()
    }
}

/// A resource equals a local reference naming the same `Type/id`.
impl PartialEq<Reference> for Node {
    fn eq(&self, other: &Reference) -> bool {
        other.is_local() && self.reference().is_some() && self.reference() == other.reference()
    }
}

impl TryFrom<Value> for Node {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(value)
    }
}
