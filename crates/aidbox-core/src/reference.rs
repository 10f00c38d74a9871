//! References between resources.
//!
//! A [`Reference`] names a resource without owning it. It is either *local*
//! (`resourceType` + `id`, rendered as `Type/id`) or *external* (an opaque
//! `url` that only a network fetch could resolve). A reference is local
//! exactly when it carries no `url`.
//!
//! References appear in two ways: built explicitly (from a `(type, id)` pair,
//! a reference string or [`Node::to_reference`]), or promoted implicitly when
//! a raw JSON object passes [`is_reference`] during normalization.
//!
//! # Reference strings
//!
//! [`Reference::parse`] classifies a string syntactically:
//! - `Type/id` (exactly one slash) is local
//! - anything with more than one slash, or a `urn:` string, is external and
//!   kept verbatim as the `url`
//! - everything else is rejected with `Error::InvalidArgument`

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::element::{self, Element};
use crate::error::{Error, Result};
use crate::node::{ID, Node, RESOURCE_TYPE};

/// Wire name of the human-readable label of a reference.
pub const DISPLAY: &str = "display";
/// Wire name of the absolute target of an external reference.
pub const URL: &str = "url";
/// Wire name of the backend's internal id.
pub const INTERNAL_ID: &str = "_id";
/// Wire name of a resource embedded in its reference.
pub const EMBEDDED_RESOURCE: &str = "resource";

/// Keys a JSON object may carry and still be treated as a reference.
pub const REFERENCE_KEYS: [&str; 6] = [RESOURCE_TYPE, ID, INTERNAL_ID, EMBEDDED_RESOURCE, DISPLAY, URL];

/// Keys kept when a reference nested in a document is serialized.
pub const ROOT_KEYS: [&str; 5] = [RESOURCE_TYPE, ID, DISPLAY, URL, EMBEDDED_RESOURCE];

/// Returns `true` if `map` is shaped like a reference: it has a
/// `resourceType`, at least one of `id` / `url`, and no key outside
/// [`REFERENCE_KEYS`].
pub fn is_reference(map: &Map<String, Value>) -> bool {
    map.contains_key(RESOURCE_TYPE)
        && (map.contains_key(ID) || map.contains_key(URL))
        && map.keys().all(|key| REFERENCE_KEYS.contains(&key.as_str()))
}

/// [`is_reference`] over an arbitrary JSON value; non-objects are never
/// references.
pub fn is_reference_value(value: &Value) -> bool {
    value.as_object().is_some_and(is_reference)
}

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget<'a> {
    Local { resource_type: &'a str, id: &'a str },
    External { url: &'a str },
}

/// A pointer to a resource, local or external.
#[derive(Debug, Clone, Default)]
pub struct Reference {
    fields: IndexMap<String, Element>,
}

impl Reference {
    /// Creates a local reference to `resource_type/id`.
    #[must_use]
    pub fn local(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(RESOURCE_TYPE.to_string(), Element::String(resource_type.into()));
        fields.insert(ID.to_string(), Element::String(id.into()));
        Self { fields }
    }

    /// Creates an external reference to an absolute `url`.
    #[must_use]
    pub fn external(url: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(URL.to_string(), Element::String(url.into()));
        Self { fields }
    }

    /// Parses a reference string; see the module docs for the rules.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for strings that are neither
    /// `Type/id` nor external.
    pub fn parse(reference: &str) -> Result<Self> {
        Self::builder().reference(reference).build()
    }

    /// Starts building a reference from optional parts.
    #[must_use]
    pub fn builder() -> ReferenceBuilder {
        ReferenceBuilder::default()
    }

    pub(crate) fn from_fields(fields: IndexMap<String, Element>) -> Self {
        Self { fields }
    }

    pub(crate) fn fields(&self) -> &IndexMap<String, Element> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut IndexMap<String, Element> {
        &mut self.fields
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn with_display(self, display: impl Into<String>) -> Self {
        self.with_field(DISPLAY, display.into())
    }

    /// Sets an arbitrary field. Fields outside [`ROOT_KEYS`] are kept in
    /// memory but dropped when the reference is serialized.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Element>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Embeds the target resource in the reference.
    #[must_use]
    pub fn with_resource(self, resource: Node) -> Self {
        self.with_field(EMBEDDED_RESOURCE, resource)
    }

    pub fn get(&self, key: &str) -> Option<&Element> {
        self.fields.get(key)
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Element::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns `true` if the reference carries no `url`.
    pub fn is_local(&self) -> bool {
        self.string_field(URL).is_none()
    }

    /// The resource type, for local references only.
    pub fn resource_type(&self) -> Option<&str> {
        if self.is_local() {
            self.string_field(RESOURCE_TYPE)
        } else {
            None
        }
    }

    /// The id, for local references only.
    pub fn id(&self) -> Option<&str> {
        if self.is_local() {
            self.string_field(ID)
        } else {
            None
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.string_field(URL)
    }

    pub fn display(&self) -> Option<&str> {
        self.string_field(DISPLAY)
    }

    /// The resource embedded in the reference, if the backend sent one.
    pub fn embedded_resource(&self) -> Option<&Node> {
        self.get(EMBEDDED_RESOURCE).and_then(Element::as_node)
    }

    /// `Type/id` for local references, the `url` for external ones.
    pub fn reference(&self) -> Option<String> {
        match self.target()? {
            ReferenceTarget::Local { resource_type, id } => Some(format!("{resource_type}/{id}")),
            ReferenceTarget::External { url } => Some(url.to_string()),
        }
    }

    /// Typed view of what this reference points at. `None` for a local
    /// reference missing its type or id.
    pub fn target(&self) -> Option<ReferenceTarget<'_>> {
        if let Some(url) = self.url() {
            return Some(ReferenceTarget::External { url });
        }
        Some(ReferenceTarget::Local {
            resource_type: self.string_field(RESOURCE_TYPE)?,
            id: self.string_field(ID)?,
        })
    }

    /// Copies this reference; extra fields can be chained on the result.
    #[must_use]
    pub fn to_reference(&self) -> Self {
        self.clone()
    }
}

/// References compare by target, ignoring `display` and extra fields.
impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        match (self.target(), other.target()) {
            (Some(left), Some(right)) => left == right,
            _ => self.fields == other.fields,
        }
    }
}

impl PartialEq<Node> for Reference {
    fn eq(&self, other: &Node) -> bool {
        other == self
    }
}

impl std::ops::Index<&str> for Reference {
    type Output = Element;

    fn index(&self, key: &str) -> &Element {
        self.get(key).unwrap_or_else(|| element::null())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference().as_deref().unwrap_or_default())
    }
}

/// Builds a [`Reference`] from optional parts: either `(resource_type, id)`
/// or a `reference` string.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    resource_type: Option<String>,
    id: Option<String>,
    reference: Option<String>,
    extra: IndexMap<String, Element>,
}

impl ReferenceBuilder {
    #[must_use]
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// A `Type/id` string or an absolute URL. Takes precedence over
    /// `resource_type` / `id`.
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn display(self, display: impl Into<String>) -> Self {
        self.field(DISPLAY, display.into())
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Element>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when neither a reference string nor
    /// both `resource_type` and `id` were supplied, or when the reference
    /// string is malformed.
    pub fn build(self) -> Result<Reference> {
        let reference = match self.reference.as_deref().filter(|r| !r.is_empty()) {
            Some(reference) => classify(reference)?,
            None => match (
                self.resource_type.as_deref().filter(|t| !t.is_empty()),
                self.id.as_deref().filter(|i| !i.is_empty()),
            ) {
                (Some(resource_type), Some(id)) => Reference::local(resource_type, id),
                _ => {
                    return Err(Error::invalid_argument(
                        "type and id, or reference, are required",
                    ));
                }
            },
        };
        Ok(self
            .extra
            .into_iter()
            .fold(reference, |reference, (key, value)| reference.with_field(key, value)))
    }
}

fn classify(reference: &str) -> Result<Reference> {
    if reference.matches('/').count() > 1 || reference.starts_with("urn:") {
        return Ok(Reference::external(reference));
    }
    match reference.split_once('/') {
        Some((resource_type, id)) if !resource_type.is_empty() && !id.is_empty() => {
            Ok(Reference::local(resource_type, id))
        }
        _ => Err(Error::invalid_argument(format!(
            "reference \"{reference}\" must be Type/id or an absolute URL"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_is_reference() {
        assert!(is_reference(&object(json!({"resourceType": "Patient", "id": "p1"}))));
        assert!(is_reference(&object(json!({
            "resourceType": "Patient",
            "id": "p1",
            "_id": "internal",
            "display": "John",
            "resource": {"name": []}
        }))));
        assert!(is_reference(&object(json!({
            "resourceType": "Patient",
            "url": "http://other/Patient/p1"
        }))));
    }

    #[test]
    fn test_is_not_reference() {
        // no type
        assert!(!is_reference(&object(json!({"id": "p1"}))));
        // neither id nor url
        assert!(!is_reference(&object(json!({"resourceType": "Patient", "display": "x"}))));
        // extra key
        assert!(!is_reference(&object(json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": []
        }))));
        assert!(!is_reference_value(&json!("Patient/p1")));
        assert!(!is_reference_value(&json!([{"resourceType": "Patient", "id": "p1"}])));
    }

    #[test]
    fn test_local_reference() {
        let reference = Reference::local("Patient", "p1");
        assert!(reference.is_local());
        assert_eq!(reference.resource_type(), Some("Patient"));
        assert_eq!(reference.id(), Some("p1"));
        assert_eq!(reference.url(), None);
        assert_eq!(reference.to_string(), "Patient/p1");
        assert_eq!(
            reference.target(),
            Some(ReferenceTarget::Local {
                resource_type: "Patient",
                id: "p1"
            })
        );
    }

    #[test]
    fn test_external_reference() {
        let reference = Reference::parse("http://external.com/Patient/p1").unwrap();
        assert!(!reference.is_local());
        assert_eq!(reference.resource_type(), None);
        assert_eq!(reference.id(), None);
        assert_eq!(reference.url(), Some("http://external.com/Patient/p1"));
        assert_eq!(
            reference.reference().as_deref(),
            Some("http://external.com/Patient/p1")
        );
        assert_eq!(reference.to_json(), json!({"url": "http://external.com/Patient/p1"}));
    }

    #[test]
    fn test_parse_local_string() {
        let reference = Reference::parse("Patient/p1").unwrap();
        assert!(reference.is_local());
        assert_eq!(reference.resource_type(), Some("Patient"));
        assert_eq!(reference.id(), Some("p1"));
        assert_eq!(reference.to_json(), json!({"resourceType": "Patient", "id": "p1"}));
    }

    #[test]
    fn test_parse_urn_is_external() {
        let reference = Reference::parse("urn:uuid:550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(!reference.is_local());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["Patient", "Patient/", "/p1", "#contained"] {
            let err = Reference::parse(input).unwrap_err();
            assert!(err.is_invalid_argument(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_builder_requires_arguments() {
        let err = Reference::builder().build().unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Invalid argument: type and id, or reference, are required"
        );

        assert!(Reference::builder().resource_type("Patient").build().is_err());
        assert!(Reference::builder().id("p1").build().is_err());
    }

    #[test]
    fn test_builder_with_display() {
        let reference = Reference::builder()
            .resource_type("Patient")
            .id("p1")
            .display("John")
            .build()
            .unwrap();
        assert_eq!(reference.display(), Some("John"));
        assert_eq!(
            reference.to_json(),
            json!({"resourceType": "Patient", "id": "p1", "display": "John"})
        );
    }

    #[test]
    fn test_to_reference_copies_and_extends() {
        let reference = Reference::local("Patient", "p1");
        let copy = reference.to_reference().with_display("patient");
        assert_eq!(
            copy.to_json(),
            json!({"resourceType": "Patient", "id": "p1", "display": "patient"})
        );
        assert_eq!(reference.display(), None);
    }

    #[test]
    fn test_equality_ignores_display() {
        assert_eq!(
            Reference::local("Patient", "p1").with_display("a"),
            Reference::local("Patient", "p1")
        );
        assert_ne!(Reference::local("Patient", "p1"), Reference::external("Patient/p1"));
    }

    #[test]
    fn test_url_wins_over_type_and_id() {
        let element = Element::from(json!({
            "resourceType": "Patient",
            "id": "p1",
            "url": "http://other/Patient/p1"
        }));
        let reference = element.as_reference().unwrap();
        assert!(!reference.is_local());
        assert_eq!(reference.id(), None);
    }
}
