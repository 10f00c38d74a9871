//! Reading search result bundles.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::node::Node;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// The matching resources on this page, in bundle order.
    pub resources: Vec<Node>,
    /// Total count of matches, when the backend reported one.
    pub total: Option<u64>,
    /// Whether the bundle links to a following page.
    pub has_next: bool,
}

impl Page {
    /// Parses a searchset bundle.
    ///
    /// Entries without a `resource` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if `bundle` is not a JSON object.
    pub fn from_bundle(bundle: Value) -> Result<Self> {
        let Value::Object(mut bundle) = bundle else {
            return Err(Error::transport(None, "search response is not a bundle"));
        };

        let total = bundle.get("total").and_then(Value::as_u64);
        let has_next = bundle
            .get("link")
            .and_then(Value::as_array)
            .is_some_and(|links| {
                links
                    .iter()
                    .any(|link| link.get("relation").and_then(Value::as_str) == Some("next"))
            });

        let resources = match bundle.remove("entry") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|mut entry| entry.get_mut("resource").map(Value::take))
                .filter_map(|resource| Node::from_json(resource).ok())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            resources,
            total,
            has_next,
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
