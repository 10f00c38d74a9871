//! The SearchSet: an immutable accumulator of query parameters for one
//! resource type.
//!
//! Every builder method returns a new `SearchSet`; the receiver is never
//! changed, so several chains can branch from the same base. Merge policy per
//! directive:
//!
//! | Method | Key | Policy |
//! |---|---|---|
//! | [`search`](SearchSet::search) | aliased field | append |
//! | [`sort`](SearchSet::sort) | `_sort` | replace |
//! | [`page`](SearchSet::page) | `page` | replace |
//! | [`limit`](SearchSet::limit) | `_count` | replace |
//! | [`elements`](SearchSet::elements) | `_elements` | one comma-joined entry, accumulated |
//! | [`include`](SearchSet::include) | `_include[:recursive\|:iterate]` | append |
//! | [`revinclude`](SearchSet::revinclude) | `_revinclude[:iterate]` | append |
//! | [`has`](SearchSet::has) | `_has:A:a:...:filter` | append |
//! | [`assoc`](SearchSet::assoc) | `_assoc` | append |
//!
//! # Example
//!
//! ```
//! use aidbox_core::{Include, SearchSet};
//!
//! let search = SearchSet::new("Patient")
//!     .search("name", "John")
//!     .search("birth_date__ge", "1990")
//!     .include(Include::new("Patient", "organization"))
//!     .sort("-_lastUpdated")
//!     .limit(20);
//!
//! assert_eq!(
//!     search.to_query_string(),
//!     "name=John&birth-date=ge1990&_include=Patient%3Aorganization&_sort=-_lastUpdated&_count=20"
//! );
//! ```

pub mod alias;
mod include;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use url::form_urlencoded;

use crate::error::{Error, Result};

pub use include::{Include, IncludeModifier};

pub const SORT: &str = "_sort";
pub const PAGE: &str = "page";
pub const COUNT: &str = "_count";
pub const ELEMENTS: &str = "_elements";
pub const INCLUDE: &str = "_include";
pub const REVINCLUDE: &str = "_revinclude";
pub const ASSOC: &str = "_assoc";
pub const HAS: &str = "_has";

/// Fields every positive `_elements` request keeps.
const IDENTITY_ELEMENTS: [&str; 2] = ["id", "resourceType"];

/// Query parameters for listing resources of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSet {
    resource_type: String,
    params: IndexMap<String, Vec<String>>,
}

impl SearchSet {
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            params: IndexMap::new(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Parameter key → values, in first-use order.
    pub fn params(&self) -> &IndexMap<String, Vec<String>> {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn appended(&self, key: String, values: impl IntoIterator<Item = String>) -> Self {
        let mut next = self.clone();
        next.params.entry(key).or_default().extend(values);
        next
    }

    fn replaced(&self, key: &str, value: String) -> Self {
        let mut next = self.clone();
        next.params.insert(key.to_string(), vec![value]);
        next
    }

    /// Appends a filter, mapping the key through [`alias::resolve`].
    #[must_use]
    pub fn search(&self, key: &str, value: impl ToString) -> Self {
        let (key, value) = alias::resolve(key, value.to_string());
        self.appended(key, [value])
    }

    /// Appends several values for one aliased key.
    #[must_use]
    pub fn search_all<I, V>(&self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let mut next = self.clone();
        for value in values {
            let (key, value) = alias::resolve(key, value.to_string());
            next.params.entry(key).or_default().push(value);
        }
        next
    }

    /// Appends a parameter verbatim, without aliasing.
    #[must_use]
    pub fn param(&self, key: &str, value: impl ToString) -> Self {
        self.appended(key.to_string(), [value.to_string()])
    }

    /// Sorts by `field` (comma-separate several, prefix `-` for descending).
    /// Replaces any earlier sort.
    #[must_use]
    pub fn sort(&self, field: &str) -> Self {
        self.replaced(SORT, field.to_string())
    }

    #[must_use]
    pub fn page(&self, page: u32) -> Self {
        self.replaced(PAGE, page.to_string())
    }

    #[must_use]
    pub fn limit(&self, count: u32) -> Self {
        self.replaced(COUNT, count.to_string())
    }

    /// The requested page, if one was set.
    pub fn page_number(&self) -> Option<u32> {
        self.get(PAGE)?.last()?.parse().ok()
    }

    /// Restricts (or with `exclude`, trims) the returned fields.
    ///
    /// All calls accumulate into a single comma-joined `_elements` entry. A
    /// positive request always keeps `id` and `resourceType`, even with no
    /// fields; excluded fields are added with a `-` prefix. The entry is never
    /// empty.
    #[must_use]
    pub fn elements(&self, fields: &[&str], exclude: bool) -> Self {
        let mut requested: IndexSet<String> = self
            .get(ELEMENTS)
            .and_then(<[String]>::first)
            .map(|joined| {
                joined
                    .split(',')
                    .filter(|field| !field.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if exclude {
            requested.extend(fields.iter().map(|field| format!("-{field}")));
        } else {
            requested.extend(IDENTITY_ELEMENTS.iter().map(|field| field.to_string()));
            requested.extend(fields.iter().map(|field| field.to_string()));
        }
        if requested.is_empty() {
            return self.clone();
        }

        let joined: Vec<String> = requested.into_iter().collect();
        self.replaced(ELEMENTS, joined.join(","))
    }

    /// Appends an `_include` directive.
    #[must_use]
    pub fn include(&self, include: impl Into<Include>) -> Self {
        let include = include.into();
        self.appended(include.key(INCLUDE), [include.value()])
    }

    /// Appends a `_revinclude` directive.
    #[must_use]
    pub fn revinclude(&self, include: impl Into<Include>) -> Self {
        let include = include.into();
        self.appended(include.key(REVINCLUDE), [include.value()])
    }

    /// Filters by resources that reference the matches.
    ///
    /// `chain` lists `(type, param)` pairs flattened; each filter becomes a
    /// key `_has:{A}:{a}:_has:{B}:{b}:{filter}`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `chain` is empty or has odd length.
    pub fn has<I, K, V>(&self, chain: &[&str], filters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        if chain.is_empty() || chain.len() % 2 != 0 {
            return Err(Error::invalid_argument(format!(
                "_has chain needs type/param pairs, got {} item(s)",
                chain.len()
            )));
        }
        let prefix: Vec<String> = chain
            .chunks(2)
            .map(|pair| format!("{HAS}:{}:{}", pair[0], pair[1]))
            .collect();
        let prefix = prefix.join(":");

        let mut next = self.clone();
        for (filter, value) in filters {
            next.params
                .entry(format!("{prefix}:{}", filter.as_ref()))
                .or_default()
                .push(value.to_string());
        }
        Ok(next)
    }

    /// Loads associated resources (Aidbox `_assoc`).
    #[must_use]
    pub fn assoc(&self, fields: &[&str]) -> Self {
        self.appended(
            ASSOC.to_string(),
            fields.iter().map(|field| field.to_string()),
        )
    }

    /// One `(key, value)` pair per value, in parameter order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.clone(), value.clone())))
            .collect()
    }

    /// URL-encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}

impl fmt::Display for SearchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.resource_type)
        } else {
            write!(f, "{}?{}", self.resource_type, self.to_query_string())
        }
    }
}
