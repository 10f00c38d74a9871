//! Path segments for [`Node::get_by_path`](crate::Node::get_by_path) and
//! [`Node::set_by_path`](crate::Node::set_by_path).

use std::fmt;

use crate::element::Element;

/// One step of a document path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// A field of a node or reference.
    Key(String),
    /// A position in a list; negative positions count from the end.
    Index(isize),
    /// The first list item whose fields equal all of the given pairs.
    Match(Vec<(String, Element)>),
}

impl PathSegment {
    /// Builds a [`PathSegment::Match`] from `(key, value)` pairs.
    pub fn matching<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Element>,
    {
        Self::Match(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<isize> for PathSegment {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for PathSegment {
    fn from(index: i32) -> Self {
        Self::Index(index as isize)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(isize::try_from(index).unwrap_or(isize::MAX))
    }
}

/// Resolves a possibly negative list position against a list length.
pub(crate) fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        len.checked_sub(index.unsigned_abs())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Match(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                write!(f, "[{}]", rendered.join(","))
            }
        }
    }
}

/// Builds a path array from keys and indices.
///
/// ```
/// use aidbox_core::{path, PathSegment};
///
/// let p = path!["name", 0, "text"];
/// assert_eq!(p[1], PathSegment::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {
        [$($crate::PathSegment::from($segment)),*]
    };
}
