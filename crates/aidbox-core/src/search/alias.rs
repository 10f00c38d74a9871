//! Mapping of builder-friendly search keys to wire parameter names.
//!
//! Keys are split on `__`:
//! - the first segment is the parameter name; underscores become hyphens
//!   unless the name starts with `_` (`birth_date` → `birth-date`, `_id` stays)
//! - a trailing comparison prefix moves to the value
//!   (`birthdate__gt=1900` → `birthdate=gt1900`)
//! - a trailing modifier becomes `:modifier` (`name__contains` → `name:contains`)
//! - middle segments chain: capitalized ones as `:Type`, others as `.param`
//!   (`general_practitioner__Organization__name` →
//!   `general-practitioner:Organization.name`)

use std::fmt;

/// Comparison prefixes for ordered search values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPrefix {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Sa, // starts after
    Eb, // ends before
    Ap, // approximately
}

impl SearchPrefix {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "ge" => Some(Self::Ge),
            "le" => Some(Self::Le),
            "sa" => Some(Self::Sa),
            "eb" => Some(Self::Eb),
            "ap" => Some(Self::Ap),
            _ => None,
        }
    }
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchPrefix::Eq => "eq",
            SearchPrefix::Ne => "ne",
            SearchPrefix::Gt => "gt",
            SearchPrefix::Lt => "lt",
            SearchPrefix::Ge => "ge",
            SearchPrefix::Le => "le",
            SearchPrefix::Sa => "sa",
            SearchPrefix::Eb => "eb",
            SearchPrefix::Ap => "ap",
        };
        f.write_str(s)
    }
}

/// Search parameter modifiers, spelled the way builder keys spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchModifier {
    Exact,
    Contains,
    Text,
    In,
    NotIn,
    Below,
    Above,
    Not,
    Identifier,
    Missing,
    OfType,
}

impl SearchModifier {
    /// Parses the builder spelling (`not_in`, `of_type`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missing" => Some(Self::Missing),
            "exact" => Some(Self::Exact),
            "contains" => Some(Self::Contains),
            "not" => Some(Self::Not),
            "text" => Some(Self::Text),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "below" => Some(Self::Below),
            "above" => Some(Self::Above),
            "identifier" => Some(Self::Identifier),
            "of_type" => Some(Self::OfType),
            _ => None,
        }
    }
}

impl fmt::Display for SearchModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchModifier::Exact => "exact",
            SearchModifier::Contains => "contains",
            SearchModifier::Text => "text",
            SearchModifier::In => "in",
            SearchModifier::NotIn => "not-in",
            SearchModifier::Below => "below",
            SearchModifier::Above => "above",
            SearchModifier::Not => "not",
            SearchModifier::Identifier => "identifier",
            SearchModifier::Missing => "missing",
            SearchModifier::OfType => "ofType",
        };
        f.write_str(s)
    }
}

fn param_name(segment: &str) -> String {
    if segment.starts_with('_') {
        segment.to_string()
    } else {
        segment.replace('_', "-")
    }
}

/// Maps a builder key and value to the wire parameter name and value.
pub fn resolve(key: &str, value: String) -> (String, String) {
    let segments: Vec<&str> = key.split("__").collect();
    let (first, mut rest) = match segments.split_first() {
        Some((first, rest)) => (*first, rest),
        None => return (key.to_string(), value),
    };

    let mut prefix = None;
    let mut modifier = None;
    if let Some((last, init)) = rest.split_last() {
        if let Some(p) = SearchPrefix::parse(last) {
            prefix = Some(p);
            rest = init;
        } else if let Some(m) = SearchModifier::parse(last) {
            modifier = Some(m);
            rest = init;
        }
    }

    let mut name = param_name(first);
    for segment in rest {
        if segment.starts_with(|c: char| c.is_ascii_uppercase()) {
            name.push(':');
            name.push_str(segment);
        } else {
            name.push('.');
            name.push_str(&param_name(segment));
        }
    }
    if let Some(modifier) = modifier {
        name.push_str(&format!(":{modifier}"));
    }

    let value = match prefix {
        Some(prefix) => format!("{prefix}{value}"),
        None => value,
    };
    (name, value)
}
