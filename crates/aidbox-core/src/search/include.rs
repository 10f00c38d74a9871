//! `_include` / `_revinclude` directives.

/// How an include follows references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludeModifier {
    #[default]
    None,
    /// Routed to the `:recursive` key.
    Recursive,
    /// Routed to the `:iterate` key.
    Iterate,
}

/// One include directive: `Type:param[:Target]`, or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    source_type: String,
    search_param: Option<String>,
    target_type: Option<String>,
    modifier: IncludeModifier,
}

impl Include {
    #[must_use]
    pub fn new(source_type: impl Into<String>, search_param: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            search_param: Some(search_param.into()),
            target_type: None,
            modifier: IncludeModifier::None,
        }
    }

    /// Includes everything referenced by the matches.
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            source_type: "*".to_string(),
            search_param: None,
            target_type: None,
            modifier: IncludeModifier::None,
        }
    }

    /// Restricts the include to one target type.
    #[must_use]
    pub fn target(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.modifier = IncludeModifier::Recursive;
        self
    }

    #[must_use]
    pub fn iterate(mut self) -> Self {
        self.modifier = IncludeModifier::Iterate;
        self
    }

    /// The parameter key under `base` (`_include` or `_revinclude`).
    pub(crate) fn key(&self, base: &str) -> String {
        match self.modifier {
            IncludeModifier::None => base.to_string(),
            IncludeModifier::Recursive => format!("{base}:recursive"),
            IncludeModifier::Iterate => format!("{base}:iterate"),
        }
    }

    /// The colon-joined parameter value.
    pub(crate) fn value(&self) -> String {
        let Some(param) = &self.search_param else {
            return self.source_type.clone();
        };
        match &self.target_type {
            Some(target) => format!("{}:{param}:{target}", self.source_type),
            None => format!("{}:{param}", self.source_type),
        }
    }
}

impl From<(&str, &str)> for Include {
    fn from((source_type, search_param): (&str, &str)) -> Self {
        Self::new(source_type, search_param)
    }
}

impl From<(&str, &str, &str)> for Include {
    fn from((source_type, search_param, target_type): (&str, &str, &str)) -> Self {
        Self::new(source_type, search_param).target(target_type)
    }
}
