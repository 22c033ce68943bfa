//! Selector dialects and element handles

use std::fmt;

use serde::{Deserialize, Serialize};

/// One concrete expression for locating an element, tagged with its
/// resolution dialect. Callers treat all three uniformly; only the
/// backend interprets the payload.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "dialect", content = "expr", rename_all = "lowercase")]
pub enum QuerySpec {
    /// Structural query (CSS selector).
    Css(String),

    /// Path-based query (XPath expression).
    XPath(String),

    /// Text-content match against visible text.
    Text(String),
}

impl QuerySpec {
    pub fn dialect(&self) -> &'static str {
        match self {
            QuerySpec::Css(_) => "css",
            QuerySpec::XPath(_) => "xpath",
            QuerySpec::Text(_) => "text",
        }
    }

    pub fn expression(&self) -> &str {
        match self {
            QuerySpec::Css(e) | QuerySpec::XPath(e) | QuerySpec::Text(e) => e,
        }
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dialect(), self.expression())
    }
}

/// Opaque reference to an element in the live document.
///
/// Owned by the browser backend; the core never destroys one, and a
/// handle may go stale after navigation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_spec_display_carries_dialect() {
        let spec = QuerySpec::Css("button[type=submit]".into());
        assert_eq!(spec.to_string(), "css:button[type=submit]");
        assert_eq!(QuerySpec::Text("Sign in".into()).dialect(), "text");
    }
}
