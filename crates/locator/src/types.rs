//! Selector spec types

use browser_adapter::QuerySpec;
use serde::{Deserialize, Serialize};

/// One logical UI target with ordered fallback candidates.
///
/// Order encodes preference, not exclusivity: the first candidate that
/// resolves wins and the rest are never evaluated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Human-readable name of the target ("sign-in button").
    pub target: String,

    /// Candidate expressions in preference order.
    pub candidates: Vec<QuerySpec>,
}

impl SelectorSpec {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a structural (CSS) candidate.
    pub fn css(mut self, expr: impl Into<String>) -> Self {
        self.candidates.push(QuerySpec::Css(expr.into()));
        self
    }

    /// Append a path-based (XPath) candidate.
    pub fn xpath(mut self, expr: impl Into<String>) -> Self {
        self.candidates.push(QuerySpec::XPath(expr.into()));
        self
    }

    /// Append a text-content candidate.
    pub fn text(mut self, expr: impl Into<String>) -> Self {
        self.candidates.push(QuerySpec::Text(expr.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate expressions as display strings, for diagnostics.
    pub fn describe_candidates(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.to_string()).collect()
    }
}
