//! Header contracts per import type

use csvpilot_core_types::ImportType;
use serde::{Deserialize, Serialize};

/// Named set of header tokens required for one import type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderContract {
    pub required: Vec<String>,
}

impl HeaderContract {
    pub fn new(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Default contract for each import type, matching the template
    /// files the target application exports.
    pub fn for_type(import_type: ImportType) -> Self {
        match import_type {
            ImportType::Schemes => Self::new(["name", "code"]),
            ImportType::Projects => Self::new(["order_reference", "name"]),
            ImportType::Inspectors => Self::new(["name", "email"]),
        }
    }

    /// Required tokens with no containing header cell, case-insensitive.
    pub fn missing_from(&self, headers: &[String]) -> Vec<String> {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        self.required
            .iter()
            .filter(|token| {
                let token = token.to_lowercase();
                !lowered.iter().any(|header| header.contains(&token))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_tolerates_decorated_headers() {
        let contract = HeaderContract::new(["code"]);
        let headers = vec!["Scheme_Code (required)".to_string()];
        assert!(contract.missing_from(&headers).is_empty());
    }

    #[test]
    fn missing_tokens_are_reported_verbatim() {
        let contract = HeaderContract::new(["phone"]);
        let headers = vec!["name".to_string(), "email".to_string()];
        assert_eq!(contract.missing_from(&headers), vec!["phone"]);
    }

    #[test]
    fn every_import_type_has_a_contract() {
        for ty in ImportType::all() {
            assert!(!HeaderContract::for_type(ty).required.is_empty());
        }
    }
}
