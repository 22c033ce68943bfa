//! Per-stage selector targets consumed by the pipeline
//!
//! The concrete candidate expressions are page-specific configuration;
//! the CLI supplies them. The pipeline only knows the logical targets.

use csvpilot_core_types::ImportType;
use import_locator::SelectorSpec;

/// Logical UI targets for every pipeline stage.
#[derive(Clone, Debug)]
pub struct ImportSelectors {
    // Authentication
    pub email_input: SelectorSpec,
    pub password_input: SelectorSpec,

    // Locate-and-select-target
    pub import_button: SelectorSpec,
    pub file_type_modal: SelectorSpec,
    pub next_button: SelectorSpec,

    // Submit-input
    pub drop_zone: SelectorSpec,
    pub file_input: SelectorSpec,
    pub remove_file: SelectorSpec,

    // Verify-readiness
    pub validation_success: SelectorSpec,

    // Confirm
    pub ready_to_import: SelectorSpec,
    pub import_file_button: SelectorSpec,

    // Await-completion
    pub completion_indicator: SelectorSpec,
}

impl ImportSelectors {
    /// Radio button selecting `import_type` in the file-type modal.
    ///
    /// Built per call because the expressions embed the type name.
    pub fn type_radio(&self, import_type: ImportType) -> SelectorSpec {
        let name = import_type.name();
        SelectorSpec::new(format!("{name} radio"))
            .css(format!("input[type=\"radio\"][value=\"{name}\"]"))
            .xpath(format!(
                "//label[contains(., '{name}')]//input[@type='radio']"
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_radio_embeds_the_type_name() {
        let selectors = ImportSelectors {
            email_input: SelectorSpec::new("email"),
            password_input: SelectorSpec::new("password"),
            import_button: SelectorSpec::new("import"),
            file_type_modal: SelectorSpec::new("modal"),
            next_button: SelectorSpec::new("next"),
            drop_zone: SelectorSpec::new("drop zone"),
            file_input: SelectorSpec::new("file input"),
            remove_file: SelectorSpec::new("remove file"),
            validation_success: SelectorSpec::new("validation success"),
            ready_to_import: SelectorSpec::new("ready"),
            import_file_button: SelectorSpec::new("import file"),
            completion_indicator: SelectorSpec::new("completion"),
        };

        let radio = selectors.type_radio(ImportType::Projects);
        assert!(radio.candidates[0].expression().contains("projects"));
        assert_eq!(radio.candidates.len(), 2);
    }
}
