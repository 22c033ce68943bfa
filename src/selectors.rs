//! Default selector catalog
//!
//! Every logical UI target the pipeline touches, with 2-3 candidate
//! expressions in preference order. Structural (CSS) candidates come
//! first; text candidates are the last resort because copy changes
//! more often than markup.

use import_flow::ImportSelectors;
use import_locator::SelectorSpec;
use once_cell::sync::Lazy;

pub static DEFAULT_SELECTORS: Lazy<ImportSelectors> = Lazy::new(|| ImportSelectors {
    email_input: SelectorSpec::new("email input")
        .css("input[type=\"email\"]")
        .css("input[name=\"email\"]")
        .xpath("//input[contains(@placeholder, 'mail')]"),
    password_input: SelectorSpec::new("password input")
        .css("input[type=\"password\"]")
        .css("input[name=\"password\"]"),

    import_button: SelectorSpec::new("import button")
        .css("[data-testid=\"import-button\"]")
        .xpath("//button[normalize-space()='Import']")
        .text("Import"),
    file_type_modal: SelectorSpec::new("file type modal")
        .css(".modal-title")
        .text("Select the file type you wish to import"),
    next_button: SelectorSpec::new("next button")
        .css("button[type=\"submit\"]")
        .xpath("//button[normalize-space()='Next']")
        .text("Next"),

    drop_zone: SelectorSpec::new("drop zone")
        .css("[data-testid=\"dropzone\"]")
        .text("Drop or select file"),
    file_input: SelectorSpec::new("file input").css("input[type=\"file\"]"),
    remove_file: SelectorSpec::new("remove file")
        .xpath("//button[contains(@aria-label, 'Remove')]")
        .text("Remove file"),

    validation_success: SelectorSpec::new("validation success")
        .css(".validation-success")
        .text("All data is valid and ready to import"),

    ready_to_import: SelectorSpec::new("ready to import")
        .css("[data-testid=\"ready-to-import\"]")
        .text("Ready to import"),
    import_file_button: SelectorSpec::new("import file button")
        .xpath("//button[normalize-space()='Import File']")
        .text("Import File"),

    completion_indicator: SelectorSpec::new("completion indicator")
        .css("[data-status=\"completed\"]")
        .text("completed"),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_target_has_candidates() {
        let selectors = DEFAULT_SELECTORS.clone();
        let specs = [
            &selectors.email_input,
            &selectors.password_input,
            &selectors.import_button,
            &selectors.file_type_modal,
            &selectors.next_button,
            &selectors.drop_zone,
            &selectors.file_input,
            &selectors.remove_file,
            &selectors.validation_success,
            &selectors.ready_to_import,
            &selectors.import_file_button,
            &selectors.completion_indicator,
        ];
        for spec in specs {
            assert!(!spec.is_empty(), "{} has no candidates", spec.target);
            assert!(spec.candidates.len() <= 3);
        }
    }
}
