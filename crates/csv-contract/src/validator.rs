//! Contract validator

use std::fs;
use std::path::{Path, PathBuf};

use csvpilot_core_types::ImportType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contract::HeaderContract;
use crate::errors::ContractError;

/// Read-only validation record, produced once per task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvValidationResult {
    pub path: PathBuf,
    pub byte_size: u64,
    /// Non-blank lines, header included.
    pub line_count: usize,
    /// Header cells in file order, trimmed.
    pub headers: Vec<String>,
}

impl CsvValidationResult {
    /// Data rows, excluding the header line.
    pub fn data_rows(&self) -> usize {
        self.line_count.saturating_sub(1)
    }
}

/// Validate an input file (or pick one from a directory) against the
/// contract for `import_type`.
///
/// Checks run in a fixed order so the first structural problem wins:
/// existence, size, row count, then headers.
pub fn validate(
    path_or_dir: &Path,
    contract: &HeaderContract,
    import_type: ImportType,
) -> Result<CsvValidationResult, ContractError> {
    let path = resolve_candidate(path_or_dir, import_type)?;

    let metadata = fs::metadata(&path).map_err(|_| ContractError::FileNotFound {
        import_type,
        searched: path.clone(),
    })?;
    if metadata.len() == 0 {
        return Err(ContractError::EmptyInput { path });
    }

    let content = fs::read_to_string(&path).map_err(|err| ContractError::Unreadable {
        path: path.clone(),
        reason: err.to_string(),
    })?;

    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ContractError::InsufficientRows {
            path,
            line_count: lines.len(),
        });
    }

    let headers = parse_headers(&path, lines[0])?;
    let missing = contract.missing_from(&headers);
    if !missing.is_empty() {
        return Err(ContractError::MissingHeaders {
            path,
            missing,
            observed: headers,
        });
    }

    debug!(
        path = %path.display(),
        lines = lines.len(),
        headers = ?headers,
        "contract validation passed"
    );

    Ok(CsvValidationResult {
        byte_size: metadata.len(),
        line_count: lines.len(),
        headers,
        path,
    })
}

/// Pick the input file for `import_type`.
///
/// Directory precedence: name contains the type, then name contains
/// both "template" and the type, then the first tabular file at all
/// (with a warning). Entries are considered in name order so repeated
/// runs pick the same file.
fn resolve_candidate(path_or_dir: &Path, import_type: ImportType) -> Result<PathBuf, ContractError> {
    if path_or_dir.is_file() {
        return Ok(path_or_dir.to_path_buf());
    }

    if !path_or_dir.is_dir() {
        return Err(ContractError::FileNotFound {
            import_type,
            searched: path_or_dir.to_path_buf(),
        });
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(path_or_dir)
        .map_err(|err| ContractError::Unreadable {
            path: path_or_dir.to_path_buf(),
            reason: err.to_string(),
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    let name_of = |path: &PathBuf| {
        path.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    };
    let type_name = import_type.name();

    if let Some(found) = candidates.iter().find(|p| name_of(p).contains(type_name)) {
        return Ok(found.clone());
    }
    if let Some(found) = candidates
        .iter()
        .find(|p| name_of(p).contains("template") && name_of(p).contains(type_name))
    {
        return Ok(found.clone());
    }
    if let Some(first) = candidates.first() {
        warn!(
            import_type = %import_type,
            picked = %first.display(),
            "no type-matching file; falling back to first tabular file"
        );
        return Ok(first.clone());
    }

    Err(ContractError::FileNotFound {
        import_type,
        searched: path_or_dir.to_path_buf(),
    })
}

fn parse_headers(path: &Path, header_line: &str) -> Result<Vec<String>, ContractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(header_line.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| ContractError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn schemes_contract() -> HeaderContract {
        HeaderContract::for_type(ImportType::Schemes)
    }

    #[test]
    fn well_formed_file_validates_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "schemes.csv",
            "name,scheme_code,description\nBRC01,SC-1,Food safety\nBRC02,SC-2,Packaging\n",
        );

        let first = validate(&path, &schemes_contract(), ImportType::Schemes).unwrap();
        let second = validate(&path, &schemes_contract(), ImportType::Schemes).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.line_count, 3);
        assert_eq!(first.data_rows(), 2);
        assert_eq!(first.headers[1], "scheme_code");
    }

    #[test]
    fn containment_matches_decorated_header() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "s.csv", "Name,SCHEME_CODE\nBRC01,1\n");
        assert!(validate(&path, &schemes_contract(), ImportType::Schemes).is_ok());
    }

    #[test]
    fn missing_token_is_reported_with_observed_headers() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "i.csv", "name,email\nJo,jo@example.com\n");
        let contract = HeaderContract::new(["name", "email", "phone"]);

        let err = validate(&path, &contract, ImportType::Inspectors).unwrap_err();
        match err {
            ContractError::MissingHeaders {
                missing, observed, ..
            } => {
                assert_eq!(missing, vec!["phone"]);
                assert_eq!(observed, vec!["name", "email"]);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn type_matching_file_wins_in_a_directory() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "inspectors-template.csv", "name,email\nJo,j@x.com\n");
        write_file(&dir, "schemes-template.csv", "name,code\nBRC01,1\n");

        let result = validate(dir.path(), &schemes_contract(), ImportType::Schemes).unwrap();
        assert!(result
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("schemes"));
    }

    #[test]
    fn falls_back_to_first_tabular_file_with_warning() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "data.csv", "name,code\nBRC01,1\n");
        write_file(&dir, "notes.txt", "not tabular");

        let result = validate(dir.path(), &schemes_contract(), ImportType::Schemes).unwrap();
        assert!(result.path.file_name().unwrap().to_string_lossy() == "data.csv");
    }

    #[test]
    fn empty_directory_fails_with_file_not_found() {
        let dir = TempDir::new().unwrap();
        let err = validate(dir.path(), &schemes_contract(), ImportType::Schemes).unwrap_err();
        assert!(matches!(err, ContractError::FileNotFound { .. }));
    }

    #[test]
    fn zero_byte_file_is_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "schemes.csv", "");
        let err = validate(&path, &schemes_contract(), ImportType::Schemes).unwrap_err();
        assert!(matches!(err, ContractError::EmptyInput { .. }));
    }

    #[test]
    fn header_only_file_fails_on_rows_before_headers_are_checked() {
        let dir = TempDir::new().unwrap();
        // Header would also fail the contract; row count must win.
        let path = write_file(&dir, "schemes.csv", "wrong,columns\n");
        let err = validate(&path, &schemes_contract(), ImportType::Schemes).unwrap_err();
        assert!(matches!(
            err,
            ContractError::InsufficientRows { line_count: 1, .. }
        ));
    }

    #[test]
    fn blank_lines_are_ignored_in_the_row_count() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "schemes.csv", "name,code\n\n\nBRC01,1\n\n");
        let result = validate(&path, &schemes_contract(), ImportType::Schemes).unwrap();
        assert_eq!(result.line_count, 2);
    }
}
