//! Structural CSV contract validation
//!
//! Verifies that an import input exists, is non-empty, carries at least
//! one data row, and that its header satisfies the named import
//! contract. Header matching is substring containment, case
//! insensitive, on purpose: real exports decorate headers with units
//! and punctuation, and the import UI tolerates that too.

pub mod contract;
pub mod errors;
pub mod validator;

pub use contract::HeaderContract;
pub use errors::ContractError;
pub use validator::{validate, CsvValidationResult};
