//! Budgeted selector resolution with ordered fallback
//!
//! A [`SelectorSpec`] names one logical UI target and carries an ordered
//! list of candidate expressions in mixed dialects. The resolver splits
//! its wall-clock budget evenly across candidates and returns the first
//! one that resolves, so worst-case latency is bounded by the budget no
//! matter how many fallbacks a spec carries.

pub mod errors;
pub mod resolver;
pub mod types;

pub use errors::LocatorError;
pub use resolver::{DefaultSelectorResolver, SelectorResolver, SnapshotSink};
pub use types::SelectorSpec;
