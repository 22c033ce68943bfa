//! Human-in-the-loop coordination
//!
//! When automated interaction cannot reliably complete a step (sign-in
//! behind anti-automation measures, mostly), the coordinator suspends
//! automated progress, tells the operator what to do, and polls a
//! success condition until it holds or the window closes. One session
//! exists at a time; it is created per manual step and discarded after
//! resolution.

pub mod coordinator;
pub mod errors;

pub use coordinator::{InterventionCoordinator, InterventionOutcome, InterventionRequest};
pub use errors::InterventionError;
