//! Bounded retry execution
//!
//! Wraps a fallible async operation with a strict attempt ceiling and
//! linearly growing backoff. The growth is linear rather than
//! exponential on purpose: the delays exist to let a UI settle, not to
//! protect a remote service, so worst-case wait stays predictable.
//! Exhaustion is the only failure path out of [`execute`]; an
//! attempt-scoped error never escapes until the policy is spent.

pub mod executor;
pub mod policy;

pub use executor::{execute, OperationOutcome, RetryExhausted};
pub use policy::RetryPolicy;
