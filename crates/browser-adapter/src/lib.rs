//! Narrow browser collaborator interface.
//!
//! The automation core never talks to a real browser directly; it
//! consumes the [`Browser`] trait defined here. The trait is polymorphic
//! over three selector dialects ([`QuerySpec`]) so callers never learn
//! which dialect actually matched. A scripted in-memory [`StubBrowser`]
//! (behind the default `stub` feature) backs tests and dry wiring.

pub mod errors;
pub mod events;
#[cfg(feature = "stub")]
pub mod stub;
pub mod types;

pub use errors::AdapterError;
pub use events::{EventLog, InteractionEvent, InteractionKind};
#[cfg(feature = "stub")]
pub use stub::{StubBrowser, StubElement, StubPage};
pub use types::{ElementHandle, QuerySpec};

use std::time::Duration;

use async_trait::async_trait;

/// Capability set the import core consumes.
///
/// Every method is a single round trip; waiting and retrying are the
/// caller's concern. Handles returned by [`Browser::query`] are owned by
/// the backend and become stale when the page navigates.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Navigate the shared session to `url`, waiting up to `deadline`
    /// for the load to settle.
    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), AdapterError>;

    /// Look up one candidate expression against the live document.
    /// `Ok(None)` means "no match right now", not an error.
    async fn query(&self, spec: &QuerySpec) -> Result<Option<ElementHandle>, AdapterError>;

    /// Whether the element behind `handle` is currently visible.
    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, AdapterError>;

    async fn click(&self, handle: &ElementHandle) -> Result<(), AdapterError>;

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), AdapterError>;

    /// Current location of the shared session.
    async fn current_location(&self) -> Result<String, AdapterError>;

    /// Capture a labeled screenshot, returning the artifact path.
    async fn capture_image(&self, label: &str) -> Result<String, AdapterError>;

    /// Raw HTML of the current document, for structural snapshots.
    async fn document_html(&self) -> Result<String, AdapterError>;

    /// Interaction events recorded so far (bounded, oldest dropped).
    fn event_log(&self) -> &EventLog;
}
