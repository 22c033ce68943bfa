//! Scripted in-memory browser backend
//!
//! Backs tests and dry wiring with a page graph: named pages hold
//! elements keyed by the exact [`QuerySpec`] that finds them, routes
//! map navigated URLs onto pages, and clicking an element may activate
//! another page (and optionally rewrite the location). Handles go
//! stale as soon as the page they were resolved on stops being active,
//! mirroring real navigation semantics.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::AdapterError;
use crate::events::{EventLog, InteractionEvent, InteractionKind};
use crate::types::{ElementHandle, QuerySpec};
use crate::Browser;

/// One scripted element on a stub page.
#[derive(Clone, Debug)]
pub struct StubElement {
    visible: bool,
    /// Number of queries to swallow before the element "appears".
    appears_after: u32,
    /// Page activated when this element is clicked.
    goto_page: Option<String>,
    /// Location rewritten when this element is clicked.
    goto_location: Option<String>,
}

impl StubElement {
    pub fn visible() -> Self {
        Self {
            visible: true,
            appears_after: 0,
            goto_page: None,
            goto_location: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::visible()
        }
    }

    /// Element only resolvable after `n` failed lookups.
    pub fn appearing_after(n: u32) -> Self {
        Self {
            appears_after: n,
            ..Self::visible()
        }
    }

    /// Clicking activates the named page.
    pub fn leads_to(mut self, page: impl Into<String>) -> Self {
        self.goto_page = Some(page.into());
        self
    }

    /// Clicking rewrites the current location.
    pub fn sets_location(mut self, location: impl Into<String>) -> Self {
        self.goto_location = Some(location.into());
        self
    }
}

/// One scripted page: elements plus the HTML served for snapshots.
#[derive(Clone, Debug, Default)]
pub struct StubPage {
    elements: HashMap<QuerySpec, StubElement>,
    html: String,
}

impl StubPage {
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            html: "<html><body></body></html>".to_string(),
        }
    }

    pub fn with_element(mut self, spec: QuerySpec, element: StubElement) -> Self {
        self.elements.insert(spec, element);
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }
}

#[derive(Debug)]
struct StubState {
    location: String,
    active_page: String,
    pages: HashMap<String, StubPage>,
    routes: HashMap<String, String>,
    handles: HashMap<u64, (String, QuerySpec)>,
    next_handle: u64,
    pending_appearances: HashMap<(String, QuerySpec), u32>,
    typed: Vec<(ElementHandle, String)>,
    captures: Vec<String>,
}

/// Scripted browser backend.
pub struct StubBrowser {
    state: Mutex<StubState>,
    events: EventLog,
}

impl StubBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState {
                location: "about:blank".to_string(),
                active_page: String::new(),
                pages: HashMap::new(),
                routes: HashMap::new(),
                handles: HashMap::new(),
                next_handle: 1,
                pending_appearances: HashMap::new(),
                typed: Vec::new(),
                captures: Vec::new(),
            }),
            events: EventLog::default(),
        }
    }

    pub fn install_page(&self, id: impl Into<String>, page: StubPage) {
        let id = id.into();
        let mut state = self.state.lock();
        for (spec, element) in &page.elements {
            if element.appears_after > 0 {
                state
                    .pending_appearances
                    .insert((id.clone(), spec.clone()), element.appears_after);
            }
        }
        state.pages.insert(id, page);
    }

    /// Map a navigated URL onto a page id.
    pub fn add_route(&self, url: impl Into<String>, page: impl Into<String>) {
        self.state.lock().routes.insert(url.into(), page.into());
    }

    pub fn set_active_page(&self, id: impl Into<String>) {
        self.state.lock().active_page = id.into();
    }

    pub fn set_location(&self, url: impl Into<String>) {
        self.state.lock().location = url.into();
    }

    /// Text typed into elements so far, in order.
    pub fn typed_text(&self) -> Vec<String> {
        self.state
            .lock()
            .typed
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Labels of captured screenshots, in order.
    pub fn capture_labels(&self) -> Vec<String> {
        self.state.lock().captures.clone()
    }

    fn element_for(
        state: &StubState,
        handle: &ElementHandle,
    ) -> Result<StubElement, AdapterError> {
        let (page_id, spec) = state
            .handles
            .get(&handle.raw())
            .ok_or_else(|| AdapterError::Internal(format!("unknown handle {handle}")))?;

        if *page_id != state.active_page {
            return Err(AdapterError::StaleHandle(format!(
                "{handle} was resolved on page '{page_id}'"
            )));
        }

        state
            .pages
            .get(page_id)
            .and_then(|page| page.elements.get(spec))
            .cloned()
            .ok_or_else(|| AdapterError::StaleHandle(format!("{handle} no longer present")))
    }
}

impl Default for StubBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Browser for StubBrowser {
    async fn navigate(&self, url: &str, _deadline: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.location = url.to_string();
        if let Some(page) = state.routes.get(url).cloned() {
            debug!(url, page, "stub navigation");
            state.active_page = page;
        }
        drop(state);
        self.events
            .record(InteractionEvent::now(InteractionKind::Navigate, url));
        Ok(())
    }

    async fn query(&self, spec: &QuerySpec) -> Result<Option<ElementHandle>, AdapterError> {
        let mut state = self.state.lock();
        let page_id = state.active_page.clone();

        let present = state
            .pages
            .get(&page_id)
            .map(|page| page.elements.contains_key(spec))
            .unwrap_or(false);
        if !present {
            return Ok(None);
        }

        let key = (page_id.clone(), spec.clone());
        if let Some(remaining) = state.pending_appearances.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }

        let raw = state.next_handle;
        state.next_handle += 1;
        state.handles.insert(raw, (page_id, spec.clone()));
        Ok(Some(ElementHandle::new(raw)))
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, AdapterError> {
        let state = self.state.lock();
        Ok(Self::element_for(&state, handle)?.visible)
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        let element = Self::element_for(&state, handle)?;
        if let Some(page) = &element.goto_page {
            state.active_page = page.clone();
        }
        if let Some(location) = &element.goto_location {
            state.location = location.clone();
        }
        drop(state);
        self.events
            .record(InteractionEvent::now(InteractionKind::Click, handle.to_string()));
        Ok(())
    }

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        Self::element_for(&state, handle)?;
        state.typed.push((*handle, text.to_string()));
        drop(state);
        self.events
            .record(InteractionEvent::now(InteractionKind::Type, handle.to_string()));
        Ok(())
    }

    async fn current_location(&self) -> Result<String, AdapterError> {
        Ok(self.state.lock().location.clone())
    }

    async fn capture_image(&self, label: &str) -> Result<String, AdapterError> {
        let mut state = self.state.lock();
        state.captures.push(label.to_string());
        drop(state);
        self.events
            .record(InteractionEvent::now(InteractionKind::Capture, label));
        Ok(format!("screenshots/{label}.png"))
    }

    async fn document_html(&self) -> Result<String, AdapterError> {
        let state = self.state.lock();
        let page = state.active_page.clone();
        Ok(state
            .pages
            .get(&page)
            .map(|p| p.html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    fn event_log(&self) -> &EventLog {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_in() -> QuerySpec {
        QuerySpec::Text("Sign in".to_string())
    }

    #[tokio::test]
    async fn navigation_routes_to_installed_page() {
        let stub = StubBrowser::new();
        stub.install_page(
            "login",
            StubPage::new().with_element(sign_in(), StubElement::visible()),
        );
        stub.add_route("https://app.example/", "login");

        stub.navigate("https://app.example/", Duration::from_secs(1))
            .await
            .unwrap();

        let handle = stub.query(&sign_in()).await.unwrap().unwrap();
        assert!(stub.is_visible(&handle).await.unwrap());
        assert_eq!(
            stub.current_location().await.unwrap(),
            "https://app.example/"
        );
    }

    #[tokio::test]
    async fn click_transition_invalidates_old_handles() {
        let stub = StubBrowser::new();
        stub.install_page(
            "login",
            StubPage::new().with_element(sign_in(), StubElement::visible().leads_to("dashboard")),
        );
        stub.install_page("dashboard", StubPage::new());
        stub.set_active_page("login");

        let handle = stub.query(&sign_in()).await.unwrap().unwrap();
        stub.click(&handle).await.unwrap();

        assert!(matches!(
            stub.click(&handle).await,
            Err(AdapterError::StaleHandle(_))
        ));
    }

    #[tokio::test]
    async fn delayed_element_appears_after_configured_queries() {
        let stub = StubBrowser::new();
        stub.install_page(
            "preview",
            StubPage::new().with_element(sign_in(), StubElement::appearing_after(2)),
        );
        stub.set_active_page("preview");

        assert!(stub.query(&sign_in()).await.unwrap().is_none());
        assert!(stub.query(&sign_in()).await.unwrap().is_none());
        assert!(stub.query(&sign_in()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn interactions_are_recorded() {
        let stub = StubBrowser::new();
        stub.install_page(
            "login",
            StubPage::new().with_element(sign_in(), StubElement::visible()),
        );
        stub.set_active_page("login");

        let handle = stub.query(&sign_in()).await.unwrap().unwrap();
        stub.click(&handle).await.unwrap();
        stub.capture_image("01-login").await.unwrap();

        let kinds: Vec<_> = stub
            .event_log()
            .snapshot()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![InteractionKind::Click, InteractionKind::Capture]
        );
    }
}
