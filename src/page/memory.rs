// src/page/memory.rs
//! In-memory page implementation for testing.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::{NodeRef, Page};

/// Description of an element to add to a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    text: String,
    background: Option<String>,
    hidden_for: usize,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// The element's own text (not counting children).
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Keep the element out of the first `queries` label/table lookups, as if
    /// the page were still rendering.
    pub fn hidden_for(mut self, queries: usize) -> Self {
        self.hidden_for = queries;
        self
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    text: String,
    background: Option<String>,
    hidden_for: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    on_click: Option<(usize, String)>,
}

/// A small document tree with a `body` root.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    location: String,
    elements: Vec<Element>,
    stall_navigation: bool,
}

impl MemoryDocument {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            elements: vec![Element {
                tag: "body".to_string(),
                text: String::new(),
                background: None,
                hidden_for: 0,
                parent: None,
                children: Vec::new(),
                on_click: None,
            }],
            stall_navigation: false,
        }
    }

    pub fn root(&self) -> NodeRef {
        NodeRef::new(0)
    }

    /// Append `spec` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// If `parent` does not belong to this document.
    pub fn append(&mut self, parent: NodeRef, spec: ElementSpec) -> NodeRef {
        let parent_index = parent.raw() as usize;
        assert!(
            parent_index < self.elements.len(),
            "parent {parent:?} is not part of this document"
        );

        let index = self.elements.len();
        self.elements.push(Element {
            tag: spec.tag,
            text: spec.text,
            background: spec.background,
            hidden_for: spec.hidden_for,
            parent: Some(parent_index),
            children: Vec::new(),
            on_click: None,
        });
        self.elements[parent_index].children.push(index);
        NodeRef::new(index as u64)
    }

    /// Navigations never finish loading: waiting for one hangs forever.
    pub fn stall_navigation(&mut self) {
        self.stall_navigation = true;
    }

    /// Clicking `clicked` repaints `target` with `color`.
    pub fn on_click_set_background(
        &mut self,
        clicked: NodeRef,
        target: NodeRef,
        color: impl Into<String>,
    ) {
        if let Some(element) = self.elements.get_mut(clicked.raw() as usize) {
            element.on_click = Some((target.raw() as usize, color.into()));
        }
    }

    fn element(&self, node: NodeRef) -> Result<&Element> {
        self.elements
            .get(node.raw() as usize)
            .ok_or_else(|| anyhow!("Unknown node {}", node.raw()))
    }

    /// Element indices in document order.
    fn document_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.elements.len());
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.elements[index].children.iter().rev());
        }
        order
    }

    fn find_first(&self, query_number: usize, matches: impl Fn(&Element) -> bool) -> Option<NodeRef> {
        self.document_order()
            .into_iter()
            .find(|&index| {
                let element = &self.elements[index];
                query_number > element.hidden_for && matches(element)
            })
            .map(|index| NodeRef::new(index as u64))
    }

    fn inner_text(&self, index: usize) -> String {
        let element = &self.elements[index];
        let mut text = element.text.clone();
        for &child in &element.children {
            text.push_str(&self.inner_text(child));
        }
        text
    }
}

#[derive(Debug)]
struct State {
    document: MemoryDocument,
    label_queries: usize,
    table_queries: usize,
    clicks: Vec<NodeRef>,
    navigations: Vec<String>,
    navigation_waits: usize,
}

/// A [`Page`] backed by a [`MemoryDocument`] that records every side effect.
pub struct MemoryPage {
    state: Mutex<State>,
}

impl MemoryPage {
    pub fn new(document: MemoryDocument) -> Self {
        Self {
            state: Mutex::new(State {
                document,
                label_queries: 0,
                table_queries: 0,
                clicks: Vec::new(),
                navigations: Vec::new(),
                navigation_waits: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Elements clicked so far.
    pub fn clicks(&self) -> Vec<NodeRef> {
        self.lock().clicks.clone()
    }

    /// Navigation targets requested so far, as given.
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// How many times a caller waited for a navigation to finish.
    pub fn navigation_waits(&self) -> usize {
        self.lock().navigation_waits
    }

    pub fn label_queries(&self) -> usize {
        self.lock().label_queries
    }

    pub fn table_queries(&self) -> usize {
        self.lock().table_queries
    }

    pub fn background_of(&self, node: NodeRef) -> Option<String> {
        let state = self.lock();
        state
            .document
            .element(node)
            .ok()
            .and_then(|e| e.background.clone())
    }
}

#[async_trait::async_trait]
impl Page for MemoryPage {
    async fn location(&self) -> Result<String> {
        Ok(self.lock().document.location.clone())
    }

    async fn find_label_by_text(&self, tag: &str, text: &str) -> Result<Option<NodeRef>> {
        let mut state = self.lock();
        state.label_queries += 1;
        let query_number = state.label_queries;
        Ok(state.document.find_first(query_number, |e| {
            e.tag.eq_ignore_ascii_case(tag) && e.text.contains(text)
        }))
    }

    async fn first_table_body(&self) -> Result<Option<NodeRef>> {
        let mut state = self.lock();
        state.table_queries += 1;
        let query_number = state.table_queries;
        Ok(state
            .document
            .find_first(query_number, |e| e.tag.eq_ignore_ascii_case("tbody")))
    }

    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        let state = self.lock();
        let element = state.document.element(node)?;
        Ok(element.parent.map(|p| NodeRef::new(p as u64)))
    }

    async fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let state = self.lock();
        let element = state.document.element(node)?;
        Ok(element
            .children
            .iter()
            .map(|&c| NodeRef::new(c as u64))
            .collect())
    }

    async fn inner_text(&self, node: NodeRef) -> Result<String> {
        let state = self.lock();
        state.document.element(node)?;
        Ok(state.document.inner_text(node.raw() as usize))
    }

    async fn background_color(&self, node: NodeRef) -> Result<String> {
        let state = self.lock();
        let element = state.document.element(node)?;
        Ok(element
            .background
            .clone()
            .unwrap_or_else(|| "rgba(0, 0, 0, 0)".to_string()))
    }

    async fn click(&self, node: NodeRef) -> Result<()> {
        let mut state = self.lock();
        let effect = state.document.element(node)?.on_click.clone();
        state.clicks.push(node);
        if let Some((target, color)) = effect {
            if let Some(element) = state.document.elements.get_mut(target) {
                element.background = Some(color);
            }
        }
        Ok(())
    }

    async fn navigate(&self, target: &str) -> Result<()> {
        let mut state = self.lock();
        let resolved = resolve_location(&state.document.location, target);
        state.navigations.push(target.to_string());
        state.document.location = resolved;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        let stall = {
            let mut state = self.lock();
            state.navigation_waits += 1;
            state.document.stall_navigation
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Resolve `target` against `current` the way `window.location = target` would
/// for absolute URLs and origin-relative paths.
fn resolve_location(current: &str, target: &str) -> String {
    if target.contains("://") {
        return target.to_string();
    }
    if let Some(path) = target.strip_prefix('/') {
        let origin_end = current
            .find("://")
            .and_then(|scheme_end| {
                current[scheme_end + 3..]
                    .find('/')
                    .map(|host_len| scheme_end + 3 + host_len)
            })
            .unwrap_or(current.len());
        return format!("{}/{}", &current[..origin_end], path);
    }
    match current.rfind('/') {
        Some(dir_end) => format!("{}/{}", &current[..dir_end], target),
        None => target.to_string(),
    }
}
