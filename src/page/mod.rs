//! Page adapter: the handful of DOM queries and effects the scraper needs.
//!
//! The scraper never touches a browser directly. It talks to a [`Page`], so the
//! same flow runs against a live Chrome tab ([`chromium::ChromiumPage`]) or a
//! hand-built document in tests ([`memory::MemoryPage`]).

pub mod memory;

#[cfg(feature = "browser")]
pub mod chromium;

use anyhow::Result;

pub use memory::{ElementSpec, MemoryDocument, MemoryPage};

/// Opaque handle to an element, valid for the page that issued it until the
/// next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u64);

impl NodeRef {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A live document the scraper can query and act on.
#[async_trait::async_trait]
pub trait Page: Send + Sync {
    /// Full URL of the current document.
    async fn location(&self) -> Result<String>;

    /// First `tag` element, in document order, whose own text contains `text`.
    async fn find_label_by_text(&self, tag: &str, text: &str) -> Result<Option<NodeRef>>;

    /// First table body in the document.
    async fn first_table_body(&self) -> Result<Option<NodeRef>>;

    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>>;

    /// Element children, in order.
    async fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>>;

    async fn child_at(&self, node: NodeRef, index: usize) -> Result<Option<NodeRef>> {
        Ok(self.children(node).await?.get(index).copied())
    }

    /// Rendered text of the element and its descendants.
    async fn inner_text(&self, node: NodeRef) -> Result<String>;

    /// Computed background color, e.g. `rgb(255, 255, 255)`.
    async fn background_color(&self, node: NodeRef) -> Result<String>;

    /// Dispatch a synthetic click on the element.
    async fn click(&self, node: NodeRef) -> Result<()>;

    /// Send the page to an absolute URL or a path on the current origin.
    async fn navigate(&self, target: &str) -> Result<()>;

    /// Resolve once the navigation started by [`Page::navigate`] has loaded.
    /// `navigate` itself only asks for it.
    async fn wait_for_navigation(&self) -> Result<()>;
}
