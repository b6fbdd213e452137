//! [`Page`] over a live Chrome tab, driven through the DevTools protocol.
//!
//! Each operation is a single `Runtime.evaluate` of a small script. Elements
//! found by a script are parked in an array on `window` and handed back to
//! Rust as their index in it, which is what a [`NodeRef`] holds. The array
//! disappears with the document, so handles do not survive navigation.
//!
//! An element keeps the index it got the first time it was handed out, so
//! repeated lookups of the same element (polling for the saldo label, walking
//! to the ball again) do not grow the array. It holds at most the distinct
//! elements a run has touched, and nothing is removed before navigation.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use serde::de::DeserializeOwned;

use super::{NodeRef, Page};

/// Binds `r` to the node registry and `keep(n)` to "index of `n` in it,
/// adding it if new".
const PRELUDE: &str = "const r = (window.__mbankHistoryNodes = window.__mbankHistoryNodes || []); \
     const keep = (n) => { const i = r.indexOf(n); return i >= 0 ? i : r.push(n) - 1; };";

/// Script running `body` with `node` bound to the element registered as
/// `handle`.
fn node_script(handle: NodeRef, body: &str) -> String {
    format!(
        "(() => {{ {PRELUDE} const node = r[{id}]; \
         if (!node || !node.isConnected) return {{ stale: true }}; \
         return {{ stale: false, value: (() => {{ {body} }})() }}; }})()",
        id = handle.raw(),
    )
}

/// Script registering the first node matching `xpath`, or returning `null`.
fn xpath_script(xpath: &str) -> Result<String> {
    Ok(format!(
        "(() => {{ {PRELUDE} \
         const n = document.evaluate({xpath}, document, null, \
         XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; \
         return n ? keep(n) : null; }})()",
        xpath = serde_json::to_string(xpath)?,
    ))
}

pub struct ChromiumPage {
    page: chromiumoxide::Page,
}

impl ChromiumPage {
    pub fn new(page: chromiumoxide::Page) -> Self {
        Self { page }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        tracing::trace!(%script, "evaluating");
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .build()
            .map_err(|e| anyhow!("Failed to build evaluate params: {e}"))?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .context("Page script failed")?;
        let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).context("Unexpected page script result")
    }

    /// Evaluate `body` with `node` bound to the element behind `handle`.
    ///
    /// `None` means the script produced `null` or `undefined`.
    async fn with_node<T: DeserializeOwned>(
        &self,
        handle: NodeRef,
        body: &str,
    ) -> Result<Option<T>> {
        let reply: NodeReply<T> = self.eval(node_script(handle, body)).await?;
        if reply.stale {
            return Err(anyhow!("Node {} is no longer in the document", handle.raw()));
        }
        Ok(reply.value)
    }

    async fn register_xpath(&self, xpath: &str) -> Result<Option<NodeRef>> {
        let index: Option<u64> = self.eval(xpath_script(xpath)?).await?;
        Ok(index.map(NodeRef::new))
    }
}

#[derive(serde::Deserialize)]
struct NodeReply<T> {
    stale: bool,
    value: Option<T>,
}

/// Quote `text` as an XPath 1.0 string literal.
fn xpath_literal(text: &str) -> Result<String> {
    if !text.contains('\'') {
        Ok(format!("'{text}'"))
    } else if !text.contains('"') {
        Ok(format!("\"{text}\""))
    } else {
        Err(anyhow!("Cannot quote {text:?} for XPath"))
    }
}

#[async_trait::async_trait]
impl Page for ChromiumPage {
    async fn location(&self) -> Result<String> {
        self.eval("window.location.href".to_string()).await
    }

    async fn find_label_by_text(&self, tag: &str, text: &str) -> Result<Option<NodeRef>> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("Invalid tag name {tag:?}"));
        }
        let xpath = format!("//{tag}[contains(text(),{})]", xpath_literal(text)?);
        self.register_xpath(&xpath).await
    }

    async fn first_table_body(&self) -> Result<Option<NodeRef>> {
        self.register_xpath("//tbody").await
    }

    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        let index: Option<u64> = self
            .with_node(
                node,
                "const p = node.parentElement; return p ? keep(p) : null;",
            )
            .await?;
        Ok(index.map(NodeRef::new))
    }

    async fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let indices: Vec<u64> = self
            .with_node(node, "return Array.from(node.children, keep);")
            .await?
            .unwrap_or_default();
        Ok(indices.into_iter().map(NodeRef::new).collect())
    }

    async fn inner_text(&self, node: NodeRef) -> Result<String> {
        Ok(self
            .with_node(node, "return node.innerText;")
            .await?
            .unwrap_or_default())
    }

    async fn background_color(&self, node: NodeRef) -> Result<String> {
        self.with_node(node, "return getComputedStyle(node).backgroundColor;")
            .await?
            .ok_or_else(|| anyhow!("No computed background color for node {}", node.raw()))
    }

    async fn click(&self, node: NodeRef) -> Result<()> {
        let _: Option<bool> = self.with_node(node, "node.click(); return true;").await?;
        Ok(())
    }

    async fn navigate(&self, target: &str) -> Result<()> {
        let script = format!(
            "(() => {{ window.location = {}; return true; }})()",
            serde_json::to_string(target)?
        );
        let _: Option<bool> = self.eval(script).await?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .context("Navigation did not complete")?;
        Ok(())
    }
}
