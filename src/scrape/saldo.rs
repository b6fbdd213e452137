//! The "Saldo" switch that makes the history table show running balances.

use anyhow::Result;

use crate::clock::Sleeper;
use crate::config::{LayoutConfig, ScraperConfig};
use crate::error::ScrapeError;
use crate::page::{NodeRef, Page};
use crate::probe::probe_till_true;

/// Finds the switch label.
pub async fn find_saldo(page: &dyn Page, layout: &LayoutConfig) -> Result<Option<NodeRef>> {
    let label = &layout.saldo_label;
    page.find_label_by_text(&label.tag, &label.text).await
}

/// Whether balances are currently shown, judged by the color of the switch
/// ball next to `label`.
pub async fn is_saldo_on(
    page: &dyn Page,
    layout: &LayoutConfig,
    label: NodeRef,
) -> Result<bool, ScrapeError> {
    let mut node = page
        .parent(label)
        .await?
        .ok_or_else(|| ScrapeError::MissingNode {
            what: "the saldo label's parent".to_string(),
        })?;

    for (depth, &index) in layout.ball_path.iter().enumerate() {
        node = page
            .child_at(node, index)
            .await?
            .ok_or_else(|| ScrapeError::MissingNode {
                what: format!("the saldo ball (child {index} at depth {depth})"),
            })?;
    }

    let color = page.background_color(node).await?;
    tracing::debug!(%color, "saldo ball color");
    // A white ball means the balances are hidden.
    Ok(color.trim() != layout.saldo_off_color)
}

/// Make the history page show running balances, clicking the switch if
/// needed.
pub async fn show_saldo(
    page: &dyn Page,
    config: &ScraperConfig,
    sleeper: &dyn Sleeper,
) -> Result<(), ScrapeError> {
    let label = probe_till_true(|| find_saldo(page, &config.layout), &config.probe, sleeper)
        .await?
        .ok_or(ScrapeError::SaldoControlMissing)?;

    if is_saldo_on(page, &config.layout, label).await? {
        tracing::debug!("saldo already shown");
        return Ok(());
    }

    tracing::info!("turning saldo display on");
    page.click(label).await?;
    Ok(())
}
