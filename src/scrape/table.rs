//! Reading transaction rows out of the history table.

use anyhow::Result;

use crate::clock::Sleeper;
use crate::config::{ColumnLayout, ScraperConfig};
use crate::error::ScrapeError;
use crate::models::TransactionRecord;
use crate::page::{NodeRef, Page};
use crate::probe::probe_till_true;
use crate::sink::ResultSink;

/// The first table body on the page. Nothing tells apart several tables.
pub async fn find_transaction_table(page: &dyn Page) -> Result<Option<NodeRef>> {
    page.first_table_body().await
}

async fn cell_text(
    page: &dyn Page,
    cells: &[NodeRef],
    row: usize,
    column: usize,
) -> Result<String, ScrapeError> {
    let cell = cells
        .get(column)
        .copied()
        .ok_or(ScrapeError::MissingCell { row, column })?;
    Ok(page.inner_text(cell).await?)
}

/// Reads one data row. `row` is its index among the table body's children.
pub async fn scrape_transaction(
    page: &dyn Page,
    tr: NodeRef,
    row: usize,
    columns: &ColumnLayout,
) -> Result<TransactionRecord, ScrapeError> {
    let cells = page.children(tr).await?;
    Ok(TransactionRecord {
        date: cell_text(page, &cells, row, columns.date).await?,
        description: cell_text(page, &cells, row, columns.description).await?,
        amount: cell_text(page, &cells, row, columns.amount).await?,
        balance: cell_text(page, &cells, row, columns.balance).await?,
    })
}

/// Waits for the history table and reads every data row, in page order.
///
/// Data rows alternate with detail rows, so only every
/// `layout.row_stride`-th child is read, starting with the first.
pub async fn scrape_latest_transactions(
    page: &dyn Page,
    config: &ScraperConfig,
    sleeper: &dyn Sleeper,
    sink: &dyn ResultSink,
) -> Result<Vec<TransactionRecord>, ScrapeError> {
    let table = probe_till_true(|| find_transaction_table(page), &config.probe, sleeper)
        .await?
        .ok_or(ScrapeError::TransactionTableMissing)?;

    let rows = page.children(table).await?;
    let stride = config.layout.row_stride.max(1);

    let mut records = Vec::with_capacity(rows.len().div_ceil(stride));
    for (index, &tr) in rows.iter().enumerate().step_by(stride) {
        records.push(scrape_transaction(page, tr, index, &config.layout.columns).await?);
    }

    tracing::info!(rows = rows.len(), records = records.len(), "read history table");
    if let Ok(value) = serde_json::to_value(&records) {
        sink.log(value);
    }
    Ok(records)
}
