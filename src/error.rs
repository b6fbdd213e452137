use thiserror::Error;

/// Why a scrape run failed.
///
/// The `Display` text is what ends up after the error marker in the
/// reported outcome.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Scraping must start on the history page {expected}, but the page is at {actual}.")]
    WrongLocation { expected: String, actual: String },

    #[error("Could not find the saldo button.")]
    SaldoControlMissing,

    #[error("Could not find the transaction table.")]
    TransactionTableMissing,

    #[error("Row {row} has no cell at column {column}.")]
    MissingCell { row: usize, column: usize },

    #[error("Could not find {what}.")]
    MissingNode { what: String },

    /// The page adapter itself failed (lost connection, stale node, ...).
    #[error(transparent)]
    Page(#[from] anyhow::Error),
}
