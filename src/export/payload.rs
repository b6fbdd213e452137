use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::ExportConfig;

use super::ExportError;

/// Dates as the export endpoint wants them: midnight UTC with milliseconds.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000Z").to_string()
}

/// Inclusive day range of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ExportRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ExportError> {
        if from > to {
            return Err(ExportError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Fill in missing ends: `from` from the config, `to` as today.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        config: &ExportConfig,
        clock: &dyn Clock,
    ) -> Result<Self, ExportError> {
        Self::new(
            from.unwrap_or(config.from),
            to.unwrap_or_else(|| clock.today()),
        )
    }
}

/// Body of the export request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub save_file_type: String,
    pub pfm_filters: PfmFilters,
}

/// Filters of the export request. Everything except the product and the
/// dates is fixed to "all transactions, with balances, sorted by date".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PfmFilters {
    pub product_ids: String,
    pub amount_from: Option<String>,
    pub amount_to: Option<String>,
    pub use_absolute_search: bool,
    pub currency: String,
    pub categories: String,
    pub operation_types: String,
    pub search_text: String,
    pub date_from: String,
    pub date_to: String,
    pub standing_order_id: String,
    pub show_debit_transaction_types: bool,
    pub show_credit_transaction_types: bool,
    pub show_irrelevant_transactions: bool,
    pub show_savings_and_investments: bool,
    pub save_show_irrelevant_transactions: bool,
    pub save_show_savings_and_investments: bool,
    pub selected_suggestion_id: String,
    pub selected_suggestion_type: String,
    pub show_uncategorized_transactions: bool,
    pub debit_card_number: String,
    pub show_balance: bool,
    pub counterparty_account_numbers: String,
    pub sorting_order: String,
    pub tags: Vec<String>,
}

impl DownloadRequest {
    pub fn new(product_id: impl Into<String>, range: ExportRange) -> Self {
        Self {
            save_file_type: "CSV".to_string(),
            pfm_filters: PfmFilters {
                product_ids: product_id.into(),
                amount_from: None,
                amount_to: None,
                use_absolute_search: false,
                currency: String::new(),
                categories: String::new(),
                operation_types: String::new(),
                search_text: String::new(),
                date_from: format_date(range.from),
                date_to: format_date(range.to),
                standing_order_id: String::new(),
                show_debit_transaction_types: false,
                show_credit_transaction_types: false,
                show_irrelevant_transactions: true,
                show_savings_and_investments: true,
                save_show_irrelevant_transactions: false,
                save_show_savings_and_investments: false,
                selected_suggestion_id: String::new(),
                selected_suggestion_type: String::new(),
                show_uncategorized_transactions: false,
                debit_card_number: String::new(),
                show_balance: true,
                counterparty_account_numbers: String::new(),
                sorting_order: "ByDate".to_string(),
                tags: Vec::new(),
            },
        }
    }
}
