//! The scrape flow: verify page, show balances, read the table, report, log out.

mod orchestrator;
pub mod saldo;
pub mod table;

pub use orchestrator::Scraper;
pub use saldo::{find_saldo, is_saldo_on, show_saldo};
pub use table::{find_transaction_table, scrape_latest_transactions, scrape_transaction};
