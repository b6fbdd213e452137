#![allow(dead_code)]

use std::sync::Arc;

use mbank_history::clock::RecordingSleeper;
use mbank_history::config::ScraperConfig;
use mbank_history::page::{ElementSpec, MemoryDocument, MemoryPage, NodeRef};
use mbank_history::Scraper;

pub const HISTORY_URL: &str = "https://online.mbank.pl/history";
pub const LOGOUT_URL: &str = "https://online.mbank.pl/LoginMain/Account/Logout";
pub const BALL_OFF: &str = "rgb(255, 255, 255)";
pub const BALL_ON: &str = "rgb(0, 101, 177)";

/// A history page shaped like the bank's: a toolbar holding the "Saldo"
/// switch, then a table whose body alternates data rows and detail rows.
#[derive(Debug, Clone)]
pub struct HistoryPageBuilder {
    location: String,
    saldo_on: bool,
    with_saldo: bool,
    saldo_hidden_for: usize,
    with_table: bool,
    table_hidden_for: usize,
    rows: Vec<[String; 4]>,
    trailing_detail_row: bool,
    cells_per_row: usize,
    stall_navigation: bool,
}

impl Default for HistoryPageBuilder {
    fn default() -> Self {
        Self {
            location: HISTORY_URL.to_string(),
            saldo_on: false,
            with_saldo: true,
            saldo_hidden_for: 0,
            with_table: true,
            table_hidden_for: 0,
            rows: Vec::new(),
            trailing_detail_row: true,
            cells_per_row: 8,
            stall_navigation: false,
        }
    }
}

pub struct HistoryPage {
    pub page: MemoryPage,
    pub label: Option<NodeRef>,
    pub ball: Option<NodeRef>,
}

impl HistoryPageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn saldo_on(mut self, on: bool) -> Self {
        self.saldo_on = on;
        self
    }

    pub fn without_saldo(mut self) -> Self {
        self.with_saldo = false;
        self
    }

    pub fn saldo_hidden_for(mut self, queries: usize) -> Self {
        self.saldo_hidden_for = queries;
        self
    }

    pub fn without_table(mut self) -> Self {
        self.with_table = false;
        self
    }

    pub fn table_hidden_for(mut self, queries: usize) -> Self {
        self.table_hidden_for = queries;
        self
    }

    pub fn row(mut self, date: &str, description: &str, amount: &str, balance: &str) -> Self {
        self.rows.push([
            date.to_string(),
            description.to_string(),
            amount.to_string(),
            balance.to_string(),
        ]);
        self
    }

    /// End the table body on a data row instead of a detail row.
    pub fn without_trailing_detail_row(mut self) -> Self {
        self.trailing_detail_row = false;
        self
    }

    pub fn cells_per_row(mut self, cells: usize) -> Self {
        self.cells_per_row = cells;
        self
    }

    /// The logout page never finishes loading.
    pub fn stall_navigation(mut self) -> Self {
        self.stall_navigation = true;
        self
    }

    pub fn build(self) -> HistoryPage {
        let mut doc = MemoryDocument::new(self.location);
        if self.stall_navigation {
            doc.stall_navigation();
        }
        let root = doc.root();

        let mut label = None;
        let mut ball = None;
        if self.with_saldo {
            let toolbar = doc.append(root, ElementSpec::new("div"));
            let span = doc.append(
                toolbar,
                ElementSpec::new("span")
                    .text("Saldo")
                    .hidden_for(self.saldo_hidden_for),
            );
            doc.append(toolbar, ElementSpec::new("div"));
            let switch = doc.append(toolbar, ElementSpec::new("div"));
            doc.append(switch, ElementSpec::new("div"));
            let color = if self.saldo_on { BALL_ON } else { BALL_OFF };
            let b = doc.append(switch, ElementSpec::new("div").background(color));
            doc.on_click_set_background(span, b, BALL_ON);
            label = Some(span);
            ball = Some(b);
        }

        if self.with_table {
            let table = doc.append(root, ElementSpec::new("table"));
            let tbody = doc.append(
                table,
                ElementSpec::new("tbody").hidden_for(self.table_hidden_for),
            );
            let count = self.rows.len();
            for (i, fields) in self.rows.iter().enumerate() {
                let tr = doc.append(tbody, ElementSpec::new("tr"));
                for cell in 0..self.cells_per_row {
                    let text = match cell {
                        1 => fields[0].as_str(),
                        3 => fields[1].as_str(),
                        6 => fields[2].as_str(),
                        7 => fields[3].as_str(),
                        _ => "",
                    };
                    doc.append(tr, ElementSpec::new("td").text(text));
                }

                if i + 1 < count || self.trailing_detail_row {
                    let detail = doc.append(tbody, ElementSpec::new("tr"));
                    doc.append(detail, ElementSpec::new("td").text("details"));
                }
            }
        }

        HistoryPage {
            page: MemoryPage::new(doc),
            label,
            ball,
        }
    }
}

/// A scraper with the default layout whose waits are only recorded.
pub fn test_scraper() -> (Scraper, Arc<RecordingSleeper>) {
    test_scraper_with(ScraperConfig::default())
}

pub fn test_scraper_with(config: ScraperConfig) -> (Scraper, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let scraper = Scraper::new(config).with_sleeper(sleeper.clone());
    (scraper, sleeper)
}
