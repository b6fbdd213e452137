use std::sync::Arc;

use serde_json::json;

use crate::clock::{Sleeper, TokioSleeper};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::{ScrapeOutcome, TransactionRecord};
use crate::page::Page;
use crate::sink::ResultSink;

use super::saldo::show_saldo;
use super::table::scrape_latest_transactions;

/// Runs one scrape of the history page from start to logout.
pub struct Scraper {
    config: ScraperConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape `page` and report the outcome to `sink`.
    ///
    /// The run waits `startup_delay` first so the page can settle. Whatever
    /// happens, the outcome is reported exactly once and the page is then sent
    /// to the logout path. The outcome is also returned.
    pub async fn run(&self, page: &dyn Page, sink: &dyn ResultSink) -> ScrapeOutcome {
        self.sleeper.sleep(self.config.startup_delay).await;

        let outcome = match self.scrape(page, sink).await {
            Ok(records) => ScrapeOutcome::Transactions(records),
            Err(err) => {
                tracing::debug!(error = ?err, "scrape aborted");
                ScrapeOutcome::Error(err.to_string())
            }
        };
        sink.report(outcome.clone());

        self.log_out(page).await;
        outcome
    }

    /// Send the page to the logout path and wait, up to `logout_timeout`, for
    /// it to load. Failures are only logged.
    async fn log_out(&self, page: &dyn Page) {
        let pages = &self.config.pages;
        let logout = &pages.logout_path;
        if let Err(err) = page.navigate(logout).await {
            tracing::warn!(error = %err, %logout, "failed to navigate away after scrape");
            return;
        }

        tokio::select! {
            biased;
            loaded = page.wait_for_navigation() => match loaded {
                Ok(()) => tracing::debug!(%logout, "logout page loaded"),
                Err(err) => tracing::warn!(error = %err, %logout, "logout page failed to load"),
            },
            _ = self.sleeper.sleep(pages.logout_timeout) => {
                tracing::warn!(timeout = ?pages.logout_timeout, %logout, "logout page did not load in time");
            }
        }
    }

    async fn scrape(
        &self,
        page: &dyn Page,
        sink: &dyn ResultSink,
    ) -> Result<Vec<TransactionRecord>, ScrapeError> {
        sink.log(json!("main()"));

        let expected = &self.config.pages.history_url;
        let actual = page.location().await?;
        if &actual != expected {
            return Err(ScrapeError::WrongLocation {
                expected: expected.clone(),
                actual,
            });
        }

        show_saldo(page, &self.config, self.sleeper.as_ref()).await?;
        scrape_latest_transactions(page, &self.config, self.sleeper.as_ref(), sink).await
    }
}
