//! Capabilities a scrape run is given by whoever drives it.

use std::sync::Mutex;

use crate::models::ScrapeOutcome;

/// Where a run delivers its single outcome and its diagnostics.
pub trait ResultSink: Send + Sync {
    /// Called exactly once per run.
    fn report(&self, outcome: ScrapeOutcome);

    /// Free-form diagnostic values, at informal checkpoints.
    fn log(&self, value: serde_json::Value);
}

/// Collects everything it is given. Meant for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<ScrapeOutcome>>,
    logs: Mutex<Vec<serde_json::Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ScrapeOutcome> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<serde_json::Value> {
        self.logs.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ResultSink for MemorySink {
    fn report(&self, outcome: ScrapeOutcome) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(outcome);
        }
    }

    fn log(&self, value: serde_json::Value) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(value);
        }
    }
}

/// Sends diagnostics to `tracing` and keeps the outcome for the caller.
#[derive(Debug, Default)]
pub struct TracingSink {
    outcome: Mutex<Option<ScrapeOutcome>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reported outcome, if any. Subsequent calls return `None`.
    pub fn take_outcome(&self) -> Option<ScrapeOutcome> {
        self.outcome.lock().ok().and_then(|mut o| o.take())
    }
}

impl ResultSink for TracingSink {
    fn report(&self, outcome: ScrapeOutcome) {
        match &outcome {
            ScrapeOutcome::Transactions(records) => {
                tracing::info!(records = records.len(), "scrape finished")
            }
            ScrapeOutcome::Error(message) => tracing::warn!(%message, "scrape failed"),
        }
        if let Ok(mut slot) = self.outcome.lock() {
            if slot.is_some() {
                tracing::warn!("outcome reported more than once; keeping the latest");
            }
            *slot = Some(outcome);
        }
    }

    fn log(&self, value: serde_json::Value) {
        tracing::debug!(target: "mbank_history::page", %value, "page log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tracing_sink_hands_outcome_over_once() {
        let sink = TracingSink::new();
        sink.log(json!("main()"));
        sink.report(ScrapeOutcome::Error("boom".to_string()));

        assert_eq!(
            sink.take_outcome(),
            Some(ScrapeOutcome::Error("boom".to_string()))
        );
        assert_eq!(sink.take_outcome(), None);
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.log(json!(1));
        sink.log(json!("two"));
        sink.report(ScrapeOutcome::Transactions(Vec::new()));

        assert_eq!(sink.logs(), vec![json!(1), json!("two")]);
        assert_eq!(sink.reports().len(), 1);
    }
}
