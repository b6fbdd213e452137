//! Values handed across the result-sink boundary.

use serde::{Deserialize, Serialize};

/// Prefix that marks a reported outcome as a failure.
pub const ERROR_MARKER: &str = "Error: ";

/// One row of the history table, exactly as rendered.
///
/// Serialized as a four-element array `[date, description, amount, balance]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[String; 4]", from = "[String; 4]")]
pub struct TransactionRecord {
    /// e.g. "28.10.2019"
    pub date: String,
    pub description: String,
    /// Signed, with currency, e.g. "-15,00 PLN"
    pub amount: String,
    /// Running balance after the transaction, e.g. "1 949,00 PLN"
    pub balance: String,
}

impl TransactionRecord {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
        balance: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
            balance: balance.into(),
        }
    }
}

impl From<TransactionRecord> for [String; 4] {
    fn from(record: TransactionRecord) -> Self {
        [
            record.date,
            record.description,
            record.amount,
            record.balance,
        ]
    }
}

impl From<[String; 4]> for TransactionRecord {
    fn from([date, description, amount, balance]: [String; 4]) -> Self {
        Self {
            date,
            description,
            amount,
            balance,
        }
    }
}

/// Result of a scrape run: either every record or a failure message.
///
/// On the wire the failure is a bare string starting with [`ERROR_MARKER`],
/// so a consumer tells the two apart by that prefix alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireOutcome", try_from = "WireOutcome")]
pub enum ScrapeOutcome {
    Transactions(Vec<TransactionRecord>),
    /// Failure message, without the marker.
    Error(String),
}

impl ScrapeOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn transactions(&self) -> Option<&[TransactionRecord]> {
        match self {
            Self::Transactions(records) => Some(records),
            Self::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Transactions(_) => None,
            Self::Error(message) => Some(message),
        }
    }

    /// The value a result sink receives.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Parse a value produced by [`ScrapeOutcome::to_wire`].
    pub fn from_wire(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireOutcome {
    Transactions(Vec<TransactionRecord>),
    Message(String),
}

impl From<ScrapeOutcome> for WireOutcome {
    fn from(outcome: ScrapeOutcome) -> Self {
        match outcome {
            ScrapeOutcome::Transactions(records) => Self::Transactions(records),
            ScrapeOutcome::Error(message) => Self::Message(format!("{ERROR_MARKER}{message}")),
        }
    }
}

impl TryFrom<WireOutcome> for ScrapeOutcome {
    type Error = String;

    fn try_from(wire: WireOutcome) -> Result<Self, String> {
        match wire {
            WireOutcome::Transactions(records) => Ok(ScrapeOutcome::Transactions(records)),
            WireOutcome::Message(message) => match message.strip_prefix(ERROR_MARKER) {
                Some(rest) => Ok(ScrapeOutcome::Error(rest.to_string())),
                None => Err(format!(
                    "outcome string does not start with {ERROR_MARKER:?}: {message:?}"
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_is_a_four_string_array() {
        let record = TransactionRecord::new("28.10.2019", "TITLE", "-15,00 PLN", "1 949,00 PLN");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!(["28.10.2019", "TITLE", "-15,00 PLN", "1 949,00 PLN"])
        );
    }

    #[test]
    fn test_error_outcome_carries_marker() {
        let outcome = ScrapeOutcome::Error("Could not find the saldo button.".to_string());
        assert_eq!(
            outcome.to_wire(),
            json!("Error: Could not find the saldo button.")
        );
    }

    #[test]
    fn test_from_wire_tells_variants_apart() {
        let ok = ScrapeOutcome::from_wire(json!([["1.01.2020", "A", "1,00 PLN", "2,00 PLN"]]))
            .unwrap();
        assert_eq!(ok.transactions().map(<[_]>::len), Some(1));

        let empty = ScrapeOutcome::from_wire(json!([])).unwrap();
        assert_eq!(empty, ScrapeOutcome::Transactions(Vec::new()));

        let err = ScrapeOutcome::from_wire(json!("Error: boom")).unwrap();
        assert_eq!(err.error_message(), Some("boom"));
    }

    #[test]
    fn test_from_wire_rejects_unmarked_string() {
        assert!(ScrapeOutcome::from_wire(json!("boom")).is_err());
        assert!(ScrapeOutcome::from_wire(json!([["too", "short"]])).is_err());
    }
}
