//! Append-only record of the failures seen during a run.

/// Ordered record of failure messages.
///
/// Once non-empty, publication is skipped and the run exits with status 1.
/// There is deliberately no way to remove an entry.
#[derive(Debug, Default, Clone)]
pub struct ErrorLedger {
    entries: Vec<String>,
}

impl ErrorLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure message.
    pub fn record(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// True while nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first recorded failure, used as the notification headline.
    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates failures in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
