//! Instrument type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique identifier for a tradable instrument (typically a ticker).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    /// Create a new instrument identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InstrumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for InstrumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a list of instrument identifiers from string-like values.
#[must_use]
pub fn instrument_ids<I, S>(ids: I) -> Vec<InstrumentId>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(InstrumentId::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_from_str() {
        let id: InstrumentId = "AAPL".into();
        assert_eq!(id.as_str(), "AAPL");
        assert_eq!(id.to_string(), "AAPL");
    }

    #[test]
    fn instrument_ids_preserve_order() {
        let ids = instrument_ids(["MSFT", "AAPL", "GOOG"]);
        assert_eq!(ids[0].as_str(), "MSFT");
        assert_eq!(ids[2].as_str(), "GOOG");
    }
}
