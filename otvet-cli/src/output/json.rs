//! JSON output formatting.
//!
//! The domain models serialize cleanly, so there are no separate output
//! shapes here; commands hand whatever they fetched to [`JsonFormatter`].

use anyhow::Result;
use serde::Serialize;

/// JSON formatter with optional pretty printing.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serializes a value to a JSON string.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(out)
    }
}
