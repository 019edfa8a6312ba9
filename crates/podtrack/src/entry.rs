//! Activity log entries and their rendered line format.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A validated click/activity event as received from the tile UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub action: String,
    /// Client-side session identifier.
    pub guid: String,
    pub details: String,
    /// Client-side timestamp, kept verbatim.
    pub timestamp: String,
    pub pod_name: Option<String>,
}

/// One stored log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub server_timestamp: DateTime<Utc>,
    pub pod_name: String,
    pub pod_guid: Uuid,
    pub action: String,
    pub details: String,
    pub request_number: u64,
    pub client_guid: String,
    pub client_timestamp: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Pod: {} | GUID: {} | Action: {} | Details: {} | Request #{}",
            self.server_timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            SingleLine(&self.pod_name),
            self.pod_guid,
            SingleLine(&self.action),
            SingleLine(&self.details),
            self.request_number,
        )
    }
}

/// Writes a client-supplied field with line breaks and other control
/// characters escaped, so an entry always renders as exactly one line.
struct SingleLine<'a>(&'a str);

impl fmt::Display for SingleLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c.is_control() {
                write!(f, "{}", c.escape_default())?;
            } else {
                fmt::Write::write_char(f, c)?;
            }
        }
        Ok(())
    }
}

/// Rewrite a rendered line for the data report: field separators become dashes.
pub fn sanitize_line(line: &str) -> String {
    line.replace('|', "-")
}
