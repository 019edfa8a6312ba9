//! Forwarding of ingested entries to an external sink (e.g. a message bus).
//!
//! Publishing is best-effort: a failing sink is logged and never affects the
//! ingestion response.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SinkKind;
use crate::entry::LogEntry;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing transport (e.g. a message-bus client) could not accept the
    /// entry. The built-in sinks never fail; this is for external backends.
    #[allow(dead_code)]
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives a copy of every stored entry.
pub trait LogSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn publish(&self, entry: &LogEntry) -> Result<(), SinkError>;
}

/// Discards everything.
pub struct NoopSink;

impl LogSink for NoopSink {
    fn name(&self) -> &'static str {
        "none"
    }

    fn publish(&self, _entry: &LogEntry) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Emits each entry as a structured event on the `podtrack::sink` target.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn publish(&self, entry: &LogEntry) -> Result<(), SinkError> {
        tracing::info!(
            target: "podtrack::sink",
            pod_guid = %entry.pod_guid,
            pod_name = %entry.pod_name,
            action = %entry.action,
            details = %entry.details,
            request_number = entry.request_number,
            client_guid = %entry.client_guid,
            client_timestamp = %entry.client_timestamp,
            "activity published"
        );
        Ok(())
    }
}

/// Build the sink selected in configuration.
pub fn from_kind(kind: SinkKind) -> Arc<dyn LogSink> {
    match kind {
        SinkKind::None => Arc::new(NoopSink),
        SinkKind::Tracing => Arc::new(TracingSink),
    }
}

/// Publish to `sink`, logging instead of propagating failures.
pub fn publish_best_effort(sink: &dyn LogSink, entry: &LogEntry) {
    if let Err(e) = sink.publish(entry) {
        tracing::warn!(
            sink = sink.name(),
            request_number = entry.request_number,
            error = %e,
            "Failed to publish log entry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    /// Records published request numbers; fails when `fail` is set.
    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<u64>>,
        fail: bool,
    }

    impl LogSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn publish(&self, entry: &LogEntry) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Unavailable("bus offline".to_string()));
            }
            self.published.lock().unwrap().push(entry.request_number);
            Ok(())
        }
    }

    fn entry() -> LogEntry {
        LogEntry {
            server_timestamp: Utc::now(),
            pod_name: "pod-a".to_string(),
            pod_guid: Uuid::new_v4(),
            action: "tile_click".to_string(),
            details: "d".to_string(),
            request_number: 3,
            client_guid: "g".to_string(),
            client_timestamp: "t".to_string(),
        }
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(from_kind(SinkKind::None).name(), "none");
        assert_eq!(from_kind(SinkKind::Tracing).name(), "tracing");
    }

    #[test]
    fn test_builtin_sinks_accept_entries() {
        assert!(NoopSink.publish(&entry()).is_ok());
        assert!(TracingSink.publish(&entry()).is_ok());
    }

    #[test]
    fn test_best_effort_delivers() {
        let sink = RecordingSink::default();
        publish_best_effort(&sink, &entry());
        assert_eq!(*sink.published.lock().unwrap(), vec![3]);
    }

    #[test]
    fn test_best_effort_swallows_failure() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        publish_best_effort(&sink, &entry());
        assert!(sink.published.lock().unwrap().is_empty());
    }
}
