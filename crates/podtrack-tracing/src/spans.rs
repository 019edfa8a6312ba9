//! Span builder helpers for podtrack instrumentation.

/// Create a tracing span for an API request.
///
/// Usage: `let _span = api_request_span!(route, pod_guid).entered();`
#[macro_export]
macro_rules! api_request_span {
    ($route:expr, $pod_guid:expr) => {
        tracing::info_span!(
            "api_request",
            route = %$route,
            pod_guid = %$pod_guid,
        )
    };
}

/// Create a tracing span for a log ingestion.
///
/// `request_number` and `log_id` are recorded once the entry is stored.
#[macro_export]
macro_rules! ingest_span {
    ($pod_guid:expr, $client_guid:expr) => {
        tracing::info_span!(
            "ingest_log",
            pod_guid = %$pod_guid,
            client_guid = %$client_guid,
            request_number = tracing::field::Empty,
            log_id = tracing::field::Empty,
        )
    };
}
