//! podtrack: pod identity and activity log backend for visualizing how a
//! Kubernetes service spreads requests across replicas.

mod config;
mod entry;
mod error;
mod identity;
mod report;
mod server;
mod sink;
mod store;

use config::AppConfig;
use server::AppState;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("PODTRACK_CONFIG").ok())
        .unwrap_or_else(|| "podtrack.toml".to_string());

    let listen_override = args
        .iter()
        .position(|a| a == "--listen")
        .and_then(|i| args.get(i + 1).cloned());

    // Load configuration
    let mut config = AppConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if let Some(addr) = listen_override {
        config.server.listen_address = addr;
    }

    // Build the tokio runtime first — the tonic gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = podtrack_tracing::init_tracing(&config.tracing);

        let state = AppState::new(config);

        tracing::info!(
            config_path = %config_path,
            listen_address = %state.config.server.listen_address,
            pod_guid = %state.identity.id(),
            pod_name = %state.config.pod.name,
            namespace = %state.config.pod.namespace,
            log_capacity = state.config.logs.capacity,
            sink = state.sink.name(),
            otlp_export = tracing_guard.exporting(),
            "Starting podtrack"
        );

        server::run(state).await
    })
}
