//! Configuration types and loading logic.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use podtrack_tracing::TracingConfig;
use serde::Deserialize;

/// Top-level service configuration. Resolved once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pod: PodConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Deployment metadata injected by the hosting platform.
///
/// In Kubernetes these come from the downward API (`POD_NAME`,
/// `POD_NAMESPACE`, `POD_IP`) and the deployment manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PodConfig {
    #[serde(default = "default_pod_name")]
    pub name: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_unknown")]
    pub ip: String,

    #[serde(default = "default_deployment")]
    pub deployment: String,
}

/// In-memory activity log settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Maximum number of entries retained; oldest are dropped first.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Which sink receives a copy of each ingested entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    None,
    Tracing,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,
}

fn default_listen_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_pod_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "local".to_string())
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_unknown() -> String {
    "unknown".to_string()
}

fn default_deployment() -> String {
    "podtrack".to_string()
}

fn default_capacity() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl Default for PodConfig {
    fn default() -> Self {
        Self {
            name: default_pod_name(),
            namespace: default_namespace(),
            ip: default_unknown(),
            deployment: default_deployment(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Downward-API variables and the config keys they override.
const POD_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("POD_NAME", "pod.name"),
    ("POD_NAMESPACE", "pod.namespace"),
    ("POD_IP", "pod.ip"),
    ("DEPLOYMENT_NAME", "pod.deployment"),
];

impl AppConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Kubernetes downward-API variables (POD_NAME, POD_NAMESPACE, POD_IP, DEPLOYMENT_NAME)
    /// 2. Environment variables (PODTRACK_ prefix, __ for nesting)
    /// 3. TOML config file
    /// 4. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PODTRACK_").split("__"));

        for (var, key) in POD_ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        Self::from_figment(figment)
    }

    /// Extract and validate a config from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.logs.capacity == 0 {
            anyhow::bail!("logs.capacity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> anyhow::Result<AppConfig> {
        AppConfig::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.server.listen_address, "0.0.0.0:3000");
        assert_eq!(config.logs.capacity, 100);
        assert_eq!(config.sink.kind, SinkKind::None);
        assert_eq!(config.pod.namespace, "default");
        assert_eq!(config.pod.ip, "unknown");
        assert!(config.tracing.otlp_endpoint.is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = from_toml(
            r#"
            [server]
            listen_address = "127.0.0.1:8080"

            [pod]
            name = "tiles-7d9f"
            namespace = "demo"
            ip = "10.1.2.3"

            [logs]
            capacity = 25

            [sink]
            kind = "tracing"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_address, "127.0.0.1:8080");
        assert_eq!(config.pod.name, "tiles-7d9f");
        assert_eq!(config.pod.namespace, "demo");
        assert_eq!(config.pod.ip, "10.1.2.3");
        assert_eq!(config.pod.deployment, "podtrack");
        assert_eq!(config.logs.capacity, 25);
        assert_eq!(config.sink.kind, SinkKind::Tracing);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = from_toml("[logs]\ncapacity = 0").unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_downward_api_value_overrides_toml() {
        let figment = Figment::new()
            .merge(Toml::string("[pod]\nname = \"from-file\""))
            .merge(Serialized::default("pod.name", "from-env"));
        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.pod.name, "from-env");
    }

    #[test]
    fn test_load_precedence() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "podtrack.toml",
                r#"
                [pod]
                name = "from-file"
                namespace = "file-ns"

                [logs]
                capacity = 50
                "#,
            )?;
            jail.set_env("PODTRACK_POD__NAME", "from-prefixed");
            jail.set_env("PODTRACK_POD__IP", "10.9.9.9");
            jail.set_env("PODTRACK_LOGS__CAPACITY", "7");
            jail.set_env("POD_NAME", "from-downward");
            jail.set_env("DEPLOYMENT_NAME", "tiles");

            let config = AppConfig::load("podtrack.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.pod.name, "from-downward");
            assert_eq!(config.pod.namespace, "file-ns");
            assert_eq!(config.pod.ip, "10.9.9.9");
            assert_eq!(config.pod.deployment, "tiles");
            assert_eq!(config.logs.capacity, 7);
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("POD_NAMESPACE", "demo");

            let config = AppConfig::load("absent.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.server.listen_address, "0.0.0.0:3000");
            assert_eq!(config.logs.capacity, 100);
            assert_eq!(config.sink.kind, SinkKind::None);
            assert_eq!(config.pod.namespace, "demo");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_zero_capacity_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PODTRACK_LOGS__CAPACITY", "0");
            assert!(AppConfig::load("absent.toml").is_err());
            Ok(())
        });
    }

    #[test]
    fn test_unknown_sink_kind_rejected() {
        assert!(from_toml("[sink]\nkind = \"kafka\"").is_err());
    }
}
