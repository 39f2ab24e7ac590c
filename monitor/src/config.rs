use anyhow::Context;
use meshcore::RefreshConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the monitor needs before it starts polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Base URL of the telemetry service; requests go to `{endpoint}/api/telemetry`.
    pub endpoint: Option<String>,
    pub title: String,
    pub refresh: RefreshConfig,
    pub viewshed_limit_km: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            title: "Mesh Telemetry".into(),
            refresh: RefreshConfig::default(),
            viewshed_limit_km: 100.0,
        }
    }
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        config
            .refresh
            .validate()
            .with_context(|| format!("validating monitor config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        endpoint: Option<String>,
        refresh: RefreshConfig,
        viewshed_limit_km: f64,
    ) -> Self {
        Self {
            endpoint,
            refresh,
            viewshed_limit_km,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_load_reads_nested_refresh_settings() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"endpoint: http://localhost:8787\nrefresh:\n  interval_seconds: 30\n  time_range_hours: 6\nviewshed_limit_km: 25\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = MonitorConfig::load(&path).unwrap();
        assert_eq!(cfg.endpoint.as_deref(), Some("http://localhost:8787"));
        assert_eq!(cfg.refresh.interval_seconds, 30);
        assert_eq!(cfg.refresh.time_range_hours, 6);
        assert_eq!(cfg.refresh.max_nodes, 20);
        assert_eq!(cfg.viewshed_limit_km, 25.0);
        assert_eq!(cfg.title, "Mesh Telemetry");
    }

    #[test]
    fn config_load_rejects_zero_node_limit() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"refresh:\n  max_nodes: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(MonitorConfig::load(&path).is_err());
    }
}
