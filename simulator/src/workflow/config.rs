use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Settings for the synthetic telemetry endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    pub node_count: usize,
    pub seed: u64,
    /// Fraction of requests answered with HTTP 503.
    pub failure_rate: f64,
    /// Fraction of nodes that report a GPS fix.
    pub positioned_ratio: f64,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub spread_km: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            node_count: 12,
            seed: 0,
            failure_rate: 0.0,
            positioned_ratio: 0.75,
            center_latitude: 52.37,
            center_longitude: 4.89,
            spread_km: 25.0,
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, node_count: usize, seed: u64, failure_rate: f64) -> Self {
        Self {
            bind,
            node_count,
            seed,
            failure_rate,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.failure_rate),
            "failure_rate must be within [0, 1], got {}",
            self.failure_rate
        );
        ensure!(
            (0.0..=1.0).contains(&self.positioned_ratio),
            "positioned_ratio must be within [0, 1], got {}",
            self.positioned_ratio
        );
        ensure!(
            self.spread_km.is_finite() && self.spread_km >= 0.0,
            "spread_km must be a non-negative distance"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_generator_defaults() {
        let bind = SocketAddr::from(([0, 0, 0, 0], 9000));
        let cfg = SimulatorConfig::from_args(bind, 4, 7, 0.25);
        assert_eq!(cfg.node_count, 4);
        assert_eq!(cfg.positioned_ratio, 0.75);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"bind: 127.0.0.1:9100\nnode_count: 3\nfailure_rate: 0.5\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = SimulatorConfig::load(&path).unwrap();
        assert_eq!(cfg.node_count, 3);
        assert_eq!(cfg.bind.port(), 9100);
        assert_eq!(cfg.seed, 0);
    }

    #[test]
    fn config_load_rejects_bad_failure_rate() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"failure_rate: 1.5\n").unwrap();
        let path = temp.into_temp_path();
        assert!(SimulatorConfig::load(&path).is_err());
    }
}
