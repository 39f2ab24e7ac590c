use crate::cards::NodeCard;
use crate::payload::TelemetryPayload;
use crate::scheduler::StatusReport;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_TIME_RANGE_HOURS: u32 = 24;
pub const DEFAULT_MAX_NODES: u32 = 20;

/// Polling parameters. Replaced wholesale whenever a control changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Timer period; zero means manual refresh only.
    pub interval_seconds: u64,
    pub time_range_hours: u32,
    pub max_nodes: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            time_range_hours: DEFAULT_TIME_RANGE_HOURS,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl RefreshConfig {
    pub fn new(interval_seconds: u64, time_range_hours: u32, max_nodes: u32) -> ConfigResult<Self> {
        let config = Self {
            interval_seconds,
            time_range_hours,
            max_nodes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.time_range_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "time_range_hours",
                reason: "must be positive".into(),
            });
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_nodes",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn with_interval(self, interval_seconds: u64) -> Self {
        Self {
            interval_seconds,
            ..self
        }
    }

    pub fn query(&self) -> FetchQuery {
        FetchQuery {
            hours: self.time_range_hours,
            limit: self.max_nodes,
        }
    }
}

/// Arguments passed to the fetch collaborator for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub hours: u32,
    pub limit: u32,
}

/// Rejected configuration values.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures of a single fetch cycle. None of them outlive the cycle.
#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("data source endpoint not configured")]
    NotConfigured,
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

pub type FetchFuture = Pin<Box<dyn Future<Output = TelemetryResult<TelemetryPayload>> + Send>>;

/// Fetch collaborator: produces one telemetry payload per call.
pub trait TelemetrySource: Send + Sync + 'static {
    /// Whether an endpoint is known at all. Unconfigured sources are never called.
    fn is_configured(&self) -> bool {
        true
    }

    fn fetch(&self, query: FetchQuery) -> FetchFuture;
}

/// Render collaborator consuming the kernel's output.
pub trait RenderSink: Send + Sync + 'static {
    fn show_loading(&self, loading: bool);
    fn show_error(&self, message: &str);
    fn clear_error(&self);
    /// Receives every node card of a successful cycle; may be empty.
    fn render_nodes(&self, cards: &[NodeCard]);
    fn render_status(&self, report: &StatusReport);
}
