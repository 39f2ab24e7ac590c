use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Connection indicator shown next to the node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle phase: `Idle -> Fetching -> Idle`, or via `Error` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerPhase {
    Idle,
    Fetching,
    Error,
}

/// Summary emitted after every completed fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: ConnectionStatus,
    pub node_count: usize,
    pub last_update: DateTime<Utc>,
}

impl StatusReport {
    pub fn connected(node_count: usize) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            node_count,
            last_update: Utc::now(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: ConnectionStatus::Error,
            node_count: 0,
            last_update: Utc::now(),
        }
    }
}
