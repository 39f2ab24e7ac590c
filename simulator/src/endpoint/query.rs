use meshcore::prelude::{DEFAULT_MAX_NODES, DEFAULT_TIME_RANGE_HOURS};
use meshcore::FetchQuery;
use serde::Deserialize;

/// Query string of `GET /api/telemetry`; absent or zero values use defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TelemetryQuery {
    pub hours: Option<u32>,
    pub limit: Option<u32>,
}

impl TelemetryQuery {
    pub fn resolve(&self) -> FetchQuery {
        FetchQuery {
            hours: self
                .hours
                .filter(|hours| *hours > 0)
                .unwrap_or(DEFAULT_TIME_RANGE_HOURS),
            limit: self
                .limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_MAX_NODES),
        }
    }
}
