pub mod node;
pub mod response;

pub use node::{DeviceMetrics, EnvironmentMetrics, NodePosition, TelemetryNode};
pub use response::TelemetryPayload;
