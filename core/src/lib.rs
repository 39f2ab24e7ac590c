//! Core kernel for the mesh telemetry monitor.
//!
//! The crate owns the refresh scheduling policy, the radio-horizon viewshed
//! model and the plain-data node cards handed to whatever renders them.
//! Fetching and drawing stay behind the [`TelemetrySource`] and
//! [`RenderSink`] traits.

pub mod cards;
pub mod payload;
pub mod prelude;
pub mod scheduler;
pub mod telemetry;
pub mod viewshed;

pub use prelude::{
    FetchQuery, RefreshConfig, RenderSink, TelemetryError, TelemetryResult, TelemetrySource,
};
pub use scheduler::RefreshScheduler;
pub use viewshed::{compute_radius, ViewshedLimits, ViewshedResult};
