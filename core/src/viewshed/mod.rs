pub mod horizon;

pub use horizon::{compute_radius, ViewshedLimits, ViewshedResult};
