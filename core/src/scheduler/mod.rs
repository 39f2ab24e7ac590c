pub mod guard;
pub mod refresh;
pub mod status;

pub use guard::FetchState;
pub use refresh::{RefreshScheduler, TickOutcome};
pub use status::{ConnectionStatus, SchedulerPhase, StatusReport};
