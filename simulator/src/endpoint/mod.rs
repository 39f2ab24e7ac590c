pub mod bridge;
pub mod query;
