pub mod format;
pub mod node_card;

pub use format::{format_uptime, time_ago};
pub use node_card::{build_cards, MetricLine, MetricSection, NodeCard, ViewshedOverlay};
