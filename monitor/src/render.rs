use chrono::Local;
use log::{debug, warn};
use meshcore::cards::NodeCard;
use meshcore::scheduler::StatusReport;
use meshcore::RenderSink;

/// Render collaborator that prints cards and status lines to the terminal.
pub struct ConsoleRenderer {
    title: String,
}

impl ConsoleRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn banner(&self) -> String {
        format!("=== {} ===", self.title)
    }
}

impl RenderSink for ConsoleRenderer {
    fn show_loading(&self, loading: bool) {
        if loading {
            debug!("Loading telemetry data...");
        }
    }

    fn show_error(&self, message: &str) {
        warn!("{message}");
        println!("Error: {message}");
    }

    fn clear_error(&self) {}

    fn render_nodes(&self, cards: &[NodeCard]) {
        println!("{}", self.banner());
        if cards.is_empty() {
            println!("No telemetry data available. Waiting for mesh nodes to report...");
            return;
        }
        for card in cards {
            println!("{}", format_card(card));
        }
    }

    fn render_status(&self, report: &StatusReport) {
        println!("{}", format_status(report));
    }
}

pub fn format_status(report: &StatusReport) -> String {
    format!(
        "[{}] active nodes: {} | last update: {}",
        report.status,
        report.node_count,
        report.last_update.with_timezone(&Local).format("%H:%M:%S")
    )
}

pub fn format_card(card: &NodeCard) -> String {
    let mut lines = vec![format!("-- {} ({})", card.node_id, card.age)];
    for section in &card.sections {
        let metrics = section
            .lines
            .iter()
            .map(|line| format!("{} {}", line.label, line.value))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(format!("   {}: {}", section.title, metrics));
    }
    if let Some(overlay) = &card.viewshed {
        lines.push(format!(
            "   Viewshed: {:.5}, {:.5} radius {:.1} km",
            overlay.latitude,
            overlay.longitude,
            overlay.radius_meters / 1000.0
        ));
    }
    lines.join("\n")
}
