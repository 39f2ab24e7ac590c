use crate::cards::format::{format_uptime, format_value, time_ago};
use crate::payload::{DeviceMetrics, EnvironmentMetrics, TelemetryNode};
use crate::viewshed::ViewshedLimits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLine {
    pub label: String,
    pub value: String,
}

impl MetricLine {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSection {
    pub title: String,
    pub lines: Vec<MetricLine>,
}

/// Circle the map layer draws around a positioned node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewshedOverlay {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

/// Display-ready summary of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCard {
    pub node_id: String,
    pub age: String,
    pub sections: Vec<MetricSection>,
    pub viewshed: Option<ViewshedOverlay>,
}

impl NodeCard {
    pub fn build(node: &TelemetryNode, limits: &ViewshedLimits, now: DateTime<Utc>) -> Self {
        let sections = [
            node.device_metrics.as_ref().and_then(device_section),
            node.environment_metrics.as_ref().and_then(environment_section),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Missing altitude feeds the model's default-height fallback.
        let viewshed = node.valid_position().map(|position| ViewshedOverlay {
            latitude: position.latitude,
            longitude: position.longitude,
            radius_meters: limits
                .radius_for(position.altitude_meters.unwrap_or(f64::NAN))
                .radius_meters,
        });

        Self {
            node_id: node.node_id.clone(),
            age: time_ago(node.timestamp, now),
            sections,
            viewshed,
        }
    }
}

pub fn build_cards(
    nodes: &[TelemetryNode],
    limits: &ViewshedLimits,
    now: DateTime<Utc>,
) -> Vec<NodeCard> {
    nodes
        .iter()
        .map(|node| NodeCard::build(node, limits, now))
        .collect()
}

fn section(title: &str, lines: Vec<MetricLine>) -> Option<MetricSection> {
    if lines.is_empty() {
        None
    } else {
        Some(MetricSection {
            title: title.to_string(),
            lines,
        })
    }
}

fn device_section(metrics: &DeviceMetrics) -> Option<MetricSection> {
    let lines = [
        metrics
            .battery_level
            .map(|v| MetricLine::new("Battery", format_value(v, 0, "%"))),
        metrics
            .voltage
            .map(|v| MetricLine::new("Voltage", format_value(v, 2, "V"))),
        metrics
            .channel_utilization
            .map(|v| MetricLine::new("Channel Util", format_value(v, 1, "%"))),
        metrics
            .air_util_tx
            .map(|v| MetricLine::new("Air Util TX", format_value(v, 1, "%"))),
        metrics
            .uptime_seconds
            .map(|v| MetricLine::new("Uptime", format_uptime(v))),
    ];
    section("Device Metrics", lines.into_iter().flatten().collect())
}

fn environment_section(metrics: &EnvironmentMetrics) -> Option<MetricSection> {
    let lines = [
        metrics
            .temperature
            .map(|v| MetricLine::new("Temperature", format_value(v, 1, "°C"))),
        metrics
            .relative_humidity
            .map(|v| MetricLine::new("Humidity", format_value(v, 1, "%"))),
        metrics
            .barometric_pressure
            .map(|v| MetricLine::new("Pressure", format_value(v, 2, " hPa"))),
    ];
    section("Environment Metrics", lines.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::NodePosition;
    use chrono::Duration;

    fn node(position: Option<NodePosition>) -> TelemetryNode {
        TelemetryNode {
            node_id: "!deadbeef".into(),
            timestamp: Utc::now() - Duration::minutes(5),
            device_metrics: Some(DeviceMetrics {
                battery_level: Some(91.0),
                voltage: Some(4.1),
                uptime_seconds: Some(3_900),
                ..Default::default()
            }),
            environment_metrics: Some(EnvironmentMetrics::default()),
            position,
        }
    }

    #[test]
    fn card_lists_present_metrics_and_skips_empty_sections() {
        let card = NodeCard::build(&node(None), &ViewshedLimits::default(), Utc::now());
        assert_eq!(card.age, "5m ago");
        assert_eq!(card.sections.len(), 1);
        let values: Vec<_> = card.sections[0]
            .lines
            .iter()
            .map(|line| format!("{}={}", line.label, line.value))
            .collect();
        assert_eq!(values, ["Battery=91%", "Voltage=4.10V", "Uptime=1h 5m"]);
        assert!(card.viewshed.is_none());
    }

    #[test]
    fn positioned_node_gets_capped_overlay() {
        let position = NodePosition {
            latitude: 47.6,
            longitude: -122.3,
            altitude_meters: Some(1.7),
        };
        let limits = ViewshedLimits::with_user_limit(5.0);
        let card = NodeCard::build(&node(Some(position)), &limits, Utc::now());
        let overlay = card.viewshed.unwrap();
        assert_eq!(overlay.radius_meters, 5000.0);
        assert_eq!(overlay.latitude, 47.6);
    }

    #[test]
    fn missing_altitude_uses_default_height() {
        let position = NodePosition {
            latitude: 47.6,
            longitude: -122.3,
            altitude_meters: None,
        };
        let limits = ViewshedLimits::default();
        let cards = build_cards(&[node(Some(position))], &limits, Utc::now());
        let radius = cards[0].viewshed.unwrap().radius_meters;
        assert_eq!(radius, limits.radius_for(1.7).radius_meters);
    }
}
