use crate::payload::node::TelemetryNode;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body returned by the telemetry endpoint.
///
/// A missing or `null` `nodes` field means the endpoint has nothing to report.
/// Entries that do not decode as a node are dropped; the rest still render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    #[serde(default, deserialize_with = "deserialize_nodes")]
    pub nodes: Option<Vec<TelemetryNode>>,
}

impl TelemetryPayload {
    pub fn new(nodes: Vec<TelemetryNode>) -> Self {
        Self { nodes: Some(nodes) }
    }

    pub fn nodes(&self) -> &[TelemetryNode] {
        self.nodes.as_deref().unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }
}

fn deserialize_nodes<'de, D>(deserializer: D) -> Result<Option<Vec<TelemetryNode>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(entries) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let nodes = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(node) => Some(node),
            Err(err) => {
                warn!("skipping telemetry node #{index}: {err}");
                None
            }
        })
        .collect();
    Ok(Some(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_null_nodes_means_no_data() {
        let missing: TelemetryPayload = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        let null: TelemetryPayload = serde_json::from_str(r#"{"nodes": null}"#).unwrap();
        assert_eq!(missing.node_count(), 0);
        assert_eq!(null.node_count(), 0);
    }

    #[test]
    fn nodes_are_exposed_in_order() {
        let payload: TelemetryPayload = serde_json::from_str(
            r#"{"nodes": [
                {"node_id": "a", "timestamp": "2024-05-01T12:00:00Z"},
                {"node_id": "b", "timestamp": "2024-05-01T11:00:00Z"}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<_> = payload.nodes().iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn undecodable_nodes_are_skipped_not_fatal() {
        let payload: TelemetryPayload = serde_json::from_str(
            r#"{"nodes": [
                {"node_id": "sqlite", "timestamp": "2024-05-01 12:00:00",
                 "device_metrics": {"uptimeSeconds": 7260.0}},
                {"node_id": "no-time", "timestamp": null},
                {"timestamp": "2024-05-01T12:00:00Z"},
                "garbage",
                {"node_id": "ok", "timestamp": "2024-05-01T11:00:00Z"}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<_> = payload.nodes().iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["sqlite", "ok"]);
        let uptime = payload.nodes()[0]
            .device_metrics
            .as_ref()
            .and_then(|metrics| metrics.uptime_seconds);
        assert_eq!(uptime, Some(7260));
    }
}
