use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// GPS fix reported by a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "altitude", skip_serializing_if = "Option::is_none")]
    pub altitude_meters: Option<f64>,
}

impl NodePosition {
    /// Finite, in range, and not the `(0, 0)` placeholder firmware sends without a fix.
    pub fn is_valid(&self) -> bool {
        let finite = self.latitude.is_finite() && self.longitude.is_finite();
        finite
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub channel_utilization: Option<f64>,
    #[serde(default)]
    pub air_util_tx: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_whole_seconds")]
    pub uptime_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMetrics {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub barometric_pressure: Option<f64>,
}

/// One node entry of a telemetry response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryNode {
    pub node_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_metrics: Option<DeviceMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_metrics: Option<EnvironmentMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<NodePosition>,
}

impl TelemetryNode {
    pub fn valid_position(&self) -> Option<&NodePosition> {
        self.position.as_ref().filter(|position| position.is_valid())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Zone-less layouts, read as UTC. SQLite's `datetime()` emits the first.
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Accepts RFC 3339 text, zone-less UTC text, or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {millis}"))),
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp `{text}`"))),
    }
}

/// Any JSON number, floored to whole seconds. Negative or non-finite values read as absent.
fn deserialize_whole_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = Option::<f64>::deserialize(deserializer)?;
    Ok(seconds
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_parses_camel_case_metrics() {
        let node: TelemetryNode = serde_json::from_str(
            r#"{
                "node_id": "!a1b2c3d4",
                "timestamp": "2024-05-01T12:00:00Z",
                "device_metrics": {"batteryLevel": 87, "voltage": 4.01, "uptimeSeconds": 7260},
                "environment_metrics": {"relativeHumidity": 41.5},
                "position": {"latitude": 52.1, "longitude": 4.3, "altitude": 12.0}
            }"#,
        )
        .unwrap();
        let device = node.device_metrics.unwrap();
        assert_eq!(device.battery_level, Some(87.0));
        assert_eq!(device.uptime_seconds, Some(7260));
        assert_eq!(
            node.environment_metrics.unwrap().relative_humidity,
            Some(41.5)
        );
        assert_eq!(node.position.unwrap().altitude_meters, Some(12.0));
    }

    #[test]
    fn epoch_millis_timestamp_is_accepted() {
        let node: TelemetryNode =
            serde_json::from_str(r#"{"node_id": "n1", "timestamp": 1714564800000}"#).unwrap();
        assert_eq!(node.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(node.valid_position().is_none());
    }

    #[test]
    fn sqlite_style_timestamp_reads_as_utc() {
        let node: TelemetryNode =
            serde_json::from_str(r#"{"node_id": "n2", "timestamp": "2024-05-01 12:00:00"}"#)
                .unwrap();
        assert_eq!(node.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn fractional_uptime_is_floored() {
        let metrics: DeviceMetrics =
            serde_json::from_str(r#"{"uptimeSeconds": 7260.9, "voltage": 3.9}"#).unwrap();
        assert_eq!(metrics.uptime_seconds, Some(7260));
        let negative: DeviceMetrics = serde_json::from_str(r#"{"uptimeSeconds": -4}"#).unwrap();
        assert_eq!(negative.uptime_seconds, None);
        let null: DeviceMetrics = serde_json::from_str(r#"{"uptimeSeconds": null}"#).unwrap();
        assert_eq!(null.uptime_seconds, None);
    }

    #[test]
    fn unparseable_timestamp_is_rejected() {
        let node = serde_json::from_str::<TelemetryNode>(
            r#"{"node_id": "n3", "timestamp": "yesterday"}"#,
        );
        assert!(node.is_err());
    }

    #[test]
    fn placeholder_and_out_of_range_positions_are_invalid() {
        let origin = NodePosition {
            latitude: 0.0,
            longitude: 0.0,
            altitude_meters: None,
        };
        let out_of_range = NodePosition {
            latitude: 95.0,
            longitude: 10.0,
            altitude_meters: None,
        };
        let nan = NodePosition {
            latitude: f64::NAN,
            longitude: 10.0,
            altitude_meters: None,
        };
        assert!(!origin.is_valid());
        assert!(!out_of_range.is_valid());
        assert!(!nan.is_valid());
        assert!(NodePosition {
            latitude: -33.9,
            longitude: 151.2,
            altitude_meters: Some(40.0),
        }
        .is_valid());
    }
}
