use crate::workflow::config::SimulatorConfig;
use chrono::{DateTime, Duration, Utc};
use meshcore::payload::{
    DeviceMetrics, EnvironmentMetrics, NodePosition, TelemetryNode, TelemetryPayload,
};
use meshcore::FetchQuery;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

const KM_PER_DEGREE_LAT: f64 = 111.32;

/// Static traits of one simulated node.
#[derive(Debug, Clone)]
struct NodeProfile {
    node_id: String,
    position: Option<NodePosition>,
    has_environment: bool,
    boot_offset_s: u64,
}

/// Deterministic fleet of simulated mesh nodes.
pub struct FleetGenerator {
    profiles: Vec<NodeProfile>,
    seed: u64,
    failure_rate: f64,
    requests: AtomicU64,
}

impl FleetGenerator {
    pub fn new(config: &SimulatorConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let lat_spread = config.spread_km / KM_PER_DEGREE_LAT;
        let lon_spread = config.spread_km
            / (KM_PER_DEGREE_LAT * config.center_latitude.to_radians().cos().abs().max(0.01));

        let profiles = (0..config.node_count)
            .map(|_| {
                let node_id = format!("!{:08x}", rng.gen::<u32>());
                let position = rng.gen_bool(config.positioned_ratio).then(|| NodePosition {
                    latitude: (config.center_latitude + rng.gen_range(-1.0..=1.0) * lat_spread)
                        .clamp(-90.0, 90.0),
                    longitude: (config.center_longitude + rng.gen_range(-1.0..=1.0) * lon_spread)
                        .clamp(-180.0, 180.0),
                    altitude_meters: rng.gen_bool(0.8).then(|| rng.gen_range(1.0..300.0)),
                });
                NodeProfile {
                    node_id,
                    position,
                    has_environment: rng.gen_bool(0.5),
                    boot_offset_s: rng.gen_range(600..604_800),
                }
            })
            .collect();

        Self {
            profiles,
            seed: config.seed,
            failure_rate: config.failure_rate,
            requests: AtomicU64::new(0),
        }
    }

    pub fn node_count(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `None` when the request should be answered as an outage.
    pub fn respond(&self, query: FetchQuery, now: DateTime<Utc>) -> Option<TelemetryPayload> {
        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(request));
        if rng.gen_bool(self.failure_rate) {
            return None;
        }
        Some(self.snapshot(query, now, &mut rng))
    }

    /// At most `query.limit` nodes, each last heard within `query.hours`.
    pub fn snapshot(&self, query: FetchQuery, now: DateTime<Utc>, rng: &mut StdRng) -> TelemetryPayload {
        let window_s = i64::from(query.hours.max(1)) * 3600;
        let nodes = self
            .profiles
            .iter()
            .take(query.limit as usize)
            .map(|profile| {
                let age_s = rng.gen_range(0..window_s);
                TelemetryNode {
                    node_id: profile.node_id.clone(),
                    timestamp: now - Duration::seconds(age_s),
                    device_metrics: Some(DeviceMetrics {
                        battery_level: Some(rng.gen_range(15.0..=100.0_f64).round()),
                        voltage: Some(rng.gen_range(3.3..4.2)),
                        channel_utilization: Some(rng.gen_range(0.0..40.0)),
                        air_util_tx: Some(rng.gen_range(0.0..10.0)),
                        uptime_seconds: Some(profile.boot_offset_s + age_s.unsigned_abs()),
                    }),
                    environment_metrics: profile.has_environment.then(|| EnvironmentMetrics {
                        temperature: Some(rng.gen_range(-5.0..35.0)),
                        relative_humidity: Some(rng.gen_range(20.0..95.0)),
                        barometric_pressure: Some(rng.gen_range(980.0..1040.0)),
                    }),
                    position: profile.position,
                }
            })
            .collect();
        TelemetryPayload::new(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(node_count: usize) -> SimulatorConfig {
        SimulatorConfig {
            node_count,
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn snapshot_honours_limit_and_window() {
        let generator = FleetGenerator::new(&config(10));
        let now = Utc::now();
        let payload = generator
            .respond(FetchQuery { hours: 2, limit: 4 }, now)
            .unwrap();
        assert_eq!(payload.node_count(), 4);
        for node in payload.nodes() {
            assert!(node.timestamp <= now);
            assert!(now - node.timestamp < Duration::hours(2));
        }
    }

    #[test]
    fn same_seed_builds_same_fleet() {
        let first = FleetGenerator::new(&config(6));
        let second = FleetGenerator::new(&config(6));
        let now = Utc::now();
        let query = FetchQuery { hours: 24, limit: 6 };
        assert_eq!(first.respond(query, now), second.respond(query, now));
    }

    #[test]
    fn generated_positions_are_valid() {
        let generator = FleetGenerator::new(&SimulatorConfig {
            positioned_ratio: 1.0,
            ..config(8)
        });
        let payload = generator
            .respond(FetchQuery { hours: 1, limit: 8 }, Utc::now())
            .unwrap();
        assert!(payload.nodes().iter().all(|n| n.valid_position().is_some()));
    }

    #[test]
    fn full_failure_rate_always_fails() {
        let generator = FleetGenerator::new(&SimulatorConfig {
            failure_rate: 1.0,
            ..config(3)
        });
        let query = FetchQuery { hours: 1, limit: 3 };
        assert!(generator.respond(query, Utc::now()).is_none());
        assert!(generator.respond(query, Utc::now()).is_none());
    }
}
