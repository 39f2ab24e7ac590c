use crate::endpoint::query::TelemetryQuery;
use crate::generator::fleet::FleetGenerator;
use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use warp::{http::StatusCode, Filter, Rejection, Reply};

/// Hosts the telemetry HTTP endpoint backed by a simulated fleet.
#[derive(Clone)]
pub struct TelemetryBridge {
    fleet: Arc<FleetGenerator>,
}

impl TelemetryBridge {
    pub fn new(fleet: FleetGenerator) -> Self {
        Self {
            fleet: Arc::new(fleet),
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let fleet = self.fleet.clone();
        let fleet_filter = warp::any().map(move || fleet.clone());

        let telemetry_route = warp::path!("api" / "telemetry")
            .and(warp::get())
            .and(warp::query::<TelemetryQuery>())
            .and(fleet_filter)
            .map(|query: TelemetryQuery, fleet: Arc<FleetGenerator>| {
                let resolved = query.resolve();
                match fleet.respond(resolved, Utc::now()) {
                    Some(payload) => {
                        info!(
                            "served {} nodes ({} h window)",
                            payload.node_count(),
                            resolved.hours
                        );
                        warp::reply::with_status(warp::reply::json(&payload), StatusCode::OK)
                    }
                    None => {
                        warn!("injected outage for telemetry request");
                        warp::reply::with_status(
                            warp::reply::json(&json!({"error": "simulated outage"})),
                            StatusCode::SERVICE_UNAVAILABLE,
                        )
                    }
                }
            });

        let health_route = warp::path("health")
            .and(warp::get())
            .map(|| warp::reply::json(&json!({"status": "ok"})));

        telemetry_route.or(health_route).with(warp::cors().allow_any_origin())
    }

    pub async fn serve(&self, addr: SocketAddr) {
        info!(
            "telemetry endpoint listening on http://{addr} ({} nodes)",
            self.fleet.node_count()
        );
        warp::serve(self.routes()).run(addr).await;
    }
}
