//! Radio-horizon approximation used for the map overlay radius.
//!
//! `d_km = 3.57 * (sqrt(h_tx) + sqrt(h_rx))`, clipped by the user limit and
//! an absolute cap.

use serde::{Deserialize, Serialize};

/// Horizon coefficient for heights in metres and distance in kilometres.
pub const HORIZON_COEFFICIENT: f64 = 3.57;
pub const DEFAULT_RX_HEIGHT_M: f64 = 1.7;
pub const ABSOLUTE_CAP_KM: f64 = 100.0;
pub const MIN_USER_LIMIT_KM: f64 = 1.0;

/// Overlay radius handed to the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewshedResult {
    pub radius_meters: f64,
}

/// Limits applied to every radius computed during a render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewshedLimits {
    pub user_limit_km: f64,
    pub absolute_cap_km: f64,
    pub rx_height_meters: f64,
}

impl Default for ViewshedLimits {
    fn default() -> Self {
        Self {
            user_limit_km: ABSOLUTE_CAP_KM,
            absolute_cap_km: ABSOLUTE_CAP_KM,
            rx_height_meters: DEFAULT_RX_HEIGHT_M,
        }
    }
}

impl ViewshedLimits {
    /// Limits with the user control clamped to `[1, 100]` km.
    pub fn with_user_limit(limit_km: f64) -> Self {
        Self {
            user_limit_km: clamp_user_limit(limit_km),
            ..Self::default()
        }
    }

    pub fn radius_for(&self, tx_height_meters: f64) -> ViewshedResult {
        ViewshedResult {
            radius_meters: compute_radius(
                tx_height_meters,
                self.rx_height_meters,
                self.user_limit_km,
                self.absolute_cap_km,
            ),
        }
    }
}

/// Clamps the user-facing limit control. Non-finite input selects the cap.
pub fn clamp_user_limit(limit_km: f64) -> f64 {
    if limit_km.is_finite() {
        limit_km.clamp(MIN_USER_LIMIT_KM, ABSOLUTE_CAP_KM)
    } else {
        ABSOLUTE_CAP_KM
    }
}

fn usable_height(height_m: f64) -> f64 {
    if height_m.is_finite() && height_m > 0.0 {
        height_m
    } else {
        DEFAULT_RX_HEIGHT_M
    }
}

/// Line-of-sight radius in metres, always finite and within
/// `[0, absolute_cap_km * 1000]`.
pub fn compute_radius(
    tx_height_meters: f64,
    rx_height_meters: f64,
    user_limit_km: f64,
    absolute_cap_km: f64,
) -> f64 {
    let tx = usable_height(tx_height_meters);
    let rx = usable_height(rx_height_meters);
    let cap = if absolute_cap_km.is_finite() && absolute_cap_km >= 0.0 {
        absolute_cap_km
    } else {
        ABSOLUTE_CAP_KM
    };
    let user = if user_limit_km.is_finite() {
        user_limit_km.max(0.0)
    } else {
        cap
    };

    let distance_km = HORIZON_COEFFICIENT * (tx.sqrt() + rx.sqrt());
    distance_km.min(user).min(cap) * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_heights_reach_about_nine_km() {
        let radius = compute_radius(1.7, 1.7, 100.0, 100.0);
        assert!((radius - 9309.0).abs() < 5.0, "radius {radius}");
    }

    #[test]
    fn user_limit_binds() {
        assert_eq!(compute_radius(1.7, 1.7, 5.0, 100.0), 5000.0);
    }

    #[test]
    fn absolute_cap_saturates_tall_masts() {
        assert_eq!(compute_radius(2_000.0, 1.7, 100.0, 100.0), 100_000.0);
        assert_eq!(compute_radius(1.0e9, 1.7, 250.0, 100.0), 100_000.0);
    }

    #[test]
    fn invalid_heights_fall_back_to_default() {
        let expected = compute_radius(1.7, 1.7, 100.0, 100.0);
        assert_eq!(compute_radius(f64::NAN, 1.7, 100.0, 100.0), expected);
        assert_eq!(compute_radius(f64::INFINITY, 1.7, 100.0, 100.0), expected);
        assert_eq!(compute_radius(0.0, 1.7, 100.0, 100.0), expected);
        assert_eq!(compute_radius(-12.0, f64::NAN, 100.0, 100.0), expected);
    }

    #[test]
    fn radius_never_exceeds_cap_and_never_decreases() {
        let mut previous = 0.0;
        let mut height = 0.01;
        while height < 10_000.0 {
            let radius = compute_radius(height, DEFAULT_RX_HEIGHT_M, 100.0, 100.0);
            assert!(radius.is_finite());
            assert!(radius <= 100_000.0);
            assert!(radius >= previous, "dropped at {height}");
            previous = radius;
            height *= 1.3;
        }
        assert_eq!(previous, 100_000.0);
    }

    #[test]
    fn broken_limits_stay_finite() {
        assert_eq!(compute_radius(10.0, 1.7, f64::NAN, 1.0), 1000.0);
        assert_eq!(compute_radius(10.0, 1.7, -3.0, 100.0), 0.0);
        assert!(compute_radius(10.0, 1.7, 100.0, f64::NAN) <= 100_000.0);
    }

    #[test]
    fn user_limit_control_is_clamped() {
        assert_eq!(ViewshedLimits::with_user_limit(0.2).user_limit_km, 1.0);
        assert_eq!(ViewshedLimits::with_user_limit(500.0).user_limit_km, 100.0);
        assert_eq!(ViewshedLimits::with_user_limit(f64::NAN).user_limit_km, 100.0);
        let limits = ViewshedLimits::with_user_limit(5.0);
        assert_eq!(limits.radius_for(1.7).radius_meters, 5000.0);
    }
}
