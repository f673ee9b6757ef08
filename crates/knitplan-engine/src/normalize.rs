//! Gauge and measurement normalization.
//!
//! Converts body measurements (centimeters) into stitch counts for width
//! segments and row counts for length segments:
//!
//! ```text
//! stitches = round(width_cm  × stitches_per_10cm / 10)
//! rows     = round(length_cm × rows_per_10cm     / 10)
//! ```
//!
//! Rounding is half away from zero so the same inputs always produce the
//! same counts on every platform.
//!
//! Two segments are derived rather than measured: the back neck width
//! ([`NECK_FRACTION`] of the shoulder width) and the armhole depth
//! (half the bicep plus [`ARMHOLE_ALLOWANCE_CM`]).

use serde::{Deserialize, Serialize};

use crate::types::{Gauge, Measurements, PatternError};

/// Back neck width as a fraction of the shoulder width.
pub const NECK_FRACTION: f64 = 0.4;

/// Added to half the bicep circumference to get the armhole depth.
pub const ARMHOLE_ALLOWANCE_CM: f64 = 3.0;

/// Stitch and row targets for each construction segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTargets {
    /// Stitches around the chest.
    pub chest_stitches: u32,
    /// Stitches around the hip.
    pub hip_stitches: u32,
    /// Stitches across the shoulders.
    pub shoulder_stitches: u32,
    /// Stitches across the back neck.
    pub neck_stitches: u32,
    /// Stitches around the wrist.
    pub wrist_stitches: u32,
    /// Stitches around the upper arm.
    pub bicep_stitches: u32,
    /// Rows from hem to shoulder.
    pub body_rows: u32,
    /// Rows from underarm to wrist.
    pub sleeve_rows: u32,
    /// Rows from underarm to shoulder.
    pub armhole_rows: u32,
}

/// Derived armhole depth in centimeters.
#[must_use]
pub fn armhole_depth_cm(measurements: &Measurements) -> f64 {
    measurements.bicep / 2.0 + ARMHOLE_ALLOWANCE_CM
}

/// Convert measurements and gauge into per-segment stitch and row targets.
///
/// Pure and deterministic.
///
/// # Errors
///
/// Returns [`PatternError::InvalidGauge`] if the gauge is non-positive or
/// not finite (checked first), and [`PatternError::InvalidMeasurement`] if
/// any measurement is missing or non-positive.
pub fn normalize(
    measurements: &Measurements,
    gauge: &Gauge,
) -> Result<SegmentTargets, PatternError> {
    gauge.validate()?;
    measurements.validate()?;

    Ok(SegmentTargets {
        chest_stitches: gauge.stitches_for(measurements.chest),
        hip_stitches: gauge.stitches_for(measurements.hip),
        shoulder_stitches: gauge.stitches_for(measurements.shoulder_width),
        neck_stitches: gauge.stitches_for(measurements.shoulder_width * NECK_FRACTION),
        wrist_stitches: gauge.stitches_for(measurements.wrist),
        bicep_stitches: gauge.stitches_for(measurements.bicep),
        body_rows: gauge.rows_for(measurements.body_length),
        sleeve_rows: gauge.rows_for(measurements.arm_length),
        armhole_rows: gauge.rows_for(armhole_depth_cm(measurements)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn medium() -> Measurements {
        Measurements {
            chest: 96.0,
            body_length: 62.0,
            shoulder_width: 40.0,
            arm_length: 45.0,
            wrist: 16.0,
            bicep: 29.0,
            hip: 100.0,
        }
    }

    fn gauge() -> Gauge {
        Gauge {
            stitches_per_10cm: 22.0,
            rows_per_10cm: 30.0,
        }
    }

    #[test]
    fn chest_and_length_scenario() {
        let targets = normalize(&medium(), &gauge()).unwrap();
        // 96 × 22 / 10 = 211.2 → 211; 62 × 30 / 10 = 186.
        assert_eq!(targets.chest_stitches, 211);
        assert_eq!(targets.body_rows, 186);
    }

    #[test]
    fn derived_segments() {
        let targets = normalize(&medium(), &gauge()).unwrap();
        // Neck: 40 × 0.4 = 16 cm → 35.2 → 35.
        assert_eq!(targets.neck_stitches, 35);
        // Armhole: 29 / 2 + 3 = 17.5 cm → 52.5 → 53 (half away from zero).
        assert_eq!(targets.armhole_rows, 53);
    }

    #[test]
    fn remaining_segments() {
        let targets = normalize(&medium(), &gauge()).unwrap();
        assert_eq!(targets.hip_stitches, 220);
        assert_eq!(targets.shoulder_stitches, 88);
        assert_eq!(targets.wrist_stitches, 35);
        assert_eq!(targets.bicep_stitches, 64);
        assert_eq!(targets.sleeve_rows, 135);
    }

    #[test]
    fn deterministic() {
        let a = normalize(&medium(), &gauge()).unwrap();
        let b = normalize(&medium(), &gauge()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_gauge_checked_before_measurements() {
        let bad = Measurements {
            chest: -1.0,
            ..medium()
        };
        let zero = Gauge {
            stitches_per_10cm: 0.0,
            rows_per_10cm: 30.0,
        };
        assert!(matches!(
            normalize(&bad, &zero),
            Err(PatternError::InvalidGauge { .. })
        ));
    }

    #[test]
    fn invalid_measurement_names_field() {
        let bad = Measurements {
            arm_length: 0.0,
            ..medium()
        };
        assert!(matches!(
            normalize(&bad, &gauge()),
            Err(PatternError::InvalidMeasurement { ref name, .. }) if name == "arm_length"
        ));
    }
}
