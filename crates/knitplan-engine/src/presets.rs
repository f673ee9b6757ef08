//! Standard size presets and manual overrides.
//!
//! A preset prefills [`Measurements`]; the knitter may override any of
//! them. [`significant_changes`] flags overrides that move a measurement
//! more than a relative threshold away from the preset, so a form can ask
//! "did you mean that?" before generating.

use serde::{Deserialize, Serialize};

use crate::types::Measurements;

/// Default relative difference above which an override is significant.
pub const DEFAULT_SIGNIFICANT_CHANGE: f64 = 0.05;

/// Standard adult sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizePreset {
    /// Extra small.
    Xs,
    /// Small.
    S,
    /// Medium.
    M,
    /// Large.
    L,
    /// Extra large.
    Xl,
    /// Extra extra large.
    Xxl,
}

impl SizePreset {
    /// Every preset, smallest first.
    pub const ALL: [Self; 6] = [Self::Xs, Self::S, Self::M, Self::L, Self::Xl, Self::Xxl];

    /// Short label, e.g. `"XL"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
        }
    }

    /// Look a preset up by label, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Body measurements for the size, in centimeters.
    #[must_use]
    pub const fn measurements(self) -> Measurements {
        // chest, body length, shoulder, arm, wrist, bicep, hip
        let (chest, body_length, shoulder_width, arm_length, wrist, bicep, hip) = match self {
            Self::Xs => (80.0, 58.0, 36.0, 43.0, 14.0, 25.0, 84.0),
            Self::S => (88.0, 60.0, 38.0, 44.0, 15.0, 27.0, 92.0),
            Self::M => (96.0, 62.0, 40.0, 45.0, 16.0, 29.0, 100.0),
            Self::L => (104.0, 64.0, 42.0, 46.0, 17.0, 31.0, 108.0),
            Self::Xl => (112.0, 66.0, 44.0, 47.0, 18.0, 33.0, 116.0),
            Self::Xxl => (120.0, 68.0, 46.0, 48.0, 19.0, 35.0, 124.0),
        };
        Measurements {
            chest,
            body_length,
            shoulder_width,
            arm_length,
            wrist,
            bicep,
            hip,
        }
    }
}

impl std::fmt::Display for SizePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Manual values replacing preset measurements. `None` keeps the preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementOverrides {
    /// Chest circumference.
    pub chest: Option<f64>,
    /// Body length from hem to shoulder.
    pub body_length: Option<f64>,
    /// Shoulder width.
    pub shoulder_width: Option<f64>,
    /// Arm length from underarm to wrist.
    pub arm_length: Option<f64>,
    /// Wrist circumference.
    pub wrist: Option<f64>,
    /// Upper arm circumference.
    pub bicep: Option<f64>,
    /// Hip circumference.
    pub hip: Option<f64>,
}

impl MeasurementOverrides {
    /// Apply the overrides on top of `base`.
    #[must_use]
    pub fn apply(&self, base: Measurements) -> Measurements {
        Measurements {
            chest: self.chest.unwrap_or(base.chest),
            body_length: self.body_length.unwrap_or(base.body_length),
            shoulder_width: self.shoulder_width.unwrap_or(base.shoulder_width),
            arm_length: self.arm_length.unwrap_or(base.arm_length),
            wrist: self.wrist.unwrap_or(base.wrist),
            bicep: self.bicep.unwrap_or(base.bicep),
            hip: self.hip.unwrap_or(base.hip),
        }
    }

    /// Returns `true` if nothing is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A measurement that differs noticeably from its preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantChange {
    /// Measurement name.
    pub name: &'static str,
    /// Preset value.
    pub preset: f64,
    /// Value in use.
    pub value: f64,
    /// `(value - preset) / preset`.
    pub relative: f64,
}

/// Measurements in `measurements` that differ from `preset` by more than
/// `threshold` (relative), in declaration order.
///
/// Non-finite values always count as significant.
#[must_use]
pub fn significant_changes(
    preset: SizePreset,
    measurements: &Measurements,
    threshold: f64,
) -> Vec<SignificantChange> {
    preset
        .measurements()
        .named()
        .into_iter()
        .zip(measurements.named())
        .filter_map(|((name, base), (_, value))| {
            let relative = (value - base) / base;
            (!relative.is_finite() || relative.abs() > threshold).then_some(SignificantChange {
                name,
                preset: base,
                value,
                relative,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn medium_matches_reference_body() {
        let m = SizePreset::M.measurements();
        assert!((m.chest - 96.0).abs() < 1e-9);
        assert!((m.body_length - 62.0).abs() < 1e-9);
    }

    #[test]
    fn presets_grow_monotonically() {
        for pair in SizePreset::ALL.windows(2) {
            let (a, b) = (pair[0].measurements(), pair[1].measurements());
            for ((_, x), (_, y)) in a.named().into_iter().zip(b.named()) {
                assert!(x < y);
            }
        }
    }

    #[test]
    fn every_preset_is_valid() {
        for preset in SizePreset::ALL {
            assert!(preset.measurements().validate().is_ok(), "{preset}");
        }
    }

    #[test]
    fn labels_round_trip() {
        for preset in SizePreset::ALL {
            assert_eq!(SizePreset::from_label(preset.label()), Some(preset));
        }
        assert_eq!(SizePreset::from_label("xxl"), Some(SizePreset::Xxl));
        assert_eq!(SizePreset::from_label("XXXL"), None);
    }

    #[test]
    fn serde_uses_labels() {
        assert_eq!(serde_json::to_string(&SizePreset::Xl).unwrap(), "\"XL\"");
        let preset: SizePreset = serde_json::from_str("\"XS\"").unwrap();
        assert_eq!(preset, SizePreset::Xs);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let overrides = MeasurementOverrides {
            chest: Some(100.0),
            ..MeasurementOverrides::default()
        };
        let m = overrides.apply(SizePreset::M.measurements());
        assert!((m.chest - 100.0).abs() < 1e-9);
        assert!((m.hip - 100.0).abs() < 1e-9);
        assert!(!overrides.is_empty());
        assert!(MeasurementOverrides::default().is_empty());
    }

    #[test]
    fn significant_change_threshold() {
        let overrides = MeasurementOverrides {
            chest: Some(100.0),      // +4.2%: not significant
            body_length: Some(70.0), // +12.9%: significant
            ..MeasurementOverrides::default()
        };
        let m = overrides.apply(SizePreset::M.measurements());
        let changes = significant_changes(SizePreset::M, &m, DEFAULT_SIGNIFICANT_CHANGE);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "body_length");
        assert!(changes[0].relative > 0.12);
    }

    #[test]
    fn unchanged_measurements_have_no_changes() {
        let m = SizePreset::L.measurements();
        assert!(significant_changes(SizePreset::L, &m, DEFAULT_SIGNIFICANT_CHANGE).is_empty());
    }

    #[test]
    fn nan_is_always_significant() {
        let m = Measurements {
            wrist: f64::NAN,
            ..SizePreset::S.measurements()
        };
        let changes = significant_changes(SizePreset::S, &m, 0.5);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "wrist");
    }
}
