//! Per-construction piece builders.
//!
//! Each supported construction method is a [`ConstructionKind`] variant.
//! [`Construction::pieces`] dispatches to the builder for that method,
//! which turns a [`Plan`] into the garment's pieces:
//!
//! ```text
//!                     ┌─ SetInSleeve ──────► back, front(s), sleeves
//!  Plan ──► resolve ──┼─ Raglan ───────────► back, front(s), sleeves
//!                     ├─ DropShoulder ─────► back, front(s), sleeves
//!                     └─ SeamlessTopDown ──► yoke-and-body, sleeves
//!                                                  │
//!                                                  ▼
//!                               neckband, front bands, armhole bands
//! ```
//!
//! Every builder writes rows through [`piece::PieceBuilder`], so stitch
//! counts are tracked in one place.

pub mod drop_shoulder;
pub mod fabric;
pub mod finishing;
pub mod panels;
pub mod piece;
pub mod raglan;
pub mod set_in;
pub mod top_down;

use serde::{Deserialize, Serialize};

use crate::normalize::SegmentTargets;
use crate::types::{
    ConstructionMethod, GarmentAnalysis, GarmentType, Gauge, GeneratorConfig, Measurements,
    Neckline, PatternError, Piece, SleeveStyle, round_count,
};

use fabric::Fabric;

/// Round up to the next even count, or down at `u32::MAX`.
#[must_use]
pub const fn even(n: u32) -> u32 {
    match n.checked_add(n % 2) {
        Some(rounded) => rounded,
        None => n - 1,
    }
}

/// Everything a piece builder needs, resolved and normalized.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    /// The garment being built.
    pub analysis: &'a GarmentAnalysis,
    /// Generator knobs.
    pub config: &'a GeneratorConfig,
    /// Gauge for every conversion.
    pub gauge: Gauge,
    /// Measurements with ease applied.
    pub measurements: Measurements,
    /// Segment targets of the eased measurements.
    pub targets: SegmentTargets,
    /// Body fabric.
    pub fabric: Fabric,
}

impl Plan<'_> {
    /// Rows of hem ribbing.
    #[must_use]
    pub fn hem_rows(&self) -> u32 {
        self.gauge.rows_for(self.config.hem_depth_cm).max(2)
    }

    /// Rows of cuff ribbing.
    #[must_use]
    pub fn cuff_rows(&self) -> u32 {
        self.gauge.rows_for(self.config.cuff_depth_cm).max(2)
    }

    /// Rows of front or armhole band ribbing.
    #[must_use]
    pub fn band_rows(&self) -> u32 {
        self.gauge.rows_for(self.config.band_depth_cm).max(2)
    }

    /// Rows of neckband ribbing; a turtleneck collar is much taller.
    #[must_use]
    pub fn neckband_rows(&self) -> u32 {
        let depth = match self.analysis.neckline {
            Neckline::Turtleneck => self.config.turtleneck_depth_cm,
            _ => self.config.neckband_depth_cm,
        };
        self.gauge.rows_for(depth).max(2)
    }

    /// Stitches bound off (or cast on) at each underarm.
    #[must_use]
    pub fn underarm_stitches(&self) -> u32 {
        even(self.gauge.stitches_for(self.config.underarm_cm).max(2))
    }

    /// Rows from the underarm to the sleeve edge.
    #[must_use]
    pub fn sleeve_rows(&self) -> u32 {
        let fraction = self.analysis.sleeve_style.length_fraction();
        round_count(f64::from(self.targets.sleeve_rows) * fraction)
    }

    /// Stitches at the sleeve edge: the wrist for long sleeves, further up
    /// the arm for shorter ones.
    #[must_use]
    pub fn cuff_stitches(&self) -> u32 {
        let wrist = f64::from(self.targets.wrist_stitches);
        let bicep = f64::from(self.targets.bicep_stitches);
        let fraction = self.analysis.sleeve_style.length_fraction();
        even(round_count(bicep - (bicep - wrist) * fraction)).max(4)
    }

    /// Stitches around the upper arm, even.
    #[must_use]
    pub fn bicep_stitches(&self) -> u32 {
        even(self.targets.bicep_stitches).max(8)
    }

    /// Open front closed with bands.
    #[must_use]
    pub fn is_cardigan(&self) -> bool {
        self.analysis.garment_type == GarmentType::Cardigan
    }

    /// No sleeves: a vest, or a sleeveless style.
    #[must_use]
    pub fn is_sleeveless(&self) -> bool {
        self.analysis.garment_type == GarmentType::Vest
            || self.analysis.sleeve_style == SleeveStyle::Sleeveless
    }
}

/// Builds the pieces of one construction method.
pub trait Construction {
    /// Every piece of the garment, in knitting order.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::ImpossibleShaping`] when the measurements
    /// leave too few rows for a shaping span, and
    /// [`PatternError::InconsistentPattern`] if a span does not end on its
    /// target count.
    fn pieces(&self, plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError>;
}

/// Supported construction methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionKind {
    /// Flat pieces with bind-off curves at the armhole and sleeve cap.
    SetInSleeve,
    /// Flat pieces joined along raglan decrease lines.
    Raglan,
    /// Straight flat pieces.
    DropShoulder,
    /// One piece in the round from the neck down.
    SeamlessTopDown,
}

impl ConstructionKind {
    /// Resolve the analysis to a supported construction.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::UnsupportedConstruction`] for unknown
    /// garments or methods, for cardigans and vests worked seamless
    /// top-down, and for raglan vests.
    pub fn resolve(analysis: &GarmentAnalysis) -> Result<Self, PatternError> {
        let kind = match analysis.construction {
            ConstructionMethod::SetInSleeve => Self::SetInSleeve,
            ConstructionMethod::Raglan => Self::Raglan,
            ConstructionMethod::DropShoulder => Self::DropShoulder,
            ConstructionMethod::SeamlessTopDown => Self::SeamlessTopDown,
            ConstructionMethod::Other => {
                return Err(PatternError::UnsupportedConstruction(
                    "unrecognized construction method".to_string(),
                ));
            }
        };
        match (analysis.garment_type, kind) {
            (GarmentType::Other, _) => Err(PatternError::UnsupportedConstruction(
                "unrecognized garment type".to_string(),
            )),
            (GarmentType::Cardigan, Self::SeamlessTopDown) => Err(
                PatternError::UnsupportedConstruction(
                    "cardigans cannot be worked seamless top-down".to_string(),
                ),
            ),
            (GarmentType::Vest, Self::SeamlessTopDown | Self::Raglan) => {
                Err(PatternError::UnsupportedConstruction(format!(
                    "vests cannot be worked {}",
                    kind.name()
                )))
            }
            _ => Ok(kind),
        }
    }

    /// Lowercase name, for titles and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetInSleeve => "set-in sleeve",
            Self::Raglan => "raglan",
            Self::DropShoulder => "drop shoulder",
            Self::SeamlessTopDown => "seamless top-down",
        }
    }
}

impl Construction for ConstructionKind {
    fn pieces(&self, plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
        match self {
            Self::SetInSleeve => set_in::pieces(plan),
            Self::Raglan => raglan::pieces(plan),
            Self::DropShoulder => drop_shoulder::pieces(plan),
            Self::SeamlessTopDown => top_down::pieces(plan),
        }
    }
}

/// Run `f` against a plan for a medium body at 22 × 30 gauge.
#[cfg(test)]
pub(crate) fn test_plan(
    garment_type: GarmentType,
    neckline: Neckline,
    f: impl FnOnce(&Plan<'_>),
) {
    use crate::presets::SizePreset;
    use crate::types::{Confidence, StitchPattern};

    let analysis = GarmentAnalysis {
        garment_type,
        construction: ConstructionMethod::SetInSleeve,
        stitch_pattern: StitchPattern::Stockinette,
        neckline,
        sleeve_style: SleeveStyle::Long,
        confidence: Confidence::High,
        rejection_reason: None,
    };
    let config = GeneratorConfig::default();
    let gauge = Gauge {
        stitches_per_10cm: 22.0,
        rows_per_10cm: 30.0,
    };
    let measurements = SizePreset::M.measurements().with_ease(config.ease_cm);
    let Ok(targets) = crate::normalize::normalize(&measurements, &gauge) else {
        return;
    };
    f(&Plan {
        analysis: &analysis,
        config: &config,
        gauge,
        measurements,
        targets,
        fabric: Fabric::Stockinette,
    });
}
