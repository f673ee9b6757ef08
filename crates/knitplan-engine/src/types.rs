//! Shared types for the knitplan pattern engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::SegmentTargets;
use crate::shaping::ShapingBias;

// ───────────────────────── Garment analysis ──────────────────────────

/// Kind of garment described by the analysis.
///
/// Values the analysis collaborator produces that this engine does not
/// know about deserialize to [`Other`](Self::Other), which the generator
/// refuses with [`PatternError::UnsupportedConstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
    /// Closed-front sweater with sleeves.
    Pullover,
    /// Open-front sweater closed with buttons.
    Cardigan,
    /// Sleeveless pullover.
    Vest,
    /// Anything else (dresses, shawls, hats, ...).
    #[serde(other)]
    Other,
}

/// How the garment is put together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionMethod {
    /// Worked in one piece from the neck down with a raglan yoke.
    SeamlessTopDown,
    /// Flat pieces with shaped armholes and sleeve caps.
    SetInSleeve,
    /// Flat pieces joined along diagonal raglan lines.
    Raglan,
    /// Flat rectangular pieces with the sleeve sewn below the shoulder.
    DropShoulder,
    /// Any construction the engine cannot generate.
    #[serde(other)]
    Other,
}

/// Main fabric of the garment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StitchPattern {
    /// Knit on the right side, purl on the wrong side.
    Stockinette,
    /// 1x1 ribbing throughout.
    Ribbing,
    /// Knit every row.
    Garter,
    /// Alternating knit and purl, offset every row.
    Seed,
    /// Cabled fabric (not supported).
    Cable,
    /// Lace (not supported).
    Lace,
    /// Stranded or intarsia colorwork (not supported).
    Colorwork,
    /// Unrecognized stitch pattern.
    #[serde(other)]
    Other,
}

/// Neckline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neckline {
    /// Round neck sitting at the base of the neck.
    #[default]
    Crew,
    /// V-shaped neck opening from the underarm.
    VNeck,
    /// Deeper round neck.
    Scoop,
    /// Wide, shallow neck.
    Boat,
    /// Crew neck finished with a tall folded collar.
    Turtleneck,
}

/// Sleeve length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleeveStyle {
    /// Full arm length.
    #[default]
    Long,
    /// Three quarters of the arm length.
    ThreeQuarter,
    /// A quarter of the arm length.
    Short,
    /// No sleeves; armholes are finished with bands.
    Sleeveless,
}

impl SleeveStyle {
    /// Fraction of the full arm length the sleeve covers.
    #[must_use]
    pub const fn length_fraction(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::ThreeQuarter => 0.75,
            Self::Short => 0.25,
            Self::Sleeveless => 0.0,
        }
    }
}

/// How confident the analysis collaborator is in its reading of the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Too little information to generate anything.
    Insufficient,
    /// Usable, with noticeable guesswork.
    Low,
    /// Usable.
    Medium,
    /// Clear reading.
    High,
}

/// Structural description of a garment, produced by the external analysis
/// collaborator. Immutable input to generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarmentAnalysis {
    /// Kind of garment.
    pub garment_type: GarmentType,
    /// Construction method.
    pub construction: ConstructionMethod,
    /// Body fabric.
    pub stitch_pattern: StitchPattern,
    /// Neckline style.
    #[serde(default)]
    pub neckline: Neckline,
    /// Sleeve length.
    #[serde(default)]
    pub sleeve_style: SleeveStyle,
    /// Confidence of the analysis.
    pub confidence: Confidence,
    /// Why the analysis rejected the input, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

// ───────────────────────── Measurements & gauge ──────────────────────

/// Body measurements in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Chest circumference.
    pub chest: f64,
    /// Body length from hem to shoulder.
    pub body_length: f64,
    /// Shoulder width across the back.
    pub shoulder_width: f64,
    /// Arm length from underarm to wrist.
    pub arm_length: f64,
    /// Wrist circumference.
    pub wrist: f64,
    /// Upper arm circumference.
    pub bicep: f64,
    /// Hip circumference.
    pub hip: f64,
}

impl Measurements {
    /// All measurements paired with their names, in declaration order.
    #[must_use]
    pub const fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("chest", self.chest),
            ("body_length", self.body_length),
            ("shoulder_width", self.shoulder_width),
            ("arm_length", self.arm_length),
            ("wrist", self.wrist),
            ("bicep", self.bicep),
            ("hip", self.hip),
        ]
    }

    /// Longest measurement accepted, in centimeters.
    pub const MAX_CM: f64 = 500.0;

    /// Check that every measurement is a positive, finite number no larger
    /// than [`Self::MAX_CM`].
    ///
    /// Non-finite values (NaN, infinity) are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidMeasurement`] naming the first
    /// offending measurement.
    pub fn validate(&self) -> Result<(), PatternError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value <= 0.0 || value > Self::MAX_CM {
                return Err(PatternError::InvalidMeasurement {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Measurements with wearing ease added: the full ease to chest and
    /// hip, half of it to the bicep.
    #[must_use]
    pub fn with_ease(self, ease_cm: f64) -> Self {
        Self {
            chest: self.chest + ease_cm,
            hip: self.hip + ease_cm,
            bicep: self.bicep + ease_cm / 2.0,
            ..self
        }
    }
}

/// Stitches and rows per 10 cm of fabric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    /// Stitches across 10 cm.
    pub stitches_per_10cm: f64,
    /// Rows along 10 cm.
    pub rows_per_10cm: f64,
}

impl Gauge {
    /// Create a validated gauge.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidGauge`] if either value is zero,
    /// negative, not finite, or above [`Self::MAX_PER_10CM`].
    pub fn new(stitches_per_10cm: f64, rows_per_10cm: f64) -> Result<Self, PatternError> {
        let gauge = Self {
            stitches_per_10cm,
            rows_per_10cm,
        };
        gauge.validate()?;
        Ok(gauge)
    }

    /// Densest gauge accepted, per 10 cm, in either direction.
    pub const MAX_PER_10CM: f64 = 100.0;

    /// Check that both values are positive, finite, and no denser than
    /// [`Self::MAX_PER_10CM`].
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidGauge`] otherwise.
    pub fn validate(&self) -> Result<(), PatternError> {
        let valid = |v: f64| v.is_finite() && v > 0.0 && v <= Self::MAX_PER_10CM;
        if valid(self.stitches_per_10cm) && valid(self.rows_per_10cm) {
            Ok(())
        } else {
            Err(PatternError::InvalidGauge {
                stitches_per_10cm: self.stitches_per_10cm,
                rows_per_10cm: self.rows_per_10cm,
            })
        }
    }

    /// Stitch count covering `cm` of width, rounded half away from zero.
    #[must_use]
    pub fn stitches_for(&self, cm: f64) -> u32 {
        round_count(cm * self.stitches_per_10cm / 10.0)
    }

    /// Row count covering `cm` of length, rounded half away from zero.
    #[must_use]
    pub fn rows_for(&self, cm: f64) -> u32 {
        round_count(cm * self.rows_per_10cm / 10.0)
    }
}

/// Round half away from zero and clamp into `u32`.
///
/// `f64::round` already rounds halves away from zero, so 0.5 → 1 and
/// 2.5 → 3 regardless of platform.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_count(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

// ───────────────────────── Generator configuration ───────────────────

/// Tunable knobs of the pattern generator.
///
/// All lengths are in centimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Wearing ease added to chest and hip (half of it to the bicep).
    pub ease_cm: f64,
    /// Depth of the ribbed hem on body pieces.
    pub hem_depth_cm: f64,
    /// Depth of the ribbed sleeve cuffs.
    pub cuff_depth_cm: f64,
    /// Depth of the neckband.
    pub neckband_depth_cm: f64,
    /// Depth of a turtleneck collar.
    pub turtleneck_depth_cm: f64,
    /// Depth of cardigan front bands and armhole bands.
    pub band_depth_cm: f64,
    /// Width bound off (flat) or cast on (top-down) at each underarm.
    pub underarm_cm: f64,
    /// Number of buttonholes on a cardigan.
    pub buttons: u32,
    /// Which end of a shaping span takes the denser shaping.
    pub shaping_bias: ShapingBias,
}

impl GeneratorConfig {
    /// Default wearing ease.
    pub const DEFAULT_EASE_CM: f64 = 8.0;
    /// Default hem depth.
    pub const DEFAULT_HEM_DEPTH_CM: f64 = 5.0;
    /// Default cuff depth.
    pub const DEFAULT_CUFF_DEPTH_CM: f64 = 5.0;
    /// Default neckband depth.
    pub const DEFAULT_NECKBAND_DEPTH_CM: f64 = 2.5;
    /// Default turtleneck collar depth.
    pub const DEFAULT_TURTLENECK_DEPTH_CM: f64 = 18.0;
    /// Default front/armhole band depth.
    pub const DEFAULT_BAND_DEPTH_CM: f64 = 3.0;
    /// Default underarm width.
    pub const DEFAULT_UNDERARM_CM: f64 = 2.5;
    /// Default buttonhole count.
    pub const DEFAULT_BUTTONS: u32 = 6;

    /// Check that every depth is positive and finite, the ease is finite,
    /// and at least one button is requested.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), PatternError> {
        if !self.ease_cm.is_finite() {
            return Err(PatternError::InvalidConfig(format!(
                "ease_cm must be finite, got {}",
                self.ease_cm
            )));
        }
        let depths = [
            ("hem_depth_cm", self.hem_depth_cm),
            ("cuff_depth_cm", self.cuff_depth_cm),
            ("neckband_depth_cm", self.neckband_depth_cm),
            ("turtleneck_depth_cm", self.turtleneck_depth_cm),
            ("band_depth_cm", self.band_depth_cm),
            ("underarm_cm", self.underarm_cm),
        ];
        for (name, value) in depths {
            if !value.is_finite() || value <= 0.0 || value > Measurements::MAX_CM {
                return Err(PatternError::InvalidConfig(format!(
                    "{name} must be positive and at most {} cm, got {value}",
                    Measurements::MAX_CM
                )));
            }
        }
        if self.buttons == 0 {
            return Err(PatternError::InvalidConfig(
                "buttons must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ease_cm: Self::DEFAULT_EASE_CM,
            hem_depth_cm: Self::DEFAULT_HEM_DEPTH_CM,
            cuff_depth_cm: Self::DEFAULT_CUFF_DEPTH_CM,
            neckband_depth_cm: Self::DEFAULT_NECKBAND_DEPTH_CM,
            turtleneck_depth_cm: Self::DEFAULT_TURTLENECK_DEPTH_CM,
            band_depth_cm: Self::DEFAULT_BAND_DEPTH_CM,
            underarm_cm: Self::DEFAULT_UNDERARM_CM,
            buttons: Self::DEFAULT_BUTTONS,
            shaping_bias: ShapingBias::default(),
        }
    }
}

// ───────────────────────── Generated pattern ─────────────────────────

/// Whether a piece is worked back and forth or in the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Work {
    /// Back and forth in rows, alternating right and wrong side.
    Flat,
    /// In continuous rounds, always on the right side.
    Round,
}

/// One row instruction of a piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// 1-based row number within the piece.
    pub number: u32,
    /// Instruction text in the shared pattern vocabulary.
    pub text: String,
    /// Stitches on the needles after the row; for rows inside a repeated
    /// section this is the count after the final pass.
    pub stitch_count: u32,
}

/// One knitted component of a garment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Stable identifier, e.g. `back` or `left-sleeve`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Working method.
    pub work: Work,
    /// Rows in knitting order.
    pub rows: Vec<Row>,
}

impl Piece {
    /// Number of row instructions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the piece has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stitch count after the last row, if any.
    #[must_use]
    pub fn final_stitch_count(&self) -> Option<u32> {
        self.rows.last().map(|row| row.stitch_count)
    }
}

/// A complete generated pattern.
///
/// Self-contained: everything needed to re-hydrate, render, or parse the
/// pattern is carried inline. Immutable once produced; edits require
/// regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPattern {
    /// Record format version.
    pub version: u8,
    /// Short human-readable title.
    pub title: String,
    /// The analysis the pattern was generated from.
    pub analysis: GarmentAnalysis,
    /// Measurements as supplied (before ease).
    pub measurements: Measurements,
    /// Gauge used for every conversion.
    pub gauge: Gauge,
    /// Generator configuration.
    pub config: GeneratorConfig,
    /// Stitch and row targets after ease.
    pub targets: SegmentTargets,
    /// When the pattern was generated.
    pub created_at: DateTime<Utc>,
    /// Pieces in the order they should be knitted.
    pub pieces: Vec<Piece>,
}

impl GeneratedPattern {
    /// Current record format version.
    pub const FORMAT_VERSION: u8 = 1;

    /// Look up a piece by id.
    #[must_use]
    pub fn piece(&self, id: &str) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.id == id)
    }
}

// ───────────────────────── Errors ────────────────────────────────────

/// Errors reported by the engine.
///
/// Serializable so a failure can be persisted or sent across a worker
/// boundary together with the request that caused it.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PatternError {
    /// A body measurement is missing, non-positive, or not finite.
    #[error("invalid measurement `{name}`: {value} (expected a positive number of centimeters)")]
    InvalidMeasurement {
        /// Measurement name.
        name: String,
        /// Offending value.
        value: f64,
    },

    /// The gauge is zero, negative, or not finite.
    #[error("invalid gauge: {stitches_per_10cm} stitches and {rows_per_10cm} rows per 10 cm")]
    InvalidGauge {
        /// Stitches per 10 cm as supplied.
        stitches_per_10cm: f64,
        /// Rows per 10 cm as supplied.
        rows_per_10cm: f64,
    },

    /// Generator configuration is invalid.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// A stitch transition cannot be worked in the rows available.
    #[error("cannot shape from {start} to {end} stitches in {rows} rows")]
    ImpossibleShaping {
        /// Stitches at the start of the span.
        start: u32,
        /// Stitches required at the end of the span.
        end: u32,
        /// Shaping rows available.
        rows: u32,
    },

    /// The garment or stitch pattern is outside what the generator supports.
    #[error("unsupported construction: {0}")]
    UnsupportedConstruction(String),

    /// The analysis is not good enough to generate from.
    #[error("garment analysis is insufficient to generate a pattern{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    InsufficientAnalysis {
        /// Rejection reason reported by the analysis, if any.
        reason: Option<String>,
    },

    /// Generated instructions disagree with the computed stitch counts.
    #[error("piece `{piece}` is inconsistent at row {row}: expected {expected} stitches, found {actual}")]
    InconsistentPattern {
        /// Piece id.
        piece: String,
        /// Row number (0 for the piece as a whole).
        row: u32,
        /// Stitch count the generator computed.
        expected: i64,
        /// Stitch count the instructions produce.
        actual: i64,
    },

    /// Repeat notation is nested, unterminated, or otherwise invalid.
    #[error("malformed repeat at row {row}: {reason}")]
    MalformedRepeat {
        /// Row where the problem was detected.
        row: u32,
        /// What is wrong.
        reason: String,
    },

    /// A row's stitch annotation disagrees with its instructions.
    #[error("row {row} declares {declared} stitches but its instructions produce {computed}")]
    StitchCountMismatch {
        /// Row number.
        row: u32,
        /// Count written in the annotation.
        declared: u32,
        /// Count the instructions produce.
        computed: i64,
    },

    /// A row leaves fewer than zero stitches on the needles.
    #[error("row {row} leaves a negative stitch count ({count})")]
    NegativeStitchCount {
        /// Row number.
        row: u32,
        /// Computed count.
        count: i64,
    },

    /// Row numbers are not 1, 2, 3, ...
    #[error("row numbers are not contiguous: expected row {expected}, found {found}")]
    NonContiguousRows {
        /// Expected row number.
        expected: u32,
        /// Row number found.
        found: u32,
    },

    /// Tried to advance past the end of a completed piece.
    #[error("piece is already complete")]
    AlreadyComplete,

    /// Tried to retreat before the first row.
    #[error("piece has not been started")]
    AlreadyAtStart,

    /// Requested row is outside the piece.
    #[error("row {row} is out of range (piece has {total} rows)")]
    RowOutOfRange {
        /// Requested row.
        row: u32,
        /// Rows in the piece.
        total: u32,
    },

    /// Requested repeat iteration is not valid for the row.
    #[error("repeat iteration {iteration} is not valid at row {row}")]
    InvalidIteration {
        /// Row number.
        row: u32,
        /// Requested iteration.
        iteration: u32,
    },

    /// Progress record belongs to a different piece.
    #[error("progress belongs to piece `{found}`, not `{expected}`")]
    PieceMismatch {
        /// Piece being tracked.
        expected: String,
        /// Piece named in the progress record.
        found: String,
    },

    /// Progress refers to a marker the piece never declares.
    #[error("marker `{0}` is not declared in this piece")]
    UnknownMarker(String),
}
