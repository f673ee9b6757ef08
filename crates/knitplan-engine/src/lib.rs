//! knitplan-engine: Pure knitting pattern engine (sans-IO).
//!
//! Turns a garment analysis, body measurements, and a gauge into a
//! row-by-row pattern, then tracks a knitter's progress through it:
//! normalize -> shape -> generate pieces -> parse instructions -> track.
//!
//! This crate has **no I/O dependencies** and does not log -- every
//! operation takes in-memory records and returns a `Result`. Files,
//! terminals, and logging live in `knitplan-cli`.

pub mod construction;
pub mod diagnostics;
pub mod generate;
pub mod normalize;
pub mod parse;
pub mod presets;
pub mod progress;
pub mod shaping;
pub mod types;
pub mod vocabulary;

pub use construction::{Construction, ConstructionKind};
pub use diagnostics::{PatternDiagnostics, PieceSummary};
pub use generate::{generate, generate_with};
pub use normalize::{SegmentTargets, normalize};
pub use parse::{ParsedInstruction, ParsedPiece, parse, parse_pattern};
pub use presets::{MeasurementOverrides, SizePreset, significant_changes};
pub use progress::{KnittingProgress, ProgressState, Tracker};
pub use shaping::{ShapingBias, ShapingSchedule, distribute_shaping};
pub use types::{
    Confidence, ConstructionMethod, GarmentAnalysis, GarmentType, Gauge, GeneratedPattern,
    GeneratorConfig, Measurements, Neckline, PatternError, Piece, Row, SleeveStyle,
    StitchPattern, Work,
};
