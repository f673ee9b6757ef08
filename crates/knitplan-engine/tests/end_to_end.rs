//! End-to-end tests: generate -> parse -> track across every supported
//! garment, construction, neckline, sleeve length, and fabric.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{DateTime, Utc};
use knitplan_engine::{
    Confidence, ConstructionKind, ConstructionMethod, GarmentAnalysis, GarmentType, Gauge,
    GeneratedPattern, GeneratorConfig, KnittingProgress, Neckline, PatternDiagnostics,
    PatternError, ProgressState, SizePreset, SleeveStyle, StitchPattern, Tracker, generate_with,
    parse, parse_pattern,
};

const GARMENTS: [GarmentType; 3] = [
    GarmentType::Pullover,
    GarmentType::Cardigan,
    GarmentType::Vest,
];
const METHODS: [ConstructionMethod; 4] = [
    ConstructionMethod::SetInSleeve,
    ConstructionMethod::Raglan,
    ConstructionMethod::DropShoulder,
    ConstructionMethod::SeamlessTopDown,
];
const NECKLINES: [Neckline; 5] = [
    Neckline::Crew,
    Neckline::VNeck,
    Neckline::Scoop,
    Neckline::Boat,
    Neckline::Turtleneck,
];
const SLEEVES: [SleeveStyle; 4] = [
    SleeveStyle::Long,
    SleeveStyle::ThreeQuarter,
    SleeveStyle::Short,
    SleeveStyle::Sleeveless,
];
const FABRICS: [StitchPattern; 4] = [
    StitchPattern::Stockinette,
    StitchPattern::Garter,
    StitchPattern::Seed,
    StitchPattern::Ribbing,
];

fn analysis(
    garment_type: GarmentType,
    construction: ConstructionMethod,
    neckline: Neckline,
    sleeve_style: SleeveStyle,
    stitch_pattern: StitchPattern,
) -> GarmentAnalysis {
    GarmentAnalysis {
        garment_type,
        construction,
        stitch_pattern,
        neckline,
        sleeve_style,
        confidence: Confidence::High,
        rejection_reason: None,
    }
}

fn gauge() -> Gauge {
    Gauge {
        stitches_per_10cm: 22.0,
        rows_per_10cm: 30.0,
    }
}

fn run(analysis: &GarmentAnalysis) -> Result<GeneratedPattern, PatternError> {
    generate_with(
        analysis,
        &SizePreset::M.measurements(),
        &gauge(),
        &GeneratorConfig::default(),
        DateTime::<Utc>::UNIX_EPOCH,
    )
}

/// Every analysis the generator accepts.
fn supported() -> Vec<GarmentAnalysis> {
    let mut all = Vec::new();
    for garment in GARMENTS {
        for method in METHODS {
            for neckline in NECKLINES {
                for sleeve in SLEEVES {
                    for fabric in FABRICS {
                        let a = analysis(garment, method, neckline, sleeve, fabric);
                        if ConstructionKind::resolve(&a).is_ok() {
                            all.push(a);
                        }
                    }
                }
            }
        }
    }
    all
}

fn top_down_pullover() -> GeneratedPattern {
    run(&analysis(
        GarmentType::Pullover,
        ConstructionMethod::SeamlessTopDown,
        Neckline::Crew,
        SleeveStyle::Long,
        StitchPattern::Stockinette,
    ))
    .unwrap()
}

#[test]
fn every_supported_combination_generates_and_parses() {
    let all = supported();
    // Vests skip raglan and top-down, cardigans skip top-down.
    assert_eq!(all.len(), (4 + 3 + 2) * 5 * 4 * 4);

    for a in &all {
        let pattern = run(a).unwrap_or_else(|e| panic!("{a:?}: {e}"));
        let parsed = parse_pattern(&pattern).unwrap();
        assert_eq!(parsed.len(), pattern.pieces.len());

        for (piece, parsed) in pattern.pieces.iter().zip(&parsed) {
            assert_eq!(parsed.piece_id, piece.id);
            assert_eq!(parsed.total_rows as usize, piece.rows.len());
            assert_eq!(parsed.final_stitch_count(), 0, "{} of {a:?}", piece.id);
            for (row, instruction) in piece.rows.iter().zip(&parsed.instructions) {
                assert_eq!(row.stitch_count, instruction.stitch_count, "{}", row.text);
            }
        }
    }
}

#[test]
fn every_size_generates_at_loose_and_tight_gauges() {
    let gauges = [(16.0, 22.0), (18.8, 24.0), (24.379, 24.0), (28.0, 38.0)];
    let stockinette: Vec<GarmentAnalysis> = supported()
        .into_iter()
        .filter(|a| a.stitch_pattern == StitchPattern::Stockinette)
        .collect();

    for size in SizePreset::ALL {
        for (stitches_per_10cm, rows_per_10cm) in gauges {
            let gauge = Gauge {
                stitches_per_10cm,
                rows_per_10cm,
            };
            for a in &stockinette {
                let pattern = generate_with(
                    a,
                    &size.measurements(),
                    &gauge,
                    &GeneratorConfig::default(),
                    DateTime::<Utc>::UNIX_EPOCH,
                )
                .unwrap_or_else(|e| panic!("{size:?} {gauge:?} {a:?}: {e}"));
                for parsed in parse_pattern(&pattern).unwrap() {
                    assert_eq!(parsed.final_stitch_count(), 0, "{}", parsed.piece_id);
                }
            }
        }
    }
}

#[test]
fn unsupported_combinations_are_refused() {
    for (garment, method) in [
        (GarmentType::Cardigan, ConstructionMethod::SeamlessTopDown),
        (GarmentType::Vest, ConstructionMethod::SeamlessTopDown),
        (GarmentType::Vest, ConstructionMethod::Raglan),
        (GarmentType::Other, ConstructionMethod::SetInSleeve),
        (GarmentType::Pullover, ConstructionMethod::Other),
    ] {
        let result = run(&analysis(
            garment,
            method,
            Neckline::Crew,
            SleeveStyle::Long,
            StitchPattern::Stockinette,
        ));
        assert!(
            matches!(result, Err(PatternError::UnsupportedConstruction(_))),
            "{garment:?} {method:?}"
        );
    }
}

#[test]
fn parsing_is_idempotent() {
    let pattern = top_down_pullover();
    for piece in &pattern.pieces {
        assert_eq!(parse(piece).unwrap(), parse(piece).unwrap());
    }
}

#[test]
fn section_ends_carry_the_final_pass_count() {
    let pattern = top_down_pullover();
    for parsed in parse_pattern(&pattern).unwrap() {
        for section in &parsed.sections {
            let before = parsed
                .instruction(section.first_row - 1)
                .map_or(0, |i| i64::from(i.stitch_count));
            let last = parsed.instruction(section.last_row).unwrap();
            assert_eq!(
                i64::from(last.stitch_count),
                before + i64::from(section.times) * section.stitch_delta,
                "{} rows {}-{}",
                parsed.piece_id,
                section.first_row,
                section.last_row
            );
        }
    }
}

#[test]
fn tracker_walks_a_piece_to_completion() {
    let pattern = top_down_pullover();
    let parsed = parse(pattern.piece("yoke-and-body").unwrap()).unwrap();
    let mut tracker = Tracker::new(&parsed);
    assert_eq!(tracker.state(), ProgressState::NotStarted);

    let mut steps = 0u64;
    while tracker.state() != ProgressState::Completed {
        tracker.advance_row().unwrap();
        steps += 1;
    }
    assert_eq!(steps, parsed.worked_rows());
    assert_eq!(tracker.worked_rows(), parsed.worked_rows());
    assert_eq!(tracker.stitch_count(), 0);
    assert_eq!(tracker.advance_row(), Err(PatternError::AlreadyComplete));
}

#[test]
fn jumping_back_and_forth_reproduces_marker_offsets() {
    let pattern = top_down_pullover();
    let parsed = parse(pattern.piece("yoke-and-body").unwrap()).unwrap();
    let mut tracker = Tracker::new(&parsed);

    tracker.jump_to_row(12).unwrap();
    let at_twelve = tracker.progress().clone();
    assert!(at_twelve.marker_offsets.values().any(|offset| *offset > 0));

    tracker.jump_to_row(0).unwrap();
    assert!(tracker.progress().marker_offsets.values().all(|offset| *offset == 0));
    assert_eq!(tracker.state(), ProgressState::NotStarted);

    tracker.jump_to_row(12).unwrap();
    assert_eq!(tracker.progress(), &at_twelve);
}

#[test]
fn stored_progress_restores_through_json() {
    let pattern = top_down_pullover();
    let parsed = parse(pattern.piece("yoke-and-body").unwrap()).unwrap();
    let mut tracker = Tracker::new(&parsed);
    for _ in 0..40 {
        tracker.advance_row().unwrap();
    }
    let count = tracker.stitch_count();

    let json = serde_json::to_string(tracker.progress()).unwrap();
    let stored: KnittingProgress = serde_json::from_str(&json).unwrap();
    let restored = Tracker::restore(&parsed, &stored).unwrap();
    assert_eq!(restored.progress(), tracker.progress());
    assert_eq!(restored.stitch_count(), count);
}

#[test]
fn progress_for_another_piece_is_refused() {
    let pattern = top_down_pullover();
    let parsed = parse_pattern(&pattern).unwrap();
    let body = &parsed[0];
    let other = &parsed[1];
    let progress = KnittingProgress::new(other);
    assert!(matches!(
        Tracker::restore(body, &progress),
        Err(PatternError::PieceMismatch { .. })
    ));
}

#[test]
fn diagnostics_agree_with_the_parsed_pieces() {
    let pattern = top_down_pullover();
    let diagnostics = PatternDiagnostics::for_pattern(&pattern).unwrap();
    let parsed = parse_pattern(&pattern).unwrap();
    assert_eq!(diagnostics.pieces.len(), parsed.len());
    assert_eq!(
        diagnostics.total_worked_rows(),
        parsed.iter().map(knitplan_engine::ParsedPiece::worked_rows).sum::<u64>()
    );
    assert!(diagnostics.report().contains(&pattern.title));
}

#[test]
fn pattern_survives_a_json_round_trip() {
    let pattern = top_down_pullover();
    let json = serde_json::to_string(&pattern).unwrap();
    let back: GeneratedPattern = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pattern);
}
