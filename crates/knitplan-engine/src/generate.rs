//! Pattern generation entry points.
//!
//! ```text
//! analysis ──► refuse if insufficient ──► validate config
//!          ──► resolve construction + fabric
//!          ──► ease + normalize ──► piece builders ──► re-parse every piece
//! ```

use chrono::{DateTime, Utc};

use crate::construction::fabric::Fabric;
use crate::construction::{Construction, ConstructionKind, Plan};
use crate::normalize::normalize;
use crate::parse::parse;
use crate::types::{
    Confidence, GarmentAnalysis, GarmentType, Gauge, GeneratedPattern, GeneratorConfig,
    Measurements, Neckline, PatternError, Piece, SleeveStyle,
};

/// Generate a pattern with the default configuration, stamped now.
///
/// # Errors
///
/// See [`generate_with`].
pub fn generate(
    analysis: &GarmentAnalysis,
    measurements: &Measurements,
    gauge: &Gauge,
) -> Result<GeneratedPattern, PatternError> {
    generate_with(
        analysis,
        measurements,
        gauge,
        &GeneratorConfig::default(),
        Utc::now(),
    )
}

/// Generate a pattern. Deterministic: the same inputs always produce the
/// same pattern.
///
/// # Errors
///
/// - [`PatternError::InsufficientAnalysis`] if the analysis has
///   insufficient confidence or a rejection reason (checked first).
/// - [`PatternError::InvalidConfig`] for a bad configuration.
/// - [`PatternError::UnsupportedConstruction`] for garments, methods,
///   combinations, or stitch patterns the generator cannot write.
/// - [`PatternError::InvalidGauge`] / [`PatternError::InvalidMeasurement`]
///   for bad inputs.
/// - [`PatternError::ImpossibleShaping`] when a shaping span does not fit.
/// - [`PatternError::InconsistentPattern`] if a generated piece does not
///   parse back to the counts it was written with.
pub fn generate_with(
    analysis: &GarmentAnalysis,
    measurements: &Measurements,
    gauge: &Gauge,
    config: &GeneratorConfig,
    created_at: DateTime<Utc>,
) -> Result<GeneratedPattern, PatternError> {
    if analysis.confidence == Confidence::Insufficient || analysis.rejection_reason.is_some() {
        return Err(PatternError::InsufficientAnalysis {
            reason: analysis.rejection_reason.clone(),
        });
    }
    config.validate()?;
    let kind = ConstructionKind::resolve(analysis)?;
    let fabric = Fabric::from_stitch_pattern(analysis.stitch_pattern)?;

    gauge.validate()?;
    measurements.validate()?;
    let eased = measurements.with_ease(config.ease_cm);
    let targets = normalize(&eased, gauge)?;

    let plan = Plan {
        analysis,
        config,
        gauge: *gauge,
        measurements: eased,
        targets,
        fabric,
    };
    let pieces = kind.pieces(&plan)?;
    for piece in &pieces {
        verify(piece)?;
    }

    Ok(GeneratedPattern {
        version: GeneratedPattern::FORMAT_VERSION,
        title: title(analysis, kind, fabric),
        analysis: analysis.clone(),
        measurements: *measurements,
        gauge: *gauge,
        config: config.clone(),
        targets,
        created_at,
        pieces,
    })
}

/// Re-parse a generated piece and compare every row's count, and check
/// that the piece ends bound off.
///
/// # Errors
///
/// Returns [`PatternError::InconsistentPattern`] on any disagreement.
pub fn verify(piece: &Piece) -> Result<(), PatternError> {
    let inconsistent = |row, expected, actual| PatternError::InconsistentPattern {
        piece: piece.id.clone(),
        row,
        expected,
        actual,
    };
    let parsed = parse(piece).map_err(|err| match err {
        PatternError::StitchCountMismatch {
            row,
            declared,
            computed,
        } => inconsistent(row, i64::from(declared), computed),
        other => other,
    })?;

    for (row, instruction) in piece.rows.iter().zip(&parsed.instructions) {
        if row.stitch_count != instruction.stitch_count {
            return Err(inconsistent(
                row.number,
                i64::from(row.stitch_count),
                i64::from(instruction.stitch_count),
            ));
        }
    }
    match parsed.final_stitch_count() {
        0 => Ok(()),
        left => Err(inconsistent(parsed.total_rows, 0, i64::from(left))),
    }
}

/// Short title such as "Crew-neck set-in sleeve pullover in stockinette".
#[must_use]
pub fn title(analysis: &GarmentAnalysis, kind: ConstructionKind, fabric: Fabric) -> String {
    let neck = match analysis.neckline {
        Neckline::Crew => "crew-neck",
        Neckline::VNeck => "V-neck",
        Neckline::Scoop => "scoop-neck",
        Neckline::Boat => "boat-neck",
        Neckline::Turtleneck => "turtleneck",
    };
    let sleeves = match (analysis.garment_type, analysis.sleeve_style) {
        (GarmentType::Vest, _) | (_, SleeveStyle::Long) => "",
        (_, SleeveStyle::ThreeQuarter) => " three-quarter-sleeve",
        (_, SleeveStyle::Short) => " short-sleeve",
        (_, SleeveStyle::Sleeveless) => " sleeveless",
    };
    let garment = match analysis.garment_type {
        GarmentType::Pullover => "pullover",
        GarmentType::Cardigan => "cardigan",
        GarmentType::Vest => "vest",
        GarmentType::Other => "garment",
    };
    let title = format!("{neck}{sleeves} {} {garment} in {}", kind.name(), fabric.name());
    let mut chars = title.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::presets::SizePreset;
    use crate::types::{ConstructionMethod, StitchPattern};

    fn analysis(construction: ConstructionMethod) -> GarmentAnalysis {
        GarmentAnalysis {
            garment_type: GarmentType::Pullover,
            construction,
            stitch_pattern: StitchPattern::Stockinette,
            neckline: Neckline::Crew,
            sleeve_style: SleeveStyle::Long,
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

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn run(analysis: &GarmentAnalysis) -> Result<GeneratedPattern, PatternError> {
        generate_with(
            analysis,
            &SizePreset::M.measurements(),
            &gauge(),
            &GeneratorConfig::default(),
            stamp(),
        )
    }

    #[test]
    fn insufficient_analysis_is_refused_first() {
        let mut a = analysis(ConstructionMethod::Other);
        a.confidence = Confidence::Insufficient;
        assert_eq!(
            run(&a),
            Err(PatternError::InsufficientAnalysis { reason: None })
        );

        let mut a = analysis(ConstructionMethod::SetInSleeve);
        a.rejection_reason = Some("not a garment".to_string());
        assert_eq!(
            run(&a),
            Err(PatternError::InsufficientAnalysis {
                reason: Some("not a garment".to_string())
            })
        );
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = GeneratorConfig {
            hem_depth_cm: 0.0,
            ..GeneratorConfig::default()
        };
        let result = generate_with(
            &analysis(ConstructionMethod::SetInSleeve),
            &SizePreset::M.measurements(),
            &gauge(),
            &config,
            stamp(),
        );
        assert!(matches!(result, Err(PatternError::InvalidConfig(_))));
    }

    #[test]
    fn cables_are_unsupported() {
        let mut a = analysis(ConstructionMethod::SetInSleeve);
        a.stitch_pattern = StitchPattern::Cable;
        assert!(matches!(
            run(&a),
            Err(PatternError::UnsupportedConstruction(_))
        ));
    }

    #[test]
    fn gauge_is_checked_before_measurements() {
        let measurements = Measurements {
            chest: -1.0,
            ..SizePreset::M.measurements()
        };
        let result = generate_with(
            &analysis(ConstructionMethod::SetInSleeve),
            &measurements,
            &Gauge {
                stitches_per_10cm: 0.0,
                rows_per_10cm: 30.0,
            },
            &GeneratorConfig::default(),
            stamp(),
        );
        assert!(matches!(result, Err(PatternError::InvalidGauge { .. })));
    }

    #[test]
    fn ease_cannot_rescue_a_bad_measurement() {
        let measurements = Measurements {
            chest: -2.0,
            ..SizePreset::M.measurements()
        };
        let result = generate_with(
            &analysis(ConstructionMethod::SetInSleeve),
            &measurements,
            &gauge(),
            &GeneratorConfig::default(),
            stamp(),
        );
        assert!(matches!(
            result,
            Err(PatternError::InvalidMeasurement { .. })
        ));
    }

    #[test]
    fn generation_is_deterministic() {
        let a = analysis(ConstructionMethod::Raglan);
        assert_eq!(run(&a).unwrap(), run(&a).unwrap());
    }

    #[test]
    fn pattern_records_inputs_and_eased_targets() {
        let pattern = run(&analysis(ConstructionMethod::SetInSleeve)).unwrap();
        assert_eq!(pattern.version, GeneratedPattern::FORMAT_VERSION);
        assert_eq!(pattern.measurements, SizePreset::M.measurements());
        // 96 cm + 8 cm ease at 22 sts / 10 cm.
        assert_eq!(pattern.targets.chest_stitches, 229);
        assert_eq!(pattern.created_at, stamp());
        assert_eq!(
            pattern.title,
            "Crew-neck set-in sleeve pullover in stockinette"
        );
    }

    #[test]
    fn verify_catches_a_wrong_count() {
        let mut pattern = run(&analysis(ConstructionMethod::DropShoulder)).unwrap();
        let back = &mut pattern.pieces[0];
        back.rows[3].stitch_count += 1;
        assert!(matches!(
            verify(back),
            Err(PatternError::InconsistentPattern { row: 4, .. })
        ));
    }

    #[test]
    fn verify_requires_a_bound_off_piece() {
        let mut pattern = run(&analysis(ConstructionMethod::DropShoulder)).unwrap();
        let back = &mut pattern.pieces[0];
        back.rows.pop();
        assert!(matches!(
            verify(back),
            Err(PatternError::InconsistentPattern { expected: 0, .. })
        ));
    }

    #[test]
    fn absurd_gauge_is_refused_before_building() {
        for gauge in [
            Gauge {
                stitches_per_10cm: 1e12,
                rows_per_10cm: 30.0,
            },
            Gauge {
                stitches_per_10cm: 22.0,
                rows_per_10cm: 1e12,
            },
        ] {
            let result = generate_with(
                &analysis(ConstructionMethod::SetInSleeve),
                &SizePreset::M.measurements(),
                &gauge,
                &GeneratorConfig::default(),
                stamp(),
            );
            assert!(
                matches!(result, Err(PatternError::InvalidGauge { .. })),
                "{gauge:?}: {result:?}"
            );
        }
    }

    #[test]
    fn titles_describe_the_garment() {
        let mut a = analysis(ConstructionMethod::SeamlessTopDown);
        a.sleeve_style = SleeveStyle::Short;
        a.neckline = Neckline::VNeck;
        assert_eq!(
            title(&a, ConstructionKind::SeamlessTopDown, Fabric::Garter),
            "V-neck short-sleeve seamless top-down pullover in garter stitch"
        );
    }
}
