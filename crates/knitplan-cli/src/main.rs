//! knitplan: generate knitting patterns and track progress through them.
//!
//! Three subcommands over JSON files:
//!
//! - `generate`: garment analysis + size/measurements + gauge -> pattern
//! - `parse`: stored pattern -> per-piece structure and diagnostics
//! - `track`: advance, retreat, jump, or reset a stored progress record
//!
//! # Usage
//!
//! ```text
//! knitplan generate --size M --stitches 22 --rows 30 --construction raglan -o sweater.json
//! knitplan parse sweater.json
//! knitplan track sweater.json back.progress.json --piece back advance 4
//! ```
//!
//! Results go to stdout (or the named file); logs and reports go to
//! stderr. Set `RUST_LOG` or pass `-v` for more detail.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use knitplan_engine::presets::DEFAULT_SIGNIFICANT_CHANGE;
use knitplan_engine::{
    Confidence, ConstructionMethod, GarmentAnalysis, GarmentType, Gauge, GeneratedPattern,
    GeneratorConfig, KnittingProgress, MeasurementOverrides, Neckline, ParsedPiece,
    PatternDiagnostics, ShapingBias, SizePreset, SleeveStyle, StitchPattern, Tracker,
    significant_changes,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Knitting pattern generator and row tracker.
#[derive(Parser)]
#[command(name = "knitplan", version)]
struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
#[allow(clippy::large_enum_variant)]
enum Command {
    /// Generate a pattern and write it as JSON.
    Generate(GenerateArgs),
    /// Parse a stored pattern and report on its pieces.
    Parse(ParseArgs),
    /// Move through a piece and persist the progress record.
    Track(TrackArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Garment analysis as a JSON file. Overrides the garment flags.
    #[arg(long)]
    analysis: Option<PathBuf>,

    /// Garment type.
    #[arg(long, value_enum, default_value_t = Garment::Pullover)]
    garment: Garment,

    /// Construction method.
    #[arg(long, value_enum, default_value_t = Method::SetInSleeve)]
    construction: Method,

    /// Main stitch pattern.
    #[arg(long, value_enum, default_value_t = Fabric::Stockinette)]
    stitch_pattern: Fabric,

    /// Neckline.
    #[arg(long, value_enum, default_value_t = Neck::Crew)]
    neckline: Neck,

    /// Sleeve length.
    #[arg(long, value_enum, default_value_t = Sleeves::Long)]
    sleeves: Sleeves,

    /// Size preset the measurements start from.
    #[arg(long, value_enum, default_value_t = Size::M)]
    size: Size,

    #[command(flatten)]
    overrides: MeasurementArgs,

    /// Stitches per 10 cm.
    #[arg(long)]
    stitches: f64,

    /// Rows per 10 cm.
    #[arg(long)]
    rows: f64,

    /// Wearing ease in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_EASE_CM)]
    ease: f64,

    /// Hem rib depth in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_HEM_DEPTH_CM)]
    hem_depth: f64,

    /// Cuff rib depth in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_CUFF_DEPTH_CM)]
    cuff_depth: f64,

    /// Neckband depth in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_NECKBAND_DEPTH_CM)]
    neckband_depth: f64,

    /// Turtleneck collar depth in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_TURTLENECK_DEPTH_CM)]
    turtleneck_depth: f64,

    /// Front and armhole band depth in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_BAND_DEPTH_CM)]
    band_depth: f64,

    /// Underarm width in cm.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_UNDERARM_CM)]
    underarm: f64,

    /// Cardigan buttonholes.
    #[arg(long, default_value_t = GeneratorConfig::DEFAULT_BUTTONS)]
    buttons: u32,

    /// Which end of a shaping span gets the closer spacing.
    #[arg(long, value_enum, default_value_t = Bias::Front)]
    bias: Bias,

    /// Full generator config as a JSON string.
    ///
    /// When provided, all other config flags are ignored.
    /// The JSON must be a valid `GeneratorConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the pattern JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a plain-text pattern document.
    #[arg(long)]
    text: Option<PathBuf>,

    /// Print the diagnostics report to stderr.
    #[arg(long)]
    report: bool,
}

/// Measurements replacing the preset's, in cm.
#[derive(Args)]
struct MeasurementArgs {
    #[arg(long)]
    chest: Option<f64>,
    #[arg(long)]
    body_length: Option<f64>,
    #[arg(long)]
    shoulder_width: Option<f64>,
    #[arg(long)]
    arm_length: Option<f64>,
    #[arg(long)]
    wrist: Option<f64>,
    #[arg(long)]
    bicep: Option<f64>,
    #[arg(long)]
    hip: Option<f64>,
}

#[derive(Args)]
struct ParseArgs {
    /// Pattern JSON written by `generate`.
    pattern: PathBuf,

    /// Only this piece.
    #[arg(long)]
    piece: Option<String>,

    /// Print the parsed pieces as JSON instead of the report.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TrackArgs {
    /// Pattern JSON written by `generate`.
    pattern: PathBuf,

    /// Progress record; created on first use.
    progress: PathBuf,

    /// Piece to track. Required when the progress file does not exist yet.
    #[arg(long)]
    piece: Option<String>,

    #[command(subcommand)]
    action: TrackAction,
}

#[derive(Subcommand, Clone, Copy)]
enum TrackAction {
    /// Show the current row without moving.
    Status,
    /// Work the next row(s).
    Advance {
        #[arg(default_value_t = 1)]
        rows: u32,
    },
    /// Un-work the last row(s).
    Retreat {
        #[arg(default_value_t = 1)]
        rows: u32,
    },
    /// Go to the first time a row is completed.
    Jump { row: u32 },
    /// Back to the start.
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum Garment {
    Pullover,
    Cardigan,
    Vest,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    SetInSleeve,
    Raglan,
    DropShoulder,
    SeamlessTopDown,
}

#[derive(Clone, Copy, ValueEnum)]
enum Fabric {
    Stockinette,
    Garter,
    Seed,
    Ribbing,
}

#[derive(Clone, Copy, ValueEnum)]
enum Neck {
    Crew,
    VNeck,
    Scoop,
    Boat,
    Turtleneck,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sleeves {
    Long,
    ThreeQuarter,
    Short,
    Sleeveless,
}

#[derive(Clone, Copy, ValueEnum)]
enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

#[derive(Clone, Copy, ValueEnum)]
enum Bias {
    /// Closer spacing at the start of the span.
    Front,
    /// Closer spacing at the end of the span.
    Back,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(&args),
        Command::Parse(args) => run_parse(&args),
        Command::Track(args) => run_track(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            tracing::error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ───────────────────────── generate ──────────────────────────────────

/// Build a [`GeneratorConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual config flags are ignored.
fn config_from_cli(args: &GenerateArgs) -> Result<GeneratorConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(GeneratorConfig {
        ease_cm: args.ease,
        hem_depth_cm: args.hem_depth,
        cuff_depth_cm: args.cuff_depth,
        neckband_depth_cm: args.neckband_depth,
        turtleneck_depth_cm: args.turtleneck_depth,
        band_depth_cm: args.band_depth,
        underarm_cm: args.underarm,
        buttons: args.buttons,
        shaping_bias: match args.bias {
            Bias::Front => ShapingBias::FrontLoaded,
            Bias::Back => ShapingBias::BackLoaded,
        },
    })
}

/// The garment analysis from `--analysis` or the garment flags.
fn analysis_from_cli(args: &GenerateArgs) -> Result<GarmentAnalysis, String> {
    if let Some(ref path) = args.analysis {
        return read_json(path);
    }

    Ok(GarmentAnalysis {
        garment_type: match args.garment {
            Garment::Pullover => GarmentType::Pullover,
            Garment::Cardigan => GarmentType::Cardigan,
            Garment::Vest => GarmentType::Vest,
        },
        construction: match args.construction {
            Method::SetInSleeve => ConstructionMethod::SetInSleeve,
            Method::Raglan => ConstructionMethod::Raglan,
            Method::DropShoulder => ConstructionMethod::DropShoulder,
            Method::SeamlessTopDown => ConstructionMethod::SeamlessTopDown,
        },
        stitch_pattern: match args.stitch_pattern {
            Fabric::Stockinette => StitchPattern::Stockinette,
            Fabric::Garter => StitchPattern::Garter,
            Fabric::Seed => StitchPattern::Seed,
            Fabric::Ribbing => StitchPattern::Ribbing,
        },
        neckline: match args.neckline {
            Neck::Crew => Neckline::Crew,
            Neck::VNeck => Neckline::VNeck,
            Neck::Scoop => Neckline::Scoop,
            Neck::Boat => Neckline::Boat,
            Neck::Turtleneck => Neckline::Turtleneck,
        },
        sleeve_style: match args.sleeves {
            Sleeves::Long => SleeveStyle::Long,
            Sleeves::ThreeQuarter => SleeveStyle::ThreeQuarter,
            Sleeves::Short => SleeveStyle::Short,
            Sleeves::Sleeveless => SleeveStyle::Sleeveless,
        },
        confidence: Confidence::High,
        rejection_reason: None,
    })
}

const fn preset_from_cli(size: Size) -> SizePreset {
    match size {
        Size::Xs => SizePreset::Xs,
        Size::S => SizePreset::S,
        Size::M => SizePreset::M,
        Size::L => SizePreset::L,
        Size::Xl => SizePreset::Xl,
        Size::Xxl => SizePreset::Xxl,
    }
}

fn run_generate(args: &GenerateArgs) -> Result<(), String> {
    let config = config_from_cli(args)?;
    let analysis = analysis_from_cli(args)?;
    let preset = preset_from_cli(args.size);
    let overrides = MeasurementOverrides {
        chest: args.overrides.chest,
        body_length: args.overrides.body_length,
        shoulder_width: args.overrides.shoulder_width,
        arm_length: args.overrides.arm_length,
        wrist: args.overrides.wrist,
        bicep: args.overrides.bicep,
        hip: args.overrides.hip,
    };
    let measurements = overrides.apply(preset.measurements());
    for change in significant_changes(preset, &measurements, DEFAULT_SIGNIFICANT_CHANGE) {
        warn!(
            "{} is {} cm, {:+.0}% from size {preset} ({} cm)",
            change.name,
            change.value,
            change.relative * 100.0,
            change.preset,
        );
    }
    let gauge = Gauge {
        stitches_per_10cm: args.stitches,
        rows_per_10cm: args.rows,
    };
    debug!(?analysis, ?measurements, ?gauge, ?config, "generating");

    let pattern = knitplan_engine::generate_with(
        &analysis,
        &measurements,
        &gauge,
        &config,
        Utc::now(),
    )
    .map_err(|e| format!("Generation failed: {e}"))?;
    info!(title = %pattern.title, pieces = pattern.pieces.len(), "generated");

    if args.report {
        let diagnostics = PatternDiagnostics::for_pattern(&pattern)
            .map_err(|e| format!("Diagnostics failed: {e}"))?;
        eprintln!("{}", diagnostics.report());
    }

    if let Some(ref path) = args.text {
        let description = format!("Size {preset}");
        let timestamp = pattern.created_at.to_rfc3339();
        let config_json = serde_json::to_string(&pattern.config)
            .map_err(|e| format!("Error serializing config: {e}"))?;
        let text = knitplan_export::to_text(
            &pattern,
            &knitplan_export::TextMetadata {
                description: Some(&description),
                timestamp: Some(&timestamp),
                config_json: Some(&config_json),
            },
        );
        write_file(path, &text)?;
    }

    let json = serde_json::to_string_pretty(&pattern)
        .map_err(|e| format!("Error serializing pattern: {e}"))?;
    match args.output {
        Some(ref path) => write_file(path, &json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

// ───────────────────────── parse ─────────────────────────────────────

fn run_parse(args: &ParseArgs) -> Result<(), String> {
    let pattern: GeneratedPattern = read_json(&args.pattern)?;
    let pieces: Vec<_> = match args.piece {
        Some(ref id) => vec![find_piece(&pattern, id)?],
        None => pattern.pieces.iter().collect(),
    };

    let parsed = pieces
        .iter()
        .copied()
        .map(knitplan_engine::parse)
        .collect::<Result<Vec<ParsedPiece>, _>>()
        .map_err(|e| format!("Parse failed: {e}"))?;
    info!(pieces = parsed.len(), "parsed");

    if args.json {
        let json = serde_json::to_string_pretty(&parsed)
            .map_err(|e| format!("Error serializing parsed pieces: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let diagnostics = PatternDiagnostics {
        title: pattern.title.clone(),
        pieces: pieces
            .iter()
            .copied()
            .map(knitplan_engine::PieceSummary::for_piece)
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Diagnostics failed: {e}"))?,
    };
    println!("{}", diagnostics.report());
    Ok(())
}

// ───────────────────────── track ─────────────────────────────────────

fn run_track(args: &TrackArgs) -> Result<(), String> {
    let pattern: GeneratedPattern = read_json(&args.pattern)?;

    let stored: Option<KnittingProgress> = if args.progress.exists() {
        Some(read_json(&args.progress)?)
    } else {
        None
    };
    let piece_id = match (&stored, &args.piece) {
        (Some(progress), Some(id)) if progress.piece_id != *id => {
            return Err(format!(
                "{} tracks piece {:?}, not {id:?}",
                args.progress.display(),
                progress.piece_id
            ));
        }
        (Some(progress), _) => progress.piece_id.clone(),
        (None, Some(id)) => id.clone(),
        (None, None) => {
            return Err(format!(
                "{} does not exist yet; pass --piece to start one",
                args.progress.display()
            ));
        }
    };

    let piece = find_piece(&pattern, &piece_id)?;
    let parsed = knitplan_engine::parse(piece).map_err(|e| format!("Parse failed: {e}"))?;
    let mut tracker = match stored {
        Some(ref progress) => Tracker::restore(&parsed, progress)
            .map_err(|e| format!("Cannot resume {}: {e}", args.progress.display()))?,
        None => Tracker::new(&parsed),
    };

    let moved = match args.action {
        TrackAction::Status => Ok(()),
        TrackAction::Advance { rows } => {
            (0..rows).try_for_each(|_| tracker.advance_row().map(|_| ()))
        }
        TrackAction::Retreat { rows } => {
            (0..rows).try_for_each(|_| tracker.retreat_row().map(|_| ()))
        }
        TrackAction::Jump { row } => tracker.jump_to_row(row).map(|_| ()),
        TrackAction::Reset => {
            tracker.reset();
            Ok(())
        }
    };
    // Rows moved before a failure are kept.
    if let Err(ref e) = moved {
        warn!("{e}");
    }

    println!("{}", status_line(&tracker));
    let json = serde_json::to_string_pretty(tracker.progress())
        .map_err(|e| format!("Error serializing progress: {e}"))?;
    write_file(&args.progress, &json)?;
    moved.map_err(|e| e.to_string())
}

/// One-line summary of where the knitter is.
fn status_line(tracker: &Tracker<'_>) -> String {
    let piece = tracker.piece();
    let progress = tracker.progress();
    let mut line = format!(
        "{}: row {}/{}",
        piece.name, progress.current_row, piece.total_rows
    );
    if let Some(section) = piece.section_of(progress.current_row) {
        let _ = write!(line, " (pass {}/{})", progress.repeat_iteration, section.times);
    }
    let _ = write!(line, ", {} sts", tracker.stitch_count());
    match tracker.next_instruction() {
        Some(next) => {
            let _ = write!(line, "\nNext: {}. {}", next.row, next.text);
        }
        None => line.push_str("\nComplete"),
    }
    line
}

// ───────────────────────── files ─────────────────────────────────────

fn find_piece<'a>(
    pattern: &'a GeneratedPattern,
    id: &str,
) -> Result<&'a knitplan_engine::Piece, String> {
    pattern.piece(id).ok_or_else(|| {
        let ids: Vec<&str> = pattern.pieces.iter().map(|p| p.id.as_str()).collect();
        format!("No piece {id:?}; pieces are {}", ids.join(", "))
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generate_args(extra: &[&str]) -> GenerateArgs {
        let mut argv = vec!["knitplan", "generate", "--stitches", "22", "--rows", "30"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Generate(args) => args,
            _ => unreachable!("parsed a generate command"),
        }
    }

    #[test]
    fn flag_defaults_match_the_default_config() {
        let config = config_from_cli(&generate_args(&[])).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn config_json_replaces_the_flags() {
        let args = generate_args(&["--ease", "2", "--config-json", r#"{"buttons": 4}"#]);
        let config = config_from_cli(&args).unwrap();
        assert_eq!(config.buttons, 4);
        assert!((config.ease_cm - GeneratorConfig::DEFAULT_EASE_CM).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let args = generate_args(&["--config-json", "{"]);
        assert!(config_from_cli(&args).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn garment_flags_build_the_analysis() {
        let args = generate_args(&[
            "--garment",
            "cardigan",
            "--construction",
            "drop-shoulder",
            "--neckline",
            "v-neck",
            "--sleeves",
            "three-quarter",
        ]);
        let analysis = analysis_from_cli(&args).unwrap();
        assert_eq!(analysis.garment_type, GarmentType::Cardigan);
        assert_eq!(analysis.construction, ConstructionMethod::DropShoulder);
        assert_eq!(analysis.neckline, Neckline::VNeck);
        assert_eq!(analysis.sleeve_style, SleeveStyle::ThreeQuarter);
        assert_eq!(analysis.confidence, Confidence::High);
    }

    #[test]
    fn track_actions_parse() {
        let cli = Cli::try_parse_from([
            "knitplan", "track", "p.json", "back.json", "--piece", "back", "advance", "3",
        ])
        .unwrap();
        let Command::Track(args) = cli.command else {
            unreachable!("parsed a track command");
        };
        assert_eq!(args.piece.as_deref(), Some("back"));
        assert!(matches!(args.action, TrackAction::Advance { rows: 3 }));
    }

    #[test]
    fn status_line_shows_row_count_and_next_row() {
        let pattern = knitplan_engine::generate_with(
            &analysis_from_cli(&generate_args(&[])).unwrap(),
            &SizePreset::M.measurements(),
            &Gauge {
                stitches_per_10cm: 22.0,
                rows_per_10cm: 30.0,
            },
            &GeneratorConfig::default(),
            Utc::now(),
        )
        .unwrap();
        let parsed = knitplan_engine::parse(pattern.piece("back").unwrap()).unwrap();
        let mut tracker = Tracker::new(&parsed);
        tracker.advance_row().unwrap();

        let line = status_line(&tracker);
        assert!(line.starts_with(&format!("Back: row 1/{}", parsed.total_rows)));
        assert!(line.contains(", 120 sts"));
        assert!(line.contains("\nNext: 2. "));
    }
}
