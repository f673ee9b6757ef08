//! Plain-text pattern document.
//!
//! The document is the printable form of a [`GeneratedPattern`]:
//!
//! ```text
//! # knitplan
//! # Exported: 2024-03-01T12:00:00Z
//! Crew-neck set-in sleeve pullover in stockinette
//! ===============================================
//!
//! Gauge: 22 sts and 30 rows = 10 cm
//! Measurements (cm): chest 96, body length 62, ...
//!
//! Back (worked flat)
//! ------------------
//!   1. CO 120 sts (120 sts)
//!   2. [RS: *K1, P1* repeat 60 times
//! ```
//!
//! Lines beginning with `#` are metadata comments. Row lines carry the
//! instruction text exactly as generated, so a document can be read back
//! into rows with [`rows_from_text`].
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use knitplan_engine::{GeneratedPattern, Piece, Row, Work};

/// Metadata to embed as `#`-prefixed comment lines at the top of the
/// document. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct TextMetadata<'a> {
    /// Free-form description -- emitted as `# <line>`.
    pub description: Option<&'a str>,

    /// Export timestamp -- emitted as `# Exported: <timestamp>`.
    pub timestamp: Option<&'a str>,

    /// Full `GeneratorConfig` JSON -- emitted as `# Config: <json>`.
    ///
    /// Allows regenerating the exact same pattern.
    pub config_json: Option<&'a str>,
}

/// Serialize a pattern into a plain-text document.
///
/// The overview lists the gauge and the measurements as supplied (before
/// ease); each piece follows with its rows numbered from 1.
#[must_use]
pub fn to_text(pattern: &GeneratedPattern, metadata: &TextMetadata<'_>) -> String {
    let mut out = String::new();

    // --- Metadata header ---
    let _ = writeln!(out, "# knitplan");
    if let Some(description) = metadata.description {
        for line in description.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    if let Some(timestamp) = metadata.timestamp {
        for line in timestamp.lines() {
            let _ = writeln!(out, "# Exported: {line}");
        }
    }
    if let Some(config_json) = metadata.config_json {
        for line in config_json.lines() {
            let _ = writeln!(out, "# Config: {line}");
        }
    }

    // --- Overview ---
    underline(&mut out, &pattern.title, '=');
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Gauge: {} sts and {} rows = 10 cm",
        number(pattern.gauge.stitches_per_10cm),
        number(pattern.gauge.rows_per_10cm),
    );
    let measurements: Vec<String> = pattern
        .measurements
        .named()
        .iter()
        .map(|(name, value)| format!("{} {}", name.replace('_', " "), number(*value)))
        .collect();
    let _ = writeln!(out, "Measurements (cm): {}", measurements.join(", "));
    let _ = writeln!(out, "Ease: {} cm", number(pattern.config.ease_cm));

    // --- Pieces ---
    for piece in &pattern.pieces {
        let _ = writeln!(out);
        write_piece(&mut out, piece);
    }

    out
}

/// Serialize one piece: a heading and its numbered rows.
#[must_use]
pub fn piece_to_text(piece: &Piece) -> String {
    let mut out = String::new();
    write_piece(&mut out, piece);
    out
}

fn write_piece(out: &mut String, piece: &Piece) {
    let work = match piece.work {
        Work::Flat => "worked flat",
        Work::Round => "worked in the round",
    };
    underline(out, &format!("{} ({work})", piece.name), '-');
    let width = piece.rows.len().to_string().len();
    for row in &piece.rows {
        let _ = writeln!(out, "  {:>width$}. {}", row.number, row.text);
    }
}

fn underline(out: &mut String, heading: &str, mark: char) {
    let _ = writeln!(out, "{heading}");
    let _ = writeln!(
        out,
        "{}",
        mark.to_string().repeat(heading.chars().count())
    );
}

/// Format a measurement without a trailing `.0`.
fn number(value: f64) -> String {
    let text = format!("{value:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

/// Read the numbered rows of one piece back out of a document section.
///
/// Lines that are not `N. text` are skipped; stitch counts are taken from
/// the row annotations and default to 0.
#[must_use]
pub fn rows_from_text(section: &str) -> Vec<Row> {
    section
        .lines()
        .filter_map(|line| {
            let (number, text) = line.trim_start().split_once(". ")?;
            let number = number.parse().ok()?;
            let stitch_count = knitplan_engine::vocabulary::split_annotation(text)
                .1
                .unwrap_or(0);
            Some(Row {
                number,
                text: text.to_string(),
                stitch_count,
            })
        })
        .collect()
}
