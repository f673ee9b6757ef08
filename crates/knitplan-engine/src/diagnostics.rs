//! Pattern diagnostics: per-piece counts for reviewing a generated pattern.
//!
//! Every piece is parsed and walked row by row with a [`Tracker`], so the
//! numbers reflect the rows a knitter actually works (every pass of every
//! section), not just the instruction lines.

use serde::{Deserialize, Serialize};

use crate::parse::parse;
use crate::progress::Tracker;
use crate::types::{GeneratedPattern, PatternError, Piece, Work};

/// Summary of one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSummary {
    /// Piece id.
    pub id: String,
    /// Piece name.
    pub name: String,
    /// Flat or in the round.
    pub work: Work,
    /// Instruction lines.
    pub instruction_rows: u32,
    /// Rows knitted, counting every section pass.
    pub worked_rows: u64,
    /// Row sections.
    pub sections: usize,
    /// Distinct markers.
    pub markers: usize,
    /// Stitches after the first row.
    pub first_row_stitches: u32,
    /// Most stitches on the needles after any row.
    pub peak_stitches: u32,
    /// Sum of the stitch counts after every worked row.
    pub stitches_worked: u64,
}

impl PieceSummary {
    /// Summarize a piece.
    ///
    /// # Errors
    ///
    /// Propagates [`parse`] errors.
    pub fn for_piece(piece: &Piece) -> Result<Self, PatternError> {
        let parsed = parse(piece)?;
        let mut tracker = Tracker::new(&parsed);
        let mut peak = 0;
        let mut stitches_worked = 0;
        while tracker.advance_row().is_ok() {
            let count = tracker.stitch_count();
            peak = peak.max(count);
            stitches_worked += u64::from(count);
        }
        Ok(Self {
            id: piece.id.clone(),
            name: piece.name.clone(),
            work: piece.work,
            instruction_rows: parsed.total_rows,
            worked_rows: parsed.worked_rows(),
            sections: parsed.sections.len(),
            markers: parsed.markers.len(),
            first_row_stitches: parsed.instructions.first().map_or(0, |i| i.stitch_count),
            peak_stitches: peak,
            stitches_worked,
        })
    }
}

/// Diagnostics for a whole pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDiagnostics {
    /// Pattern title.
    pub title: String,
    /// One summary per piece, in pattern order.
    pub pieces: Vec<PieceSummary>,
}

impl PatternDiagnostics {
    /// Summarize every piece of a pattern.
    ///
    /// # Errors
    ///
    /// Propagates [`parse`] errors.
    pub fn for_pattern(pattern: &GeneratedPattern) -> Result<Self, PatternError> {
        Ok(Self {
            title: pattern.title.clone(),
            pieces: pattern
                .pieces
                .iter()
                .map(PieceSummary::for_piece)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Rows knitted across all pieces.
    #[must_use]
    pub fn total_worked_rows(&self) -> u64 {
        self.pieces.iter().map(|p| p.worked_rows).sum()
    }

    /// Stitches worked across all pieces.
    #[must_use]
    pub fn total_stitches_worked(&self) -> u64 {
        self.pieces.iter().map(|p| p.stitches_worked).sum()
    }

    /// Human-readable table.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pattern Diagnostics: {}\n{}", self.title, "=".repeat(60)));
        lines.push(format!(
            "{:<22} {:>6} {:>6} {:>7} {:>8} {:>8} {:>6} {:>10}",
            "Piece", "Work", "Lines", "Rows", "Sections", "Markers", "Peak", "Stitches"
        ));
        lines.push("-".repeat(80));

        for piece in &self.pieces {
            let work = match piece.work {
                Work::Flat => "flat",
                Work::Round => "round",
            };
            lines.push(format!(
                "{:<22} {:>6} {:>6} {:>7} {:>8} {:>8} {:>6} {:>10}",
                piece.name,
                work,
                piece.instruction_rows,
                piece.worked_rows,
                piece.sections,
                piece.markers,
                piece.peak_stitches,
                piece.stitches_worked,
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Pieces: {}  |  Rows: {}  |  Stitches: {}",
            self.pieces.len(),
            self.total_worked_rows(),
            self.total_stitches_worked(),
        ));

        lines.join("\n")
    }
}
