//! Knitting progress tracker: a resumable state machine over a parsed piece.
//!
//! The position is the pair (row, pass): the last row completed and, for
//! rows inside a row section, which pass through the section it belongs
//! to. Row 0 means nothing has been worked.
//!
//! ```text
//! NotStarted ──advance──▶ InProgress ──advance (last row, last pass)──▶ Completed
//!      ▲                    │    ▲                                         │
//!      └──────retreat───────┘    └────────────────retreat──────────────────┘
//! ```
//!
//! Working the last row of a section with passes left returns to the
//! section's first row and bumps the pass. Retreat is the exact inverse
//! of advance, marker offsets included.
//!
//! Only [`KnittingProgress`] is persisted; [`Tracker::restore`] rebuilds
//! marker offsets by replaying from the start, so a stored record can
//! never drift from its piece.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parse::{ParsedInstruction, ParsedPiece};
use crate::types::PatternError;

/// Coarse state of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// No row worked yet.
    NotStarted,
    /// Some rows worked.
    InProgress,
    /// Last row of the last pass worked.
    Completed,
}

/// Persisted progress through one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnittingProgress {
    /// Piece the progress belongs to.
    pub piece_id: String,
    /// Last completed row; 0 before the first row.
    pub current_row: u32,
    /// 1-based pass through the current row's section; 0 outside sections.
    pub repeat_iteration: u32,
    /// Offset of every marker declared in the piece.
    pub marker_offsets: BTreeMap<String, i64>,
}

impl KnittingProgress {
    /// Progress at the start of a piece: row 0, every marker at offset 0.
    #[must_use]
    pub fn new(piece: &ParsedPiece) -> Self {
        Self {
            piece_id: piece.piece_id.clone(),
            current_row: 0,
            repeat_iteration: 0,
            marker_offsets: piece.markers.iter().map(|name| (name.clone(), 0)).collect(),
        }
    }
}

/// Drives [`KnittingProgress`] through a [`ParsedPiece`].
#[derive(Debug, Clone)]
pub struct Tracker<'a> {
    piece: &'a ParsedPiece,
    progress: KnittingProgress,
}

impl<'a> Tracker<'a> {
    /// Start tracking a piece from row 0.
    #[must_use]
    pub fn new(piece: &'a ParsedPiece) -> Self {
        Self {
            piece,
            progress: KnittingProgress::new(piece),
        }
    }

    /// Resume from stored progress.
    ///
    /// The row and pass are taken from `progress`; marker offsets are
    /// recomputed by replaying the piece up to that point.
    ///
    /// # Errors
    ///
    /// - [`PatternError::PieceMismatch`] if the record names another piece.
    /// - [`PatternError::RowOutOfRange`] if the row is past the end.
    /// - [`PatternError::UnknownMarker`] if it names an undeclared marker.
    /// - [`PatternError::InvalidIteration`] if the pass does not fit the
    ///   row (outside `1..=times` in a section, non-zero elsewhere).
    pub fn restore(piece: &'a ParsedPiece, progress: &KnittingProgress) -> Result<Self, PatternError> {
        if progress.piece_id != piece.piece_id {
            return Err(PatternError::PieceMismatch {
                expected: piece.piece_id.clone(),
                found: progress.piece_id.clone(),
            });
        }
        if progress.current_row > piece.total_rows {
            return Err(PatternError::RowOutOfRange {
                row: progress.current_row,
                total: piece.total_rows,
            });
        }
        if let Some(name) = progress
            .marker_offsets
            .keys()
            .find(|name| !piece.markers.contains(*name))
        {
            return Err(PatternError::UnknownMarker(name.clone()));
        }

        let row = progress.current_row;
        let iteration = progress.repeat_iteration;
        let valid = match piece.section_of(row) {
            Some(section) => (1..=section.times).contains(&iteration),
            None => iteration == 0,
        };
        if !valid {
            return Err(PatternError::InvalidIteration { row, iteration });
        }

        let mut tracker = Self::new(piece);
        while tracker.position() != (row, iteration) {
            tracker
                .advance_row()
                .map_err(|_| PatternError::InvalidIteration { row, iteration })?;
        }
        Ok(tracker)
    }

    /// Current progress record.
    #[must_use]
    pub const fn progress(&self) -> &KnittingProgress {
        &self.progress
    }

    /// Give up the tracker, keeping the progress record.
    #[must_use]
    pub fn into_progress(self) -> KnittingProgress {
        self.progress
    }

    /// The piece being tracked.
    #[must_use]
    pub const fn piece(&self) -> &'a ParsedPiece {
        self.piece
    }

    /// Coarse state.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        if self.successor().is_none() {
            ProgressState::Completed
        } else if self.progress.current_row == 0 {
            ProgressState::NotStarted
        } else {
            ProgressState::InProgress
        }
    }

    /// Work the next row.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::AlreadyComplete`] when the piece is done.
    pub fn advance_row(&mut self) -> Result<ProgressState, PatternError> {
        let (row, iteration) = self.successor().ok_or(PatternError::AlreadyComplete)?;
        self.apply_markers(row, 1);
        self.progress.current_row = row;
        self.progress.repeat_iteration = iteration;
        Ok(self.state())
    }

    /// Un-work the current row.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::AlreadyAtStart`] at row 0.
    pub fn retreat_row(&mut self) -> Result<ProgressState, PatternError> {
        let (row, iteration) = self.predecessor().ok_or(PatternError::AlreadyAtStart)?;
        self.apply_markers(self.progress.current_row, -1);
        self.progress.current_row = row;
        self.progress.repeat_iteration = iteration;
        Ok(self.state())
    }

    /// Move to the first time `row` is completed, replaying from the start.
    ///
    /// `jump_to_row(0)` is the same as [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::RowOutOfRange`] beyond the last row.
    pub fn jump_to_row(&mut self, row: u32) -> Result<ProgressState, PatternError> {
        if row > self.piece.total_rows {
            return Err(PatternError::RowOutOfRange {
                row,
                total: self.piece.total_rows,
            });
        }
        self.reset();
        while self.progress.current_row != row {
            self.advance_row()?;
        }
        Ok(self.state())
    }

    /// Back to row 0 with every marker at offset 0.
    pub fn reset(&mut self) {
        self.progress = KnittingProgress::new(self.piece);
    }

    /// Stitches on the needles after the current row and pass.
    #[must_use]
    pub fn stitch_count(&self) -> u32 {
        let Some(instruction) = self.current_instruction() else {
            return 0;
        };
        let count = match self.piece.section_of(instruction.row) {
            Some(section) => {
                let remaining = i64::from(section.times - self.progress.repeat_iteration);
                i64::from(instruction.stitch_count) - remaining * section.stitch_delta
            }
            None => i64::from(instruction.stitch_count),
        };
        u32::try_from(count).unwrap_or(0)
    }

    /// The row just completed.
    #[must_use]
    pub fn current_instruction(&self) -> Option<&'a ParsedInstruction> {
        self.piece.instruction(self.progress.current_row)
    }

    /// The row to work next.
    #[must_use]
    pub fn next_instruction(&self) -> Option<&'a ParsedInstruction> {
        self.successor()
            .and_then(|(row, _)| self.piece.instruction(row))
    }

    /// Rows knitted so far, counting every pass.
    #[must_use]
    pub fn worked_rows(&self) -> u64 {
        let current_row = self.progress.current_row;
        let iteration = u64::from(self.progress.repeat_iteration);
        let current_section = self
            .piece
            .instruction(current_row)
            .and_then(|instruction| instruction.section);

        self.piece
            .instructions
            .iter()
            .map(|instruction| match instruction.section {
                Some(index) if Some(index) == current_section => {
                    if instruction.row <= current_row {
                        iteration
                    } else {
                        iteration - 1
                    }
                }
                _ if instruction.row > current_row => 0,
                Some(index) => self
                    .piece
                    .sections
                    .get(index)
                    .map_or(1, |section| u64::from(section.times)),
                None => 1,
            })
            .sum()
    }

    fn position(&self) -> (u32, u32) {
        (self.progress.current_row, self.progress.repeat_iteration)
    }

    fn section_index(&self, row: u32) -> Option<usize> {
        self.piece.instruction(row).and_then(|i| i.section)
    }

    /// (row, pass) after working one more row.
    fn successor(&self) -> Option<(u32, u32)> {
        let (row, iteration) = self.position();
        if let Some(section) = self.piece.section_of(row) {
            if row == section.last_row && iteration < section.times {
                return Some((section.first_row, iteration + 1));
            }
        }

        let next = row + 1;
        if next > self.piece.total_rows {
            return None;
        }
        let next_iteration = match self.piece.section_of(next) {
            Some(section) if section.first_row == next => 1,
            Some(_) => iteration,
            None => 0,
        };
        Some((next, next_iteration))
    }

    /// (row, pass) before the current row was worked.
    fn predecessor(&self) -> Option<(u32, u32)> {
        let (row, iteration) = self.position();
        if row == 0 {
            return None;
        }
        if let Some(section) = self.piece.section_of(row) {
            if row == section.first_row && iteration > 1 {
                return Some((section.last_row, iteration - 1));
            }
        }

        let previous = row - 1;
        let previous_iteration = match self.section_index(previous) {
            Some(index) if Some(index) == self.section_index(row) => iteration,
            Some(index) => self.piece.sections.get(index).map_or(0, |s| s.times),
            None => 0,
        };
        Some((previous, previous_iteration))
    }

    fn apply_markers(&mut self, row: u32, sign: i64) {
        let Some(instruction) = self.piece.instruction(row) else {
            return;
        };
        for marker in &instruction.markers {
            *self
                .progress
                .marker_offsets
                .entry(marker.name.clone())
                .or_insert(0) += sign * marker.offset_delta;
        }
    }
}
