//! Row-by-row piece builder.
//!
//! [`PieceBuilder`] keeps the running stitch count and the side of the
//! next row, labels and annotates every row it writes, and groups
//! repeated rows into row sections. All shaping goes through
//! [`PieceBuilder::shape`], which asserts that each span ends on the
//! stitch count the shaping calculator promised.

use crate::shaping::{ShapingBias, ShapingOptions, ShapingSchedule, distribute_shaping_with};
use crate::types::{PatternError, Piece, Row, Work};
use crate::vocabulary;

use super::fabric::Fabric;

/// Which face of the fabric the next row is worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Right side.
    Right,
    /// Wrong side.
    Wrong,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Right => Self::Wrong,
            Self::Wrong => Self::Right,
        }
    }

    /// Row label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Right => "RS",
            Self::Wrong => "WS",
        }
    }
}

/// End of a right-side row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Where right-side rows begin.
    Start,
    /// Where right-side rows end.
    End,
}

/// One row instruction before labelling and annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Instruction elements.
    pub text: String,
    /// Stitch change when worked once.
    pub delta: i64,
}

impl Step {
    /// A row that changes the count by `delta`.
    pub fn new(text: impl Into<String>, delta: i64) -> Self {
        Self {
            text: text.into(),
            delta,
        }
    }

    /// A row that keeps the count.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, 0)
    }
}

/// Decrease one stitch in from each edge.
#[must_use]
pub fn paired_decrease(fill: &str) -> Step {
    Step::new(format!("K1, SSK, {fill} to last 3 sts, K2tog, K1"), -2)
}

/// Increase one stitch in from each edge.
#[must_use]
pub fn paired_increase(fill: &str) -> Step {
    Step::new(format!("K1, M1L, {fill} to last st, M1R, K1"), 2)
}

/// Decrease one stitch in from one edge.
#[must_use]
pub fn edge_decrease(edge: Edge, fill: &str) -> Step {
    match edge {
        Edge::Start => Step::new(format!("K1, SSK, {fill} to end"), -1),
        Edge::End => Step::new(format!("{fill} to last 3 sts, K2tog, K1"), -1),
    }
}

/// Increase one stitch in from one edge.
#[must_use]
pub fn edge_increase(edge: Edge, fill: &str) -> Step {
    match edge {
        Edge::Start => Step::new(format!("K1, M1L, {fill} to end"), 1),
        Edge::End => Step::new(format!("{fill} to last st, M1R, K1"), 1),
    }
}

/// Builds one [`Piece`].
#[derive(Debug)]
pub struct PieceBuilder {
    id: String,
    name: String,
    work: Work,
    fabric: Fabric,
    side: Side,
    stitches: u32,
    rows: Vec<Row>,
}

impl PieceBuilder {
    /// Start an empty piece.
    #[must_use]
    pub fn new(id: &str, name: &str, work: Work, fabric: Fabric) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            work,
            fabric,
            side: Side::Right,
            stitches: 0,
            rows: Vec::new(),
        }
    }

    /// Stitches on the needles.
    #[must_use]
    pub const fn stitches(&self) -> u32 {
        self.stitches
    }

    /// Side of the next row.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Override the side of the next row (after rejoining yarn).
    pub const fn set_side(&mut self, side: Side) {
        self.side = side;
    }

    /// Plain stitches of the piece's fabric on a side.
    #[must_use]
    pub const fn fill(&self, side: Side) -> &'static str {
        self.fabric.fill(self.work, side)
    }

    /// A plain row on a side.
    #[must_use]
    pub fn plain(&self, side: Side) -> Step {
        Step::plain(format!("{} to end", self.fill(side)))
    }

    /// Cast on. The cast-on row carries no side label; the first worked
    /// row is a right-side row.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InconsistentPattern`] if the total would not
    /// fit a stitch count.
    pub fn cast_on(&mut self, stitches: u32) -> Result<(), PatternError> {
        let after = self.count_after(i64::from(stitches))?;
        self.push(
            vocabulary::annotate(&format!("CO {stitches} sts"), after),
            i64::from(stitches),
        )?;
        self.side = Side::Right;
        Ok(())
    }

    /// Write one row.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InconsistentPattern`] if the row would leave
    /// a negative stitch count.
    pub fn row(&mut self, step: Step) -> Result<(), PatternError> {
        let text = self.label(&step.text, self.side);
        let after = self.count_after(step.delta)?;
        self.push(vocabulary::annotate(&text, after), step.delta)?;
        self.side = self.next_side(self.side, 1);
        Ok(())
    }

    /// Write `steps` as a section worked `times` times.
    ///
    /// A single pass is written as plain rows. Side labels are kept only
    /// when every pass starts on the same side.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InconsistentPattern`] if any pass would
    /// leave a negative stitch count.
    pub fn section(&mut self, steps: &[Step], times: u32) -> Result<(), PatternError> {
        if steps.is_empty() || times == 0 {
            return Ok(());
        }
        if times == 1 {
            for step in steps {
                self.row(step.clone())?;
            }
            return Ok(());
        }

        let pass_delta: i64 = steps.iter().map(|s| s.delta).sum();
        let extra = i64::from(times - 1) * pass_delta;
        let labelled = self.work == Work::Flat && steps.len() % 2 == 0;
        let last = steps.len() - 1;

        let mut count = i64::from(self.stitches);
        let mut side = self.side;
        for (i, step) in steps.iter().enumerate() {
            count += step.delta;
            let final_count = count + extra;
            let number = self.next_number();
            if count < 0 || final_count < 0 {
                return Err(self.inconsistent(number, 0, count.min(final_count)));
            }

            let mut text = if labelled {
                vocabulary::labeled(side.label(), &step.text)
            } else {
                step.text.clone()
            };
            if i == 0 {
                text = vocabulary::open_section(&text);
            }
            if i == last {
                text = vocabulary::close_section(&text, times);
                text = vocabulary::annotate(&text, self.to_count(number, final_count)?);
            }
            let stitch_count = self.to_count(number, final_count)?;
            self.rows.push(Row {
                number,
                text,
                stitch_count,
            });
            side = side.flip();
        }

        let worked = u32::try_from(steps.len()).unwrap_or(u32::MAX).wrapping_mul(times);
        self.stitches = self.to_count(self.next_number() - 1, count + extra)?;
        self.side = self.next_side(self.side, worked);
        Ok(())
    }

    /// Work `rows` rows of plain fabric.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::section`] errors.
    pub fn work_even(&mut self, rows: u32) -> Result<(), PatternError> {
        match self.work {
            Work::Flat => {
                let pair = [self.plain(self.side), self.plain(self.side.flip())];
                self.section(&pair, rows / 2)?;
                if rows % 2 == 1 {
                    self.row(self.plain(self.side))?;
                }
                Ok(())
            }
            Work::Round => self.section(&[self.plain(Side::Right)], rows),
        }
    }

    /// Work `rows` rows of 1x1 ribbing over the current stitches.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::section`] errors.
    pub fn rib(&mut self, rows: u32) -> Result<(), PatternError> {
        let stitches = self.stitches;
        match self.work {
            Work::Flat => {
                let pair = [rib_step(stitches, self.side), rib_step(stitches, self.side.flip())];
                self.section(&pair, rows / 2)?;
                if rows % 2 == 1 {
                    self.row(rib_step(stitches, self.side))?;
                }
                Ok(())
            }
            Work::Round => self.section(&[rib_step(stitches, Side::Right)], rows),
        }
    }

    /// Shape from the current count to `end` over `rows` rows, working
    /// `event` on each shaping row.
    ///
    /// Flat pieces shape on right-side rows only: a wrong-side row is
    /// worked first if needed and the schedule runs over row pairs. Rounds
    /// shape on any round. Equal intervals are grouped into sections.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::ImpossibleShaping`] if the shaping does not
    /// fit, and [`PatternError::InconsistentPattern`] if `event` points the
    /// wrong way or the span does not end on `end` stitches.
    pub fn shape(
        &mut self,
        end: u32,
        rows: u32,
        event: &Step,
        bias: ShapingBias,
    ) -> Result<ShapingSchedule, PatternError> {
        let start = self.stitches;
        let wanted = i64::from(end) - i64::from(start);
        if wanted != 0 && (event.delta == 0 || wanted.signum() != event.delta.signum()) {
            return Err(self.inconsistent(self.next_number(), i64::from(end), i64::from(start)));
        }
        let options = ShapingOptions {
            per_event: u32::try_from(event.delta.unsigned_abs()).unwrap_or(u32::MAX),
            bias,
        };

        let schedule = match self.work {
            Work::Flat => {
                let mut rows = rows;
                if self.side == Side::Wrong && rows > 0 {
                    self.row(self.plain(Side::Wrong))?;
                    rows -= 1;
                }
                let schedule = distribute_shaping_with(start, end, rows / 2, options)?;
                for (length, count) in schedule.interval_runs() {
                    let mut steps = Vec::new();
                    for _ in 1..length {
                        steps.push(self.plain(Side::Right));
                        steps.push(self.plain(Side::Wrong));
                    }
                    steps.push(event.clone());
                    steps.push(self.plain(Side::Wrong));
                    self.section(&steps, count)?;
                }
                self.work_even(schedule.trailing_rows() * 2 + rows % 2)?;
                schedule
            }
            Work::Round => {
                let schedule = distribute_shaping_with(start, end, rows, options)?;
                for (length, count) in schedule.interval_runs() {
                    let mut steps: Vec<Step> =
                        (1..length).map(|_| self.plain(Side::Right)).collect();
                    steps.push(event.clone());
                    self.section(&steps, count)?;
                }
                self.work_even(schedule.trailing_rows())?;
                schedule
            }
        };

        if self.stitches != end {
            return Err(self.inconsistent(
                self.next_number() - 1,
                i64::from(end),
                i64::from(self.stitches),
            ));
        }
        Ok(schedule)
    }

    /// Bind off `chunks` at the start of consecutive rows, so each chunk
    /// comes off both edges.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::row`] errors.
    pub fn bind_off_each_side(&mut self, chunks: &[u32]) -> Result<(), PatternError> {
        self.align_right_side()?;
        for &chunk in chunks {
            for side in [Side::Right, Side::Wrong] {
                self.row(bind_off_step(chunk, self.fill(side)))?;
            }
        }
        Ok(())
    }

    /// Bind off `stitches` at one edge, over a right-side and a wrong-side
    /// row.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::row`] errors.
    pub fn bind_off_at(&mut self, edge: Edge, stitches: u32) -> Result<(), PatternError> {
        if stitches == 0 {
            return Ok(());
        }
        self.align_right_side()?;
        match edge {
            Edge::Start => {
                self.row(bind_off_step(stitches, self.fill(Side::Right)))?;
                self.row(self.plain(Side::Wrong))
            }
            Edge::End => {
                self.row(self.plain(Side::Right))?;
                self.row(bind_off_step(stitches, self.fill(Side::Wrong)))
            }
        }
    }

    /// Bind off every stitch.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::row`] errors.
    pub fn bind_off_all(&mut self, how: &str) -> Result<(), PatternError> {
        let text = if how.is_empty() {
            "BO all sts".to_string()
        } else {
            format!("BO all sts {how}")
        };
        self.row(Step::new(text, -i64::from(self.stitches)))
    }

    /// Work a plain wrong-side row if the next row is a wrong-side row.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::row`] errors.
    pub fn align_right_side(&mut self) -> Result<(), PatternError> {
        if self.work == Work::Flat && self.side == Side::Wrong {
            self.row(self.plain(Side::Wrong))?;
        }
        Ok(())
    }

    /// Rows written so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` before the first row.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finish the piece.
    #[must_use]
    pub fn finish(self) -> Piece {
        Piece {
            id: self.id,
            name: self.name,
            work: self.work,
            rows: self.rows,
        }
    }

    fn label(&self, text: &str, side: Side) -> String {
        match self.work {
            Work::Flat => vocabulary::labeled(side.label(), text),
            Work::Round => text.to_string(),
        }
    }

    const fn next_side(&self, side: Side, rows: u32) -> Side {
        if matches!(self.work, Work::Flat) && rows % 2 == 1 {
            side.flip()
        } else {
            side
        }
    }

    fn next_number(&self) -> u32 {
        u32::try_from(self.rows.len() + 1).unwrap_or(u32::MAX)
    }

    fn count_after(&self, delta: i64) -> Result<u32, PatternError> {
        self.to_count(self.next_number(), i64::from(self.stitches) + delta)
    }

    fn to_count(&self, row: u32, count: i64) -> Result<u32, PatternError> {
        u32::try_from(count).map_err(|_| self.inconsistent(row, 0, count))
    }

    fn inconsistent(&self, row: u32, expected: i64, actual: i64) -> PatternError {
        PatternError::InconsistentPattern {
            piece: self.id.clone(),
            row,
            expected,
            actual,
        }
    }

    fn push(&mut self, text: String, delta: i64) -> Result<(), PatternError> {
        let after = self.count_after(delta)?;
        let number = self.next_number();
        self.rows.push(Row {
            number,
            text,
            stitch_count: after,
        });
        self.stitches = after;
        Ok(())
    }
}

fn bind_off_step(stitches: u32, fill: &str) -> Step {
    Step::new(
        format!("BO {stitches} sts, {fill} to end"),
        -i64::from(stitches),
    )
}

/// One row of 1x1 ribbing over `stitches`, as seen from `side`.
///
/// Even counts read the same from both sides; odd counts start and end
/// with the stitch that faces the knitter as a knit on the right side.
#[must_use]
pub fn rib_step(stitches: u32, side: Side) -> Step {
    let pairs = stitches / 2;
    let odd = stitches % 2 == 1;
    let (first, second) = match (side, odd) {
        (Side::Wrong, true) => ("P1", "K1"),
        _ => ("K1", "P1"),
    };
    let mut elements = Vec::new();
    match pairs {
        0 => {}
        1 => elements.push(format!("{first}, {second}")),
        _ => elements.push(vocabulary::in_row_repeat(&format!("{first}, {second}"), pairs)),
    }
    if odd {
        elements.push(first.to_string());
    }
    Step::plain(elements.join(", "))
}
