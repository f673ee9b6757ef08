//! Instruction parser: turn a piece's row texts into structured records.
//!
//! Each row is scanned once, left to right, over its comma-separated
//! elements (see [`crate::vocabulary`]). The parser keeps a running stitch
//! count and the offset of every marker, so it can:
//!
//! - compute each row's stitch delta and the count after it,
//! - check written `(N sts)` annotations against that count,
//! - record in-row repeat blocks and row sections with their deltas,
//! - record how each marker reference moves its marker.
//!
//! Inside a row section the first pass is scanned; the remaining passes
//! repeat it, so every row's recorded count is its count after the final
//! pass and annotations are checked against that.
//!
//! Parsing is pure: the same piece always parses to the same result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{GeneratedPattern, PatternError, Piece};
use crate::vocabulary::{self, Op};

/// Elements of one row worked several times in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatBlock {
    /// Index of the first repeated element.
    pub start: usize,
    /// Index one past the last repeated element.
    pub end: usize,
    /// How many times the elements are worked.
    pub times: u32,
    /// Stitch change of one repeat.
    pub stitch_delta: i64,
}

/// What a marker reference does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    /// The marker is placed (or moved) here.
    Place,
    /// The marker is slipped from needle to needle.
    Slip,
}

/// One marker reference within a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRef {
    /// Marker name.
    pub name: String,
    /// Place or slip.
    pub action: MarkerAction,
    /// Change to the marker's offset when the row is worked once.
    pub offset_delta: i64,
}

/// Consecutive rows worked a fixed number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSection {
    /// First row of the section.
    pub first_row: u32,
    /// Last row of the section.
    pub last_row: u32,
    /// Passes through the section.
    pub times: u32,
    /// Stitch change of one pass.
    pub stitch_delta: i64,
}

impl RowSection {
    /// Returns `true` if `row` lies in the section.
    #[must_use]
    pub const fn contains(&self, row: u32) -> bool {
        self.first_row <= row && row <= self.last_row
    }

    /// Rows in one pass.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.last_row - self.first_row + 1
    }
}

/// One parsed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInstruction {
    /// 1-based row number.
    pub row: u32,
    /// Row text as written.
    pub text: String,
    /// Stitch change of one working of the row.
    pub stitch_delta: i64,
    /// Stitches after the row (after its final pass inside a section).
    pub stitch_count: u32,
    /// In-row repeat blocks.
    pub repeats: Vec<RepeatBlock>,
    /// Marker references in working order.
    pub markers: Vec<MarkerRef>,
    /// Index into [`ParsedPiece::sections`] of the section holding the row.
    pub section: Option<usize>,
}

/// A fully parsed piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPiece {
    /// Piece id.
    pub piece_id: String,
    /// Piece name.
    pub name: String,
    /// Number of row instructions.
    pub total_rows: u32,
    /// One record per row, in order.
    pub instructions: Vec<ParsedInstruction>,
    /// Row sections in order.
    pub sections: Vec<RowSection>,
    /// Every marker the piece mentions.
    pub markers: BTreeSet<String>,
}

impl ParsedPiece {
    /// Instruction for a 1-based row.
    #[must_use]
    pub fn instruction(&self, row: u32) -> Option<&ParsedInstruction> {
        let index = usize::try_from(row.checked_sub(1)?).ok()?;
        self.instructions.get(index)
    }

    /// Section containing a 1-based row.
    #[must_use]
    pub fn section_of(&self, row: u32) -> Option<&RowSection> {
        self.instruction(row)
            .and_then(|instruction| instruction.section)
            .and_then(|index| self.sections.get(index))
    }

    /// Stitches left after the last row.
    #[must_use]
    pub fn final_stitch_count(&self) -> u32 {
        self.instructions.last().map_or(0, |i| i.stitch_count)
    }

    /// Rows actually knitted, counting every pass of every section.
    #[must_use]
    pub fn worked_rows(&self) -> u64 {
        let in_sections: u64 = self
            .sections
            .iter()
            .map(|s| u64::from(s.len()) * u64::from(s.times))
            .sum();
        let section_rows: u64 = self.sections.iter().map(|s| u64::from(s.len())).sum();
        u64::from(self.total_rows) - section_rows + in_sections
    }
}

/// Parse every piece of a pattern.
///
/// # Errors
///
/// Returns the first error of [`parse`] across the pieces.
pub fn parse_pattern(pattern: &GeneratedPattern) -> Result<Vec<ParsedPiece>, PatternError> {
    pattern.pieces.iter().map(parse).collect()
}

/// Parse one piece.
///
/// # Errors
///
/// - [`PatternError::NonContiguousRows`] if rows are not numbered 1, 2, ...
/// - [`PatternError::MalformedRepeat`] for nested, unterminated, stray,
///   or count-less repeats and sections, and for marker references inside
///   an in-row repeat.
/// - [`PatternError::NegativeStitchCount`] if a row leaves fewer than zero
///   stitches.
/// - [`PatternError::StitchCountMismatch`] if an annotation disagrees with
///   the computed count.
pub fn parse(piece: &Piece) -> Result<ParsedPiece, PatternError> {
    let mut parser = Parser::default();
    for (index, row) in piece.rows.iter().enumerate() {
        let expected = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if row.number != expected {
            return Err(PatternError::NonContiguousRows {
                expected,
                found: row.number,
            });
        }
        parser.row(row.number, &row.text)?;
    }
    if let Some(open) = &parser.open {
        return Err(malformed(open.first_row, "unterminated section"));
    }

    Ok(ParsedPiece {
        piece_id: piece.id.clone(),
        name: piece.name.clone(),
        total_rows: u32::try_from(piece.rows.len()).unwrap_or(u32::MAX),
        instructions: parser.instructions,
        sections: parser.sections,
        markers: parser.offsets.into_keys().collect(),
    })
}

fn malformed(row: u32, reason: &str) -> PatternError {
    PatternError::MalformedRepeat {
        row,
        reason: reason.to_string(),
    }
}

/// A section whose closer has not been seen yet.
#[derive(Debug)]
struct OpenSection {
    first_row: u32,
    first_index: usize,
    start_count: i64,
    start_offsets: BTreeMap<String, i64>,
}

#[derive(Debug, Default)]
struct Parser {
    /// Stitches on the needles after the last parsed row (first pass
    /// while inside a section).
    count: i64,
    offsets: BTreeMap<String, i64>,
    open: Option<OpenSection>,
    /// Annotations waiting for their section to close: (instruction, declared).
    pending: Vec<(usize, u32)>,
    /// First-pass counts of the rows in the open section.
    first_pass: Vec<i64>,
    instructions: Vec<ParsedInstruction>,
    sections: Vec<RowSection>,
}

impl Parser {
    fn row(&mut self, row: u32, text: &str) -> Result<(), PatternError> {
        let (body, annotation) = vocabulary::split_annotation(text);
        let marks = vocabulary::split_section(body).map_err(|reason| malformed(row, reason))?;

        if marks.opens {
            if self.open.is_some() {
                return Err(malformed(row, "nested section"));
            }
            self.open = Some(OpenSection {
                first_row: row,
                first_index: self.instructions.len(),
                start_count: self.count,
                start_offsets: self.offsets.clone(),
            });
        }

        let (_, elements) = vocabulary::split_label(marks.body);
        let scan = scan_elements(row, elements, self.count, &mut self.offsets)?;
        if scan.binds_off_all && self.open.is_some() {
            return Err(malformed(row, "binding off all stitches inside a section"));
        }

        let after = if scan.binds_off_all {
            0
        } else {
            self.count + scan.delta
        };
        if after < 0 {
            return Err(PatternError::NegativeStitchCount { row, count: after });
        }
        let stitch_delta = after - self.count;
        self.count = after;

        let index = self.instructions.len();
        let section = self.open.as_ref().map(|_| self.sections.len());
        self.instructions.push(ParsedInstruction {
            row,
            text: text.to_string(),
            stitch_delta,
            stitch_count: to_count(row, after)?,
            repeats: scan.repeats,
            markers: scan.markers,
            section,
        });

        match (section, annotation) {
            (Some(_), declared) => {
                self.first_pass.push(after);
                if let Some(declared) = declared {
                    self.pending.push((index, declared));
                }
            }
            (None, Some(declared)) => check_annotation(row, declared, after)?,
            (None, None) => {}
        }

        match marks.closes {
            Some(times) => self.close_section(row, times),
            None => Ok(()),
        }
    }

    fn close_section(&mut self, row: u32, times: u32) -> Result<(), PatternError> {
        let Some(open) = self.open.take() else {
            return Err(malformed(row, "section closed without opening"));
        };
        let stitch_delta = self.count - open.start_count;
        let extra = i64::from(times - 1);

        for (offset, first) in self.first_pass.drain(..).enumerate() {
            let instruction = &mut self.instructions[open.first_index + offset];
            let last = first + extra * stitch_delta;
            if last < 0 {
                return Err(PatternError::NegativeStitchCount {
                    row: instruction.row,
                    count: last,
                });
            }
            instruction.stitch_count = to_count(instruction.row, last)?;
        }
        for (index, declared) in self.pending.drain(..) {
            let instruction = &self.instructions[index];
            check_annotation(
                instruction.row,
                declared,
                i64::from(instruction.stitch_count),
            )?;
        }

        self.count += extra * stitch_delta;
        for (name, offset) in &mut self.offsets {
            let start = open.start_offsets.get(name).copied().unwrap_or(0);
            *offset += extra * (*offset - start);
        }

        self.sections.push(RowSection {
            first_row: open.first_row,
            last_row: row,
            times,
            stitch_delta,
        });
        Ok(())
    }
}

fn to_count(row: u32, count: i64) -> Result<u32, PatternError> {
    u32::try_from(count).map_err(|_| PatternError::NegativeStitchCount { row, count })
}

fn check_annotation(row: u32, declared: u32, computed: i64) -> Result<(), PatternError> {
    if i64::from(declared) == computed {
        Ok(())
    } else {
        Err(PatternError::StitchCountMismatch {
            row,
            declared,
            computed,
        })
    }
}

/// Stitch bookkeeping for a run of elements.
///
/// `consumed` is `None` once an element of unknown width has been worked;
/// a later relative phrase (`K to end`) makes the position known again.
#[derive(Debug, Clone, Copy)]
struct Tally {
    consumed: Option<i64>,
    delta: i64,
}

impl Tally {
    const START: Self = Self {
        consumed: Some(0),
        delta: 0,
    };

    fn work(&mut self, consumed: u32, delta: i64) {
        self.consumed = self.consumed.map(|c| c + i64::from(consumed));
        self.delta += delta;
    }

    /// Output position: stitches already on the right needle.
    fn position(&self) -> Option<i64> {
        self.consumed.map(|c| c + self.delta)
    }
}

#[derive(Debug)]
struct OpenRepeat {
    start: usize,
    tally: Tally,
}

#[derive(Debug, Default)]
struct RowScan {
    delta: i64,
    binds_off_all: bool,
    repeats: Vec<RepeatBlock>,
    markers: Vec<MarkerRef>,
}

fn scan_elements(
    row: u32,
    body: &str,
    before: i64,
    offsets: &mut BTreeMap<String, i64>,
) -> Result<RowScan, PatternError> {
    let mut scan = RowScan::default();
    let mut tally = Tally::START;
    let mut repeat: Option<OpenRepeat> = None;

    let elements = body
        .split(vocabulary::ELEMENT_SEPARATOR)
        .map(str::trim)
        .filter(|element| !element.is_empty());

    for (index, element) in elements.enumerate() {
        let marks = vocabulary::split_repeat_marks(element).map_err(|r| malformed(row, r))?;
        if marks.opens {
            if repeat.is_some() {
                return Err(malformed(row, "nested repeat"));
            }
            repeat = Some(OpenRepeat {
                start: index,
                tally: Tally::START,
            });
        }

        let op = vocabulary::classify(marks.text, |name| offsets.contains_key(name));
        match (&mut repeat, op) {
            (Some(_), Op::PlaceMarker(_) | Op::SlipMarker(_) | Op::ToMarker { .. }) => {
                return Err(malformed(row, "marker referenced inside a repeat"));
            }
            (Some(_), Op::BindOffAll) => {
                return Err(malformed(row, "binding off all stitches inside a repeat"));
            }
            (Some(open), op) => apply(op, &mut open.tally, before, offsets, &mut scan),
            (None, op) => apply(op, &mut tally, before, offsets, &mut scan),
        }

        if let Some(times) = marks.closes {
            let Some(open) = repeat.take() else {
                return Err(malformed(row, "repeat closed without opening"));
            };
            let n = i64::from(times);
            tally.delta += open.tally.delta * n;
            tally.consumed = tally
                .consumed
                .zip(open.tally.consumed)
                .map(|(row_consumed, body)| row_consumed + body * n);
            scan.repeats.push(RepeatBlock {
                start: open.start,
                end: index + 1,
                times,
                stitch_delta: open.tally.delta,
            });
        }
    }

    if repeat.is_some() {
        return Err(malformed(row, "unterminated repeat"));
    }
    scan.delta = tally.delta;
    Ok(scan)
}

/// Apply one classified element to a tally.
///
/// Relative phrases are resolved against the row's starting count and the
/// current marker offsets; they always measure from the start of the row.
fn apply(
    op: Op<'_>,
    tally: &mut Tally,
    before: i64,
    offsets: &mut BTreeMap<String, i64>,
    scan: &mut RowScan,
) {
    match op {
        Op::Work { consumed, delta } => tally.work(consumed, delta),
        Op::BindOffAll => {
            scan.binds_off_all = true;
            tally.consumed = Some(before);
        }
        Op::ToEnd => tally.consumed = Some(before),
        Op::ToLast(n) => tally.consumed = Some(before - i64::from(n)),
        Op::ToMarker { name, before: gap } => {
            let offset = *offsets.entry(name.to_string()).or_insert(0);
            tally.consumed = Some(offset - i64::from(gap));
        }
        Op::PlaceMarker(name) => {
            let target = tally.position().unwrap_or(0);
            let offset = offsets.entry(name.to_string()).or_insert(0);
            scan.markers.push(MarkerRef {
                name: name.to_string(),
                action: MarkerAction::Place,
                offset_delta: target - *offset,
            });
            *offset = target;
        }
        Op::SlipMarker(name) => {
            let offset = offsets.entry(name.to_string()).or_insert(0);
            scan.markers.push(MarkerRef {
                name: name.to_string(),
                action: MarkerAction::Slip,
                offset_delta: tally.delta,
            });
            *offset += tally.delta;
        }
        Op::Other => tally.consumed = None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Row, Work};

    fn piece(texts: &[&str]) -> Piece {
        Piece {
            id: "swatch".to_string(),
            name: "Swatch".to_string(),
            work: Work::Flat,
            rows: texts
                .iter()
                .zip(1..)
                .map(|(text, number)| Row {
                    number,
                    text: (*text).to_string(),
                    stitch_count: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn lace_row_has_one_neutral_block() {
        let parsed = parse(&piece(&["CO 12 sts", "K2, *YO, K2tog* repeat 5 times"])).unwrap();
        let row = parsed.instruction(2).unwrap();
        assert_eq!(row.stitch_delta, 0);
        assert_eq!(row.stitch_count, 12);
        assert_eq!(
            row.repeats,
            vec![RepeatBlock {
                start: 1,
                end: 3,
                times: 5,
                stitch_delta: 0
            }]
        );
    }

    #[test]
    fn running_count_and_annotations() {
        let parsed = parse(&piece(&[
            "CO 20 sts (20 sts)",
            "RS: K1, SSK, K to last 3 sts, K2tog, K1 (18 sts)",
            "WS: P to end (18 sts)",
            "RS: K1, M1L, K to last st, M1R, K1 (20 sts)",
        ]))
        .unwrap();
        let counts: Vec<u32> = parsed.instructions.iter().map(|i| i.stitch_count).collect();
        assert_eq!(counts, vec![20, 18, 18, 20]);
        assert_eq!(parsed.total_rows, 4);
        assert_eq!(parsed.final_stitch_count(), 20);
    }

    #[test]
    fn annotation_mismatch_is_reported() {
        let err = parse(&piece(&["CO 20 sts", "K2tog, K to end (20 sts)"])).unwrap_err();
        assert_eq!(
            err,
            PatternError::StitchCountMismatch {
                row: 2,
                declared: 20,
                computed: 19
            }
        );
    }

    #[test]
    fn bind_off_all_zeroes_count() {
        let parsed = parse(&piece(&["CO 20 sts", "BO all sts (0 sts)"])).unwrap();
        let row = parsed.instruction(2).unwrap();
        assert_eq!(row.stitch_delta, -20);
        assert_eq!(row.stitch_count, 0);
    }

    #[test]
    fn negative_count_is_reported() {
        let err = parse(&piece(&["CO 4 sts", "BO 6 sts"])).unwrap_err();
        assert_eq!(err, PatternError::NegativeStitchCount { row: 2, count: -2 });
    }

    #[test]
    fn non_contiguous_rows() {
        let mut p = piece(&["CO 4 sts", "K to end"]);
        p.rows[1].number = 3;
        assert_eq!(
            parse(&p).unwrap_err(),
            PatternError::NonContiguousRows {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn malformed_repeats() {
        for text in [
            "*K1, *P1* repeat 2 times* repeat 3 times",
            "*K1, P1",
            "K1, P1* repeat 2 times",
            "*K1, P1* repeat 0 times",
            "*K1, P1*",
        ] {
            let err = parse(&piece(&["CO 10 sts", text])).unwrap_err();
            assert!(
                matches!(err, PatternError::MalformedRepeat { row: 2, .. }),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn marker_inside_repeat_is_malformed() {
        let err = parse(&piece(&["CO 10 sts", "*K1, PM a* repeat 2 times"])).unwrap_err();
        assert!(matches!(err, PatternError::MalformedRepeat { row: 2, .. }));
    }

    #[test]
    fn markers_are_created_lazily_and_moved() {
        let parsed = parse(&piece(&[
            "CO 10 sts, PM a",
            "K1, M1L, K to 1 st before a, M1R, K1, SM a",
        ]))
        .unwrap();
        assert!(parsed.markers.contains("a"));
        assert_eq!(
            parsed.instruction(1).unwrap().markers,
            vec![MarkerRef {
                name: "a".to_string(),
                action: MarkerAction::Place,
                offset_delta: 10
            }]
        );
        assert_eq!(
            parsed.instruction(2).unwrap().markers,
            vec![MarkerRef {
                name: "a".to_string(),
                action: MarkerAction::Slip,
                offset_delta: 2
            }]
        );
    }

    #[test]
    fn slipping_an_unknown_marker_creates_it() {
        let parsed = parse(&piece(&["CO 10 sts", "K5, SM mid, K to end"])).unwrap();
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.instruction(2).unwrap().markers[0].offset_delta, 0);
    }

    #[test]
    fn marker_placed_after_unknown_element_goes_to_zero() {
        let parsed = parse(&piece(&["CO 10 sts", "Twist, PM x, K to end"])).unwrap();
        assert_eq!(parsed.instruction(2).unwrap().markers[0].offset_delta, 0);
    }

    #[test]
    fn sections_use_final_pass_counts() {
        let parsed = parse(&piece(&[
            "CO 20 sts (20 sts)",
            "[RS: K1, SSK, K to last 3 sts, K2tog, K1",
            "WS: P to end] repeat 3 times (14 sts)",
            "K to end (14 sts)",
        ]))
        .unwrap();
        assert_eq!(
            parsed.sections,
            vec![RowSection {
                first_row: 2,
                last_row: 3,
                times: 3,
                stitch_delta: -2
            }]
        );
        assert_eq!(parsed.instruction(2).unwrap().stitch_count, 14);
        assert_eq!(parsed.instruction(2).unwrap().stitch_delta, -2);
        assert_eq!(parsed.instruction(3).unwrap().section, Some(0));
        assert_eq!(parsed.instruction(4).unwrap().section, None);
        assert_eq!(parsed.worked_rows(), 8);
    }

    #[test]
    fn section_annotation_checks_last_pass() {
        let err = parse(&piece(&[
            "CO 20 sts",
            "[K2tog, K to end] repeat 4 times (19 sts)",
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            PatternError::StitchCountMismatch {
                row: 2,
                declared: 19,
                computed: 16
            }
        );
    }

    #[test]
    fn section_that_runs_out_of_stitches() {
        let err = parse(&piece(&["CO 4 sts", "[K2tog, K to end] repeat 6 times"])).unwrap_err();
        assert!(matches!(err, PatternError::NegativeStitchCount { row: 2, .. }));
    }

    #[test]
    fn malformed_sections() {
        let nested = parse(&piece(&["CO 4 sts", "[K to end", "[K to end] repeat 2 times"]));
        assert!(matches!(nested, Err(PatternError::MalformedRepeat { row: 3, .. })));

        let unterminated = parse(&piece(&["CO 4 sts", "[K to end", "K to end"]));
        assert!(matches!(
            unterminated,
            Err(PatternError::MalformedRepeat { row: 2, .. })
        ));

        let stray = parse(&piece(&["CO 4 sts", "K to end] repeat 2 times"]));
        assert!(matches!(stray, Err(PatternError::MalformedRepeat { row: 2, .. })));
    }

    #[test]
    fn section_marker_deltas_scale_with_passes() {
        let parsed = parse(&piece(&[
            "CO 10 sts, PM a",
            "[K1, M1L, K to a, SM a] repeat 3 times",
            "K to a, PM b",
        ]))
        .unwrap();
        // a moved by one per pass; b lands on a's final offset.
        let b = &parsed.instruction(3).unwrap().markers[0];
        assert_eq!(b.name, "b");
        assert_eq!(b.offset_delta, 13);
    }

    #[test]
    fn parse_is_idempotent() {
        let p = piece(&["CO 20 sts", "[K2tog, K to end] repeat 4 times (16 sts)"]);
        assert_eq!(parse(&p).unwrap(), parse(&p).unwrap());
    }

    #[test]
    fn empty_piece() {
        let parsed = parse(&piece(&[])).unwrap();
        assert_eq!(parsed.total_rows, 0);
        assert!(parsed.instructions.is_empty());
        assert_eq!(parsed.worked_rows(), 0);
    }
}
