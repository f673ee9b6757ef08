//! Shaping calculator: distribute increases or decreases evenly over rows.
//!
//! Given a stitch count at each end of a span and the rows available, the
//! calculator cuts the span into one interval per shaping event and works
//! the event on the last row of its interval:
//!
//! ```text
//! events    = |end - start| / per_event
//! base      = rows / events
//! remainder = rows % events      (intervals one row longer)
//! ```
//!
//! [`ShapingBias`] decides which end of the span gets the short intervals,
//! i.e. the denser shaping. The default front-loads them, which is how
//! bind-offs read when a piece is worked top-down.
//!
//! The module also computes bind-off curves for armholes and sleeve caps
//! ([`bind_off_curve`]).

use serde::{Deserialize, Serialize};

use crate::types::PatternError;

/// Which end of a shaping span takes the shorter intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapingBias {
    /// Shorter intervals first: the earliest rows shape most densely.
    #[default]
    FrontLoaded,
    /// Shorter intervals last.
    BackLoaded,
}

/// Parameters of a shaping distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapingOptions {
    /// Stitches added or removed by one shaping row (1 for a single edge,
    /// 2 for paired edge shaping, 8 for a four-marker raglan round).
    pub per_event: u32,
    /// Interval tie-break.
    pub bias: ShapingBias,
}

impl Default for ShapingOptions {
    fn default() -> Self {
        Self {
            per_event: 1,
            bias: ShapingBias::default(),
        }
    }
}

/// One shaping row within a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapingEvent {
    /// 1-based row within the span.
    pub row_offset: u32,
    /// Stitches added (positive) or removed (negative) on that row.
    pub stitch_delta: i32,
}

/// Ordered shaping events taking a span from `start` to `end` stitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapingSchedule {
    /// Stitches at the start of the span.
    pub start: u32,
    /// Stitches at the end of the span.
    pub end: u32,
    /// Rows in the span.
    pub rows: u32,
    /// Shaping rows in increasing row order.
    pub events: Vec<ShapingEvent>,
}

impl ShapingSchedule {
    /// Number of shaping rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no shaping is needed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all event deltas; always `end - start`.
    #[must_use]
    pub fn total_delta(&self) -> i64 {
        self.events.iter().map(|e| i64::from(e.stitch_delta)).sum()
    }

    /// Stitch count after the given 1-based row of the span.
    #[must_use]
    pub fn stitches_after(&self, row_offset: u32) -> i64 {
        i64::from(self.start)
            + self
                .events
                .iter()
                .take_while(|e| e.row_offset <= row_offset)
                .map(|e| i64::from(e.stitch_delta))
                .sum::<i64>()
    }

    /// Interval lengths: rows from the previous event (or the span start)
    /// up to and including each event.
    #[must_use]
    pub fn intervals(&self) -> Vec<u32> {
        let mut previous = 0;
        self.events
            .iter()
            .map(|e| {
                let length = e.row_offset - previous;
                previous = e.row_offset;
                length
            })
            .collect()
    }

    /// Consecutive equal intervals collapsed into `(length, count)` runs.
    ///
    /// A front-loaded 14-event schedule over 40 rows yields
    /// `[(2, 2), (3, 12)]`.
    #[must_use]
    pub fn interval_runs(&self) -> Vec<(u32, u32)> {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for length in self.intervals() {
            match runs.last_mut() {
                Some((last, count)) if *last == length => *count += 1,
                _ => runs.push((length, 1)),
            }
        }
        runs
    }

    /// Rows after the last event that need no shaping.
    #[must_use]
    pub fn trailing_rows(&self) -> u32 {
        self.rows - self.events.last().map_or(0, |e| e.row_offset)
    }
}

/// Distribute single-stitch shaping from `start` to `end` stitches over
/// `available_rows` rows, front-loaded.
///
/// # Errors
///
/// Returns [`PatternError::ImpossibleShaping`] when
/// `|end - start| > available_rows`.
pub fn distribute_shaping(
    start: u32,
    end: u32,
    available_rows: u32,
) -> Result<ShapingSchedule, PatternError> {
    distribute_shaping_with(start, end, available_rows, ShapingOptions::default())
}

/// Distribute shaping with explicit options.
///
/// # Errors
///
/// Returns [`PatternError::ImpossibleShaping`] when the stitch difference
/// is not a multiple of `options.per_event`, or when more shaping rows are
/// needed than `available_rows`.
pub fn distribute_shaping_with(
    start: u32,
    end: u32,
    available_rows: u32,
    options: ShapingOptions,
) -> Result<ShapingSchedule, PatternError> {
    let impossible = || PatternError::ImpossibleShaping {
        start,
        end,
        rows: available_rows,
    };

    let delta = i64::from(end) - i64::from(start);
    if delta == 0 {
        return Ok(ShapingSchedule {
            start,
            end,
            rows: available_rows,
            events: Vec::new(),
        });
    }

    let per_event = options.per_event.max(1);
    let magnitude = delta.unsigned_abs();
    if magnitude % u64::from(per_event) != 0 {
        return Err(impossible());
    }
    let events = u32::try_from(magnitude / u64::from(per_event)).map_err(|_| impossible())?;
    if events > available_rows {
        return Err(impossible());
    }
    let step = i32::try_from(per_event).map_err(|_| impossible())?;
    let stitch_delta = if delta < 0 { -step } else { step };

    let base = available_rows / events;
    let remainder = available_rows % events;

    let mut offset = 0;
    let schedule = (0..events)
        .map(|i| {
            let long = match options.bias {
                ShapingBias::FrontLoaded => i >= events - remainder,
                ShapingBias::BackLoaded => i < remainder,
            };
            offset += base + u32::from(long);
            ShapingEvent {
                row_offset: offset,
                stitch_delta,
            }
        })
        .collect();

    Ok(ShapingSchedule {
        start,
        end,
        rows: available_rows,
        events: schedule,
    })
}

/// Split a bind-off of `stitches` into non-increasing chunks, each half of
/// what remains (rounded up).
///
/// Used for the curve at the base of a set-in armhole and sleeve cap:
/// 11 stitches bind off as `[6, 3, 1, 1]`.
#[must_use]
pub fn bind_off_curve(stitches: u32) -> Vec<u32> {
    let mut chunks = Vec::new();
    let mut remaining = stitches;
    let mut cap = u32::MAX;
    while remaining > 0 {
        let chunk = remaining.div_ceil(2).min(cap).max(1);
        chunks.push(chunk);
        remaining -= chunk;
        cap = chunk;
    }
    chunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decrease_110_to_96_over_40_rows() {
        let schedule = distribute_shaping(110, 96, 40).unwrap();
        assert_eq!(schedule.len(), 14);
        assert_eq!(schedule.total_delta(), -14);
        assert!(schedule.events.iter().all(|e| e.stitch_delta == -1));
        assert!(schedule.events.iter().all(|e| e.row_offset <= 40));
        let offsets: Vec<u32> = schedule.events.iter().map(|e| e.row_offset).collect();
        assert_eq!(
            offsets,
            vec![2, 4, 7, 10, 13, 16, 19, 22, 25, 28, 31, 34, 37, 40]
        );
        // Front-loaded: the short intervals come first.
        assert_eq!(schedule.interval_runs(), vec![(2, 2), (3, 12)]);
    }

    #[test]
    fn back_loaded_mirrors_intervals() {
        let options = ShapingOptions {
            per_event: 1,
            bias: ShapingBias::BackLoaded,
        };
        let schedule = distribute_shaping_with(110, 96, 40, options).unwrap();
        assert_eq!(schedule.interval_runs(), vec![(3, 12), (2, 2)]);
        assert_eq!(schedule.events.last().unwrap().row_offset, 40);
    }

    #[test]
    fn zero_delta_is_empty() {
        let schedule = distribute_shaping(80, 80, 12).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.trailing_rows(), 12);
    }

    #[test]
    fn zero_delta_with_zero_rows_is_empty() {
        assert!(distribute_shaping(5, 5, 0).unwrap().is_empty());
    }

    #[test]
    fn increases_are_positive() {
        let schedule = distribute_shaping(40, 50, 30).unwrap();
        assert_eq!(schedule.len(), 10);
        assert!(schedule.events.iter().all(|e| e.stitch_delta == 1));
        assert_eq!(schedule.events.last().unwrap().row_offset, 30);
    }

    #[test]
    fn one_event_per_row_when_delta_equals_rows() {
        let schedule = distribute_shaping(20, 10, 10).unwrap();
        let offsets: Vec<u32> = schedule.events.iter().map(|e| e.row_offset).collect();
        assert_eq!(offsets, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn too_many_events_is_impossible() {
        assert_eq!(
            distribute_shaping(20, 9, 10),
            Err(PatternError::ImpossibleShaping {
                start: 20,
                end: 9,
                rows: 10
            })
        );
    }

    #[test]
    fn zero_rows_with_delta_is_impossible() {
        assert!(matches!(
            distribute_shaping(10, 11, 0),
            Err(PatternError::ImpossibleShaping { .. })
        ));
    }

    #[test]
    fn paired_shaping_requires_even_delta() {
        let options = ShapingOptions {
            per_event: 2,
            ..ShapingOptions::default()
        };
        assert!(matches!(
            distribute_shaping_with(50, 45, 20, options),
            Err(PatternError::ImpossibleShaping { .. })
        ));
        let schedule = distribute_shaping_with(50, 40, 20, options).unwrap();
        assert_eq!(schedule.len(), 5);
        assert!(schedule.events.iter().all(|e| e.stitch_delta == -2));
        assert_eq!(schedule.total_delta(), -10);
    }

    #[test]
    fn paired_shaping_counts_events_not_stitches() {
        // 16 stitches in pairs is 8 events, which fits in 8 rows.
        let options = ShapingOptions {
            per_event: 2,
            ..ShapingOptions::default()
        };
        assert_eq!(distribute_shaping_with(40, 56, 8, options).unwrap().len(), 8);
    }

    #[test]
    fn stitches_after_tracks_running_count() {
        let schedule = distribute_shaping(110, 96, 40).unwrap();
        assert_eq!(schedule.stitches_after(0), 110);
        assert_eq!(schedule.stitches_after(3), 109);
        assert_eq!(schedule.stitches_after(4), 108);
        assert_eq!(schedule.stitches_after(40), 96);
    }

    #[test]
    fn bind_off_curve_halves() {
        assert_eq!(bind_off_curve(11), vec![6, 3, 1, 1]);
        assert_eq!(bind_off_curve(8), vec![4, 2, 1, 1]);
        assert_eq!(bind_off_curve(1), vec![1]);
        assert!(bind_off_curve(0).is_empty());
    }

    #[test]
    fn bind_off_curve_sums_and_never_increases() {
        for total in 0..60 {
            let chunks = bind_off_curve(total);
            assert_eq!(chunks.iter().sum::<u32>(), total);
            assert!(chunks.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
