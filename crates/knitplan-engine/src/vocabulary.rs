//! The instruction text vocabulary shared by the generator and the parser.
//!
//! A row instruction reads:
//!
//! ```text
//! [RS: K1, SSK, K to last 3 sts, K2tog, K1] repeat 5 times (98 sts)
//! ^ ^^^  ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^ ^^^^^^^^
//! | |    comma-separated elements           section closer  annotation
//! | label
//! section opener
//! ```
//!
//! Every part except the elements is optional. Inside a row, elements
//! between `*` marks form an in-row repeat closed by `repeat N times`:
//! `K2, *YO, K2tog* repeat 5 times`.
//!
//! The generator renders through the helpers here and the parser scans
//! through [`classify`] and the `split_*` functions, so the two can never
//! disagree on spelling. Keyword matching is case-insensitive; marker
//! names keep the case they were written in.

/// Delimits an in-row repeat.
pub const REPEAT_MARK: char = '*';
/// Opens a row section at the start of its first row.
pub const SECTION_OPEN: char = '[';
/// Closes a row section at the end of its last row.
pub const SECTION_CLOSE: char = ']';
/// Separates elements within a row.
pub const ELEMENT_SEPARATOR: char = ',';

// ───────────────────────── Rendering ─────────────────────────────────

/// `"1 time"` or `"N times"`.
#[must_use]
pub fn times(n: u32) -> String {
    if n == 1 {
        "1 time".to_string()
    } else {
        format!("{n} times")
    }
}

/// Append the stitch-count annotation: `"K to end (88 sts)"`.
#[must_use]
pub fn annotate(text: &str, stitches: u32) -> String {
    let noun = if stitches == 1 { "st" } else { "sts" };
    format!("{text} ({stitches} {noun})")
}

/// Prefix a side or step label: `"RS: K to end"`.
#[must_use]
pub fn labeled(label: &str, text: &str) -> String {
    format!("{label}: {text}")
}

/// Wrap elements in an in-row repeat: `"*K1, P1* repeat 44 times"`.
#[must_use]
pub fn in_row_repeat(body: &str, count: u32) -> String {
    format!("{REPEAT_MARK}{body}{REPEAT_MARK} repeat {}", times(count))
}

/// Mark the first row of a section.
#[must_use]
pub fn open_section(text: &str) -> String {
    format!("{SECTION_OPEN}{text}")
}

/// Mark the last row of a section worked `count` times.
#[must_use]
pub fn close_section(text: &str, count: u32) -> String {
    format!("{text}{SECTION_CLOSE} repeat {}", times(count))
}

// ───────────────────────── Scanning ──────────────────────────────────

/// Parse a stitch or repeat count.
#[must_use]
pub fn parse_count(word: &str) -> Option<u32> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse().ok()
}

/// Parse `repeat N times` (or `repeat 1 time`). Returns the count, which
/// may be zero; callers reject zero themselves.
#[must_use]
pub fn parse_repeat_clause(clause: &str) -> Option<u32> {
    let words: Vec<String> = clause
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["repeat", n, "times" | "time"] => parse_count(n),
        _ => None,
    }
}

/// Split a trailing `(N sts)` annotation off a row.
///
/// Text that merely ends in parentheses is left alone.
#[must_use]
pub fn split_annotation(text: &str) -> (&str, Option<u32>) {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix(')') else {
        return (trimmed, None);
    };
    let Some(open) = inner.rfind('(') else {
        return (trimmed, None);
    };
    let mut words = inner[open + 1..].split_whitespace();
    match (words.next().and_then(parse_count), words.next(), words.next()) {
        (Some(n), Some(noun), None)
            if noun.eq_ignore_ascii_case("sts") || noun.eq_ignore_ascii_case("st") =>
        {
            (trimmed[..open].trim_end(), Some(n))
        }
        _ => (trimmed, None),
    }
}

/// Section brackets found on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMarks<'a> {
    /// Row body with the brackets and closer clause removed.
    pub body: &'a str,
    /// The row opens a section.
    pub opens: bool,
    /// The row closes a section worked this many times.
    pub closes: Option<u32>,
}

/// Split section brackets off a row body (annotation already removed).
///
/// # Errors
///
/// Returns a reason when a bracket appears anywhere other than the start
/// (`[`) or before the closing clause (`]`), or when the closer lacks a
/// positive repeat count.
pub fn split_section(text: &str) -> Result<SectionMarks<'_>, &'static str> {
    let mut body = text.trim();
    let opens = body.starts_with(SECTION_OPEN);
    if opens {
        body = body[SECTION_OPEN.len_utf8()..].trim_start();
    }

    let mut closes = None;
    if let Some(close) = body.rfind(SECTION_CLOSE) {
        let clause = body[close + SECTION_CLOSE.len_utf8()..].trim();
        match parse_repeat_clause(clause) {
            Some(0) => return Err("section repeated zero times"),
            Some(n) => closes = Some(n),
            None => return Err("section closer without a repeat count"),
        }
        body = body[..close].trim_end();
    }

    if body.contains(SECTION_OPEN) {
        return Err("section opened inside a row");
    }
    if body.contains(SECTION_CLOSE) {
        return Err("stray section closer");
    }
    Ok(SectionMarks {
        body,
        opens,
        closes,
    })
}

/// Split a leading `Label:` off a row body.
///
/// Labels never contain element separators or repeat marks, which keeps
/// colons inside elements from being mistaken for one.
#[must_use]
pub fn split_label(body: &str) -> (Option<&str>, &str) {
    match body.split_once(':') {
        Some((label, rest))
            if !label.trim().is_empty()
                && !label.contains(ELEMENT_SEPARATOR)
                && !label.contains(REPEAT_MARK) =>
        {
            (Some(label.trim()), rest.trim_start())
        }
        _ => (None, body),
    }
}

/// Repeat marks found on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatMarks<'a> {
    /// Element text without marks or closing clause.
    pub text: &'a str,
    /// The element starts an in-row repeat.
    pub opens: bool,
    /// The element ends an in-row repeat worked this many times.
    pub closes: Option<u32>,
}

/// Split in-row repeat marks off one element.
///
/// # Errors
///
/// Returns a reason for a closing mark without a positive repeat count,
/// or for extra marks after the closing clause.
pub fn split_repeat_marks(element: &str) -> Result<RepeatMarks<'_>, &'static str> {
    let mut text = element.trim();
    let opens = text.starts_with(REPEAT_MARK);
    if opens {
        text = text[REPEAT_MARK.len_utf8()..].trim_start();
    }

    let mut closes = None;
    if let Some(close) = text.find(REPEAT_MARK) {
        let clause = text[close + REPEAT_MARK.len_utf8()..].trim();
        if clause.contains(REPEAT_MARK) {
            return Err("nested repeat");
        }
        match parse_repeat_clause(clause) {
            Some(0) => return Err("repeat worked zero times"),
            Some(n) => closes = Some(n),
            None => return Err("repeat closed without a repeat count"),
        }
        text = text[..close].trim_end();
    }
    Ok(RepeatMarks {
        text,
        opens,
        closes,
    })
}

/// Marker names: a letter followed by letters, digits, `-` or `_`.
#[must_use]
pub fn is_marker_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// What one element does to the stitches on the needles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op<'a> {
    /// Works a fixed number of stitches and changes the count by `delta`.
    ///
    /// Covers plain stitches, decreases and increases, cast-ons,
    /// bind-offs, picked-up stitches, and stitches put on or taken off
    /// hold.
    Work {
        /// Stitches taken off the left needle.
        consumed: u32,
        /// Net change in the stitch count.
        delta: i64,
    },
    /// Binds off every stitch; the count becomes zero.
    BindOffAll,
    /// Works every remaining stitch.
    ToEnd,
    /// Works up to the last `n` stitches.
    ToLast(u32),
    /// Works up to `before` stitches before a marker.
    ToMarker {
        /// Marker name.
        name: &'a str,
        /// Stitches left before the marker.
        before: u32,
    },
    /// Places a marker.
    PlaceMarker(&'a str),
    /// Slips a marker.
    SlipMarker(&'a str),
    /// Anything else: no effect on the count, position becomes unknown.
    Other,
}

/// Classify one element (repeat marks already removed).
///
/// `is_marker` answers whether a bare word names a marker already seen in
/// the piece, so `K to side` reads as a marker phrase only once `side`
/// exists.
pub fn classify<'a>(element: &'a str, is_marker: impl Fn(&str) -> bool) -> Op<'a> {
    let words: Vec<&str> = element.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_ascii_lowercase()).collect();
    let lower: Vec<&str> = lower.iter().map(String::as_str).collect();

    leading_keyword(&words, &lower)
        .or_else(|| relative_phrase(&words, &lower, &is_marker))
        .unwrap_or(Op::Other)
}

const fn work(consumed: u32, delta: i64) -> Op<'static> {
    Op::Work { consumed, delta }
}

fn leading_keyword<'a>(words: &[&'a str], lower: &[&str]) -> Option<Op<'a>> {
    match lower {
        [word] => single_stitch(word),
        ["rib", n] => parse_count(n).map(|n| work(n, 0)),
        ["co", n] | ["co", n, "sts" | "st"] | ["cast", "on", n, ..] => {
            parse_count(n).map(|n| work(0, i64::from(n)))
        }
        ["bo", "all" | "remaining", ..] => Some(Op::BindOffAll),
        ["bo", n] | ["bo", n, "sts" | "st", ..] => {
            parse_count(n).map(|n| work(n, -i64::from(n)))
        }
        ["pu", n, ..] | ["pick", "up", "and", "knit", n, ..] => {
            parse_count(n).map(|n| work(0, i64::from(n)))
        }
        ["place", n, "sts" | "st", "on", "hold", ..] => {
            parse_count(n).map(|n| work(n, -i64::from(n)))
        }
        ["return", n, "held", "sts" | "st", ..] => {
            parse_count(n).map(|n| work(0, i64::from(n)))
        }
        ["pm", _] if is_marker_name(words[1]) => Some(Op::PlaceMarker(words[1])),
        ["sm", _] if is_marker_name(words[1]) => Some(Op::SlipMarker(words[1])),
        _ => None,
    }
}

fn single_stitch(word: &str) -> Option<Op<'static>> {
    match word {
        "k" | "p" | "sl1" => Some(work(1, 0)),
        "k2tog" | "ssk" | "p2tog" | "ssp" => Some(work(2, -1)),
        "k3tog" | "sk2p" | "s2kp" | "cdd" => Some(work(3, -2)),
        "yo" | "m1" | "m1l" | "m1r" | "m1p" => Some(work(0, 1)),
        "kfb" | "pfb" => Some(work(1, 1)),
        _ => word
            .strip_prefix('k')
            .or_else(|| word.strip_prefix('p'))
            .or_else(|| word.strip_prefix("sl"))
            .and_then(parse_count)
            .map(|n| work(n, 0)),
    }
}

fn relative_phrase<'a>(
    words: &[&'a str],
    lower: &[&str],
    is_marker: &impl Fn(&str) -> bool,
) -> Option<Op<'a>> {
    let to = lower.iter().skip(1).position(|w| *w == "to")? + 1;
    let tail = &lower[to + 1..];
    let names = &words[to + 1..];
    match tail {
        ["end"] => Some(Op::ToEnd),
        ["last", "st"] => Some(Op::ToLast(1)),
        ["last", n, "sts" | "st"] => parse_count(n).map(Op::ToLast),
        [n, "sts" | "st", "before", _] if is_marker_name(names[3]) => {
            parse_count(n).map(|before| Op::ToMarker {
                name: names[3],
                before,
            })
        }
        ["marker", _] if is_marker_name(names[1]) => Some(Op::ToMarker {
            name: names[1],
            before: 0,
        }),
        [_] if is_marker(names[0]) => Some(Op::ToMarker {
            name: names[0],
            before: 0,
        }),
        _ => None,
    }
}
