//! Finishing pieces picked up from finished edges: the neckband, cardigan
//! front bands, and armhole bands of sleeveless garments.

use crate::normalize::{NECK_FRACTION, armhole_depth_cm};
use crate::types::{Neckline, PatternError, Piece, Work};

use super::piece::{PieceBuilder, Step};
use super::{Plan, even};

/// Neck circumference relative to the back neck width.
const NECK_AROUND: f64 = 2.5;

/// Edge stitches kept in rib at each end of the buttonhole row.
const BUTTONHOLE_EDGE: u32 = 3;

/// Neckband, front bands, and armhole bands for a seamed garment.
///
/// # Errors
///
/// Propagates builder errors.
pub fn pieces(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let mut pieces = vec![neckband(plan, neck_pickup(plan))?];
    if plan.is_cardigan() {
        pieces.push(button_band(plan)?);
        pieces.push(buttonhole_band(plan)?);
    }
    if plan.is_sleeveless() {
        pieces.extend(armhole_bands(plan)?);
    }
    Ok(pieces)
}

/// Stitches picked up around a seamed neckline.
#[must_use]
pub fn neck_pickup(plan: &Plan<'_>) -> u32 {
    let widen = match plan.analysis.neckline {
        Neckline::Boat => 1.3,
        _ => 1.0,
    };
    let cm = plan.measurements.shoulder_width * NECK_FRACTION * NECK_AROUND * widen;
    even(plan.gauge.stitches_for(cm)).max(4)
}

/// Neckband ribbing over `pickup` stitches; flat on a cardigan, in the
/// round otherwise.
///
/// # Errors
///
/// Propagates builder errors.
pub fn neckband(plan: &Plan<'_>, pickup: u32) -> Result<Piece, PatternError> {
    let (work, name) = match (plan.is_cardigan(), plan.analysis.neckline) {
        (true, _) => (Work::Flat, "Neckband"),
        (false, Neckline::Turtleneck) => (Work::Round, "Turtleneck collar"),
        (false, _) => (Work::Round, "Neckband"),
    };
    let mut b = PieceBuilder::new("neckband", name, work, plan.fabric);
    b.row(pick_up(pickup, "around neck edge"))?;
    b.rib(plan.neckband_rows())?;
    b.bind_off_all("in rib")?;
    Ok(b.finish())
}

/// Stitches picked up along a cardigan front edge.
#[must_use]
pub fn front_band_pickup(plan: &Plan<'_>) -> u32 {
    even(plan.gauge.stitches_for(plan.measurements.body_length)).max(4)
}

fn button_band(plan: &Plan<'_>) -> Result<Piece, PatternError> {
    let mut b = PieceBuilder::new("button-band", "Button band", Work::Flat, plan.fabric);
    b.row(pick_up(front_band_pickup(plan), "along left front edge"))?;
    b.rib(plan.band_rows())?;
    b.bind_off_all("in rib")?;
    Ok(b.finish())
}

fn buttonhole_band(plan: &Plan<'_>) -> Result<Piece, PatternError> {
    let stitches = front_band_pickup(plan);
    let mut b = PieceBuilder::new(
        "buttonhole-band",
        "Buttonhole band",
        Work::Flat,
        plan.fabric,
    );
    b.row(pick_up(stitches, "along right front edge"))?;
    let rows = plan.band_rows();
    let before = rows / 2;
    b.rib(before)?;
    b.row(buttonhole_row(stitches, plan.config.buttons))?;
    b.rib(rows.saturating_sub(before + 1))?;
    b.bind_off_all("in rib")?;
    Ok(b.finish())
}

/// One row of evenly spaced `YO, K2tog` buttonholes.
#[must_use]
pub fn buttonhole_row(stitches: u32, buttons: u32) -> Step {
    let usable = stitches.saturating_sub(2 * BUTTONHOLE_EDGE);
    let buttons = buttons.clamp(1, (usable / 3).max(1));
    let gap = usable.saturating_sub(2 * buttons) / buttons;
    let hole = if gap == 0 {
        "YO, K2tog".to_string()
    } else {
        format!("YO, K2tog, Rib {gap}")
    };
    let holes = if buttons == 1 {
        hole
    } else {
        crate::vocabulary::in_row_repeat(&hole, buttons)
    };
    Step::plain(format!("Rib {BUTTONHOLE_EDGE}, {holes}, Rib to end"))
}

fn armhole_bands(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let pickup = even(plan.gauge.stitches_for(2.0 * armhole_depth_cm(&plan.measurements)));
    [
        ("left-armhole-band", "Left armhole band"),
        ("right-armhole-band", "Right armhole band"),
    ]
    .into_iter()
    .map(|(id, name)| {
        let mut b = PieceBuilder::new(id, name, Work::Round, plan.fabric);
        b.row(pick_up(pickup, "around armhole edge"))?;
        b.rib(plan.band_rows())?;
        b.bind_off_all("in rib")?;
        Ok(b.finish())
    })
    .collect()
}

fn pick_up(stitches: u32, edge: &str) -> Step {
    Step::new(
        format!("Pick up and knit {stitches} sts {edge}"),
        i64::from(stitches),
    )
}
