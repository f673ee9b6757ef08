//! Drop-shoulder construction: straight panels and straight-topped
//! sleeves sewn along the side of the body.

use crate::normalize::armhole_depth_cm;
use crate::types::{PatternError, Piece};

use super::finishing;
use super::panels::{Armhole, NeckShape, PanelDims, body_panels, sleeve_base, sleeve_pair};
use super::{Plan, even};

/// Back, front(s), sleeves, and finishing.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn pieces(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let dims = PanelDims::for_plan(plan);
    let neck = NeckShape::for_plan(plan, dims.chest, dims.armhole_rows);

    let mut pieces = body_panels(plan, &Armhole::Straight, Some(neck))?;
    if !plan.is_sleeveless() {
        pieces.extend(sleeve_pair(|id, name| sleeve(plan, id, name))?);
    }
    pieces.extend(finishing::pieces(plan)?);
    Ok(pieces)
}

/// Stitches across the top of a sleeve: twice the armhole depth.
#[must_use]
pub fn sleeve_top(plan: &Plan<'_>) -> u32 {
    even(plan.gauge.stitches_for(2.0 * armhole_depth_cm(&plan.measurements)))
}

fn sleeve(plan: &Plan<'_>, id: &str, name: &str) -> Result<Piece, PatternError> {
    let mut b = sleeve_base(plan, id, name, sleeve_top(plan))?;
    b.bind_off_all("")?;
    Ok(b.finish())
}
