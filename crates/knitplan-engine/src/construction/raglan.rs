//! Flat raglan construction.
//!
//! Body panels and sleeves bind off the same underarm stitches, then
//! decrease along the raglan lines on every shaping row until the armhole
//! depth is used up. All four raglan seams share one decrease count so the
//! edges sew together row for row. The body spends two rows on the
//! underarm bind-off and may spend one more getting back to the right
//! side first, so three rows of the armhole depth are never shaping rows:
//!
//! ```text
//! events = min( (chest − 2·underarm − neck) / 2,
//!               (armhole rows − 3) / 2,
//!               (bicep − 2·underarm − 4) / 2 )
//! ```

use crate::types::{PatternError, Piece};

use super::finishing;
use super::panels::{Armhole, PanelDims, body_panels, sleeve_base, sleeve_pair};
use super::piece::{Side, paired_decrease};
use super::{Plan, even};

/// Narrowest sleeve top left between the raglan lines.
const MIN_SLEEVE_TOP: u32 = 4;

/// Raglan decreases per seam for the plan.
#[must_use]
pub fn raglan_events(plan: &Plan<'_>) -> u32 {
    let dims = PanelDims::for_plan(plan);
    let underarm = plan.underarm_stitches();
    let neck = even(plan.targets.neck_stitches);
    let body = dims.chest.saturating_sub(2 * underarm + neck) / 2;
    let rows = dims.armhole_rows.saturating_sub(3) / 2;
    let sleeve = plan
        .bicep_stitches()
        .saturating_sub(2 * underarm + MIN_SLEEVE_TOP)
        / 2;
    body.min(rows).min(sleeve)
}

/// Back, front(s), sleeves, and finishing.
///
/// Fronts match the back: the neckline is finished by the neckband
/// picked up across the tops of all four pieces.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn pieces(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let underarm = plan.underarm_stitches();
    let events = raglan_events(plan);
    let armhole = Armhole::Raglan { underarm, events };

    let mut pieces = body_panels(plan, &armhole, None)?;
    pieces.extend(sleeve_pair(|id, name| {
        sleeve(plan, id, name, underarm, events)
    })?);
    pieces.extend(finishing::pieces(plan)?);
    Ok(pieces)
}

fn sleeve(
    plan: &Plan<'_>,
    id: &str,
    name: &str,
    underarm: u32,
    events: u32,
) -> Result<Piece, PatternError> {
    let dims = PanelDims::for_plan(plan);
    let mut b = sleeve_base(plan, id, name, plan.bicep_stitches())?;
    b.bind_off_each_side(&[underarm])?;
    let top = b.stitches().saturating_sub(2 * events);
    b.shape(
        top,
        dims.armhole_rows.saturating_sub(2),
        &paired_decrease(b.fill(Side::Right)),
        plan.config.shaping_bias,
    )?;
    b.bind_off_all("")?;
    Ok(b.finish())
}
