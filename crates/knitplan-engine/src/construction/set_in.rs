//! Set-in sleeve construction.
//!
//! The body panels bind off a curve at each armhole and work straight to
//! the shoulder. The sleeve cap starts with the same first bind-off, then
//! decreases every right-side row over two thirds of the armhole depth and
//! binds off the top.

use crate::shaping::bind_off_curve;
use crate::types::{PatternError, Piece, round_count};

use super::finishing;
use super::panels::{Armhole, NeckShape, PanelDims, body_panels, sleeve_base, sleeve_pair};
use super::piece::{Side, paired_decrease};
use super::{Plan, even};

/// Back, front(s), sleeves, and finishing.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn pieces(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let dims = PanelDims::for_plan(plan);
    let chunks = bind_off_curve((dims.chest - dims.shoulder) / 2);
    let curve_rows = 2 * u32::try_from(chunks.len()).unwrap_or(u32::MAX);
    let neck = NeckShape::for_plan(
        plan,
        dims.shoulder,
        dims.armhole_rows.saturating_sub(curve_rows),
    );

    let mut pieces = body_panels(plan, &Armhole::Curve(chunks.clone()), Some(neck))?;
    if !plan.is_sleeveless() {
        let underarm = chunks.first().copied().unwrap_or(0);
        pieces.extend(sleeve_pair(|id, name| sleeve(plan, id, name, underarm))?);
    }
    pieces.extend(finishing::pieces(plan)?);
    Ok(pieces)
}

/// A sleeve with a bind-off-and-decrease cap.
fn sleeve(plan: &Plan<'_>, id: &str, name: &str, underarm: u32) -> Result<Piece, PatternError> {
    let bicep = plan.bicep_stitches();
    let mut b = sleeve_base(plan, id, name, bicep)?;

    let underarm = underarm.min(bicep.saturating_sub(4) / 2);
    b.bind_off_each_side(&[underarm])?;

    let cap_rows = (plan.targets.armhole_rows * 2 / 3).saturating_sub(2);
    let pairs = cap_rows / 2;
    let after_underarm = b.stitches();
    let top = even(round_count(f64::from(bicep) * 0.3))
        .max(after_underarm.saturating_sub(2 * pairs))
        .min(after_underarm);
    b.shape(
        top,
        cap_rows,
        &paired_decrease(b.fill(Side::Right)),
        plan.config.shaping_bias,
    )?;
    b.bind_off_all("")?;
    Ok(b.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::construction::test_plan;
    use crate::parse::parse;
    use crate::types::{GarmentType, Neckline};

    #[test]
    fn pullover_has_back_front_sleeves_and_neckband() {
        test_plan(GarmentType::Pullover, Neckline::Crew, |plan| {
            let pieces = pieces(plan).unwrap();
            let ids: Vec<&str> = pieces.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(
                ids,
                vec!["back", "front", "left-sleeve", "right-sleeve", "neckband"]
            );
            for piece in &pieces {
                assert_eq!(parse(piece).unwrap().final_stitch_count(), 0, "{}", piece.id);
            }
        });
    }

    #[test]
    fn sleeve_cap_starts_with_the_armhole_bind_off() {
        test_plan(GarmentType::Pullover, Neckline::Crew, |plan| {
            let pieces = pieces(plan).unwrap();
            let back = &pieces[0];
            let sleeve = &pieces[2];
            let first_bind_off = |piece: &Piece| {
                piece
                    .rows
                    .iter()
                    .find(|r| r.text.starts_with("RS: BO ") && !r.text.contains("all"))
                    .map(|r| r.text.split(',').next().unwrap().to_string())
            };
            assert_eq!(first_bind_off(back), first_bind_off(sleeve));
        });
    }

    #[test]
    fn cardigan_has_two_fronts_and_bands() {
        test_plan(GarmentType::Cardigan, Neckline::VNeck, |plan| {
            let pieces = pieces(plan).unwrap();
            let ids: Vec<&str> = pieces.iter().map(|p| p.id.as_str()).collect();
            assert!(ids.contains(&"left-front"));
            assert!(ids.contains(&"right-front"));
            assert!(ids.contains(&"button-band"));
            assert!(ids.contains(&"buttonhole-band"));
            assert!(!ids.contains(&"front"));
        });
    }

    #[test]
    fn vest_has_armhole_bands_instead_of_sleeves() {
        test_plan(GarmentType::Vest, Neckline::Crew, |plan| {
            let pieces = pieces(plan).unwrap();
            let ids: Vec<&str> = pieces.iter().map(|p| p.id.as_str()).collect();
            assert!(!ids.contains(&"left-sleeve"));
            assert!(ids.contains(&"left-armhole-band"));
            assert!(ids.contains(&"right-armhole-band"));
        });
    }
}
