//! Flat body panels and sleeves shared by the seamed constructions.
//!
//! Every panel follows the same segment pipeline:
//!
//! ```text
//! cast on (hip) → hem ribbing → body shaping (hip → chest)
//!   → armhole (straight, bind-off curve, or raglan) → neck → bind off
//! ```
//!
//! A cardigan front is half a panel: its body and armhole shaping happen at
//! the side edge only and its neck shaping at the centre edge.

use crate::types::{Neckline, PatternError, Piece, Work, round_count};

use super::Plan;
use super::even;
use super::piece::{
    Edge, PieceBuilder, Side, Step, edge_decrease, edge_increase, paired_decrease,
    paired_increase,
};

/// Stitch and row counts of a full-width panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelDims {
    /// Stitches at the hem.
    pub hip: u32,
    /// Stitches at the underarm.
    pub chest: u32,
    /// Stitches across the shoulders.
    pub shoulder: u32,
    /// Rows from the top of the hem to the underarm.
    pub lower_rows: u32,
    /// Rows from the underarm to the shoulder.
    pub armhole_rows: u32,
}

impl PanelDims {
    /// Panel counts for the plan: half the body circumference, rounded up
    /// to even counts so paired shaping always divides.
    #[must_use]
    pub fn for_plan(plan: &Plan<'_>) -> Self {
        let targets = &plan.targets;
        let chest = even(targets.chest_stitches / 2).max(8);
        let hem = plan.hem_rows();
        let armhole_rows = targets
            .armhole_rows
            .min(targets.body_rows.saturating_sub(hem + 2))
            .max(2);
        Self {
            hip: even(targets.hip_stitches / 2).max(8),
            chest,
            shoulder: even(targets.shoulder_stitches).clamp(4, chest),
            lower_rows: targets.body_rows.saturating_sub(hem + armhole_rows),
            armhole_rows,
        }
    }
}

/// Width of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// Back or pullover front.
    Full,
    /// Cardigan front; the side seam runs along `side_edge`.
    Half {
        /// Edge holding the side seam and armhole.
        side_edge: Edge,
    },
}

impl PanelKind {
    /// Share of a full-width count.
    #[must_use]
    pub const fn width(self, full: u32) -> u32 {
        match self {
            Self::Full => full,
            Self::Half { .. } => full / 2,
        }
    }

    fn shaping_step(self, fill: &str, increase: bool) -> Step {
        match (self, increase) {
            (Self::Full, true) => paired_increase(fill),
            (Self::Full, false) => paired_decrease(fill),
            (Self::Half { side_edge }, true) => edge_increase(side_edge, fill),
            (Self::Half { side_edge }, false) => edge_decrease(side_edge, fill),
        }
    }

    fn bind_off(self, b: &mut PieceBuilder, chunks: &[u32]) -> Result<(), PatternError> {
        match self {
            Self::Full => b.bind_off_each_side(chunks),
            Self::Half { side_edge } => {
                for &chunk in chunks {
                    b.bind_off_at(side_edge, chunk)?;
                }
                Ok(())
            }
        }
    }
}

/// Shaping between the underarm and the shoulder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Armhole {
    /// No shaping (drop shoulder).
    Straight,
    /// Bind-off curve, per side (set-in sleeve).
    Curve(Vec<u32>),
    /// Underarm bind-off then one raglan decrease per side every
    /// `events` right-side rows.
    Raglan {
        /// Stitches bound off at each underarm.
        underarm: u32,
        /// Raglan decreases per side.
        events: u32,
    },
}

/// Front neck opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeckShape {
    /// Stitches bound off at the centre.
    pub centre: u32,
    /// Single decreases on each side after the centre bind-off.
    pub per_side: u32,
    /// Rows from the start of the neck to the shoulder.
    pub rows: u32,
}

impl NeckShape {
    /// Neck opening for a front whose top is `top` stitches wide, with
    /// `rows_available` rows above the armhole shaping.
    ///
    /// The centre bind-off grows when there are not enough right-side
    /// rows for the side decreases.
    #[must_use]
    pub fn for_plan(plan: &Plan<'_>, top: u32, rows_available: u32) -> Self {
        let neckline = plan.analysis.neckline;
        let (depth_cm, fraction, widen) = match neckline {
            Neckline::Crew | Neckline::Turtleneck => (Some(7.0), 0.4, 1.0),
            Neckline::Scoop => (Some(10.0), 0.3, 1.0),
            Neckline::Boat => (Some(2.0), 1.0, 1.3),
            Neckline::VNeck => (None, 0.0, 1.0),
        };

        let width = even(round_count(f64::from(plan.targets.neck_stitches) * widen))
            .min(top.saturating_sub(4));
        let rows_available = rows_available.max(2);
        let rows = depth_cm.map_or(rows_available, |cm| {
            plan.gauge.rows_for(cm).clamp(2, rows_available)
        });
        let pairs = rows.saturating_sub(2) / 2;

        let mut centre = even(round_count(f64::from(width) * fraction)).min(width);
        let mut per_side = (width - centre) / 2;
        if per_side > pairs {
            per_side = pairs;
            centre = width - 2 * pairs;
        }
        Self {
            centre,
            per_side,
            rows,
        }
    }

    /// Total width of the opening.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.centre + 2 * self.per_side
    }
}

/// Build one flat body panel.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn body_panel(
    plan: &Plan<'_>,
    id: &str,
    name: &str,
    kind: PanelKind,
    armhole: &Armhole,
    neck: Option<NeckShape>,
) -> Result<Piece, PatternError> {
    let dims = PanelDims::for_plan(plan);
    let bias = plan.config.shaping_bias;
    let mut b = PieceBuilder::new(id, name, Work::Flat, plan.fabric);

    b.cast_on(kind.width(dims.hip))?;
    b.rib(plan.hem_rows())?;

    let chest = kind.width(dims.chest);
    let step = kind.shaping_step(b.fill(Side::Right), chest > b.stitches());
    b.shape(chest, dims.lower_rows, &step, bias)?;

    let before = b.len();
    match armhole {
        Armhole::Straight => {}
        Armhole::Curve(chunks) => kind.bind_off(&mut b, chunks)?,
        Armhole::Raglan { underarm, events } => {
            kind.bind_off(&mut b, &[*underarm])?;
            let per_event = match kind {
                PanelKind::Full => 2,
                PanelKind::Half { .. } => 1,
            };
            let top = b.stitches().saturating_sub(per_event * events);
            let rows = dims.armhole_rows.saturating_sub(rows_since(&b, before));
            let step = kind.shaping_step(b.fill(Side::Right), false);
            b.shape(top, rows, &step, bias)?;
        }
    }
    let rows_left = dims.armhole_rows.saturating_sub(rows_since(&b, before));

    match (neck, kind) {
        (None, _) => {
            b.work_even(rows_left)?;
            b.bind_off_all("")?;
        }
        (Some(neck), PanelKind::Full) => {
            b.work_even(rows_left.saturating_sub(neck.rows))?;
            split_front(&mut b, neck, bias)?;
        }
        (Some(neck), PanelKind::Half { side_edge }) => {
            b.work_even(rows_left.saturating_sub(neck.rows))?;
            let neck_edge = match side_edge {
                Edge::Start => Edge::End,
                Edge::End => Edge::Start,
            };
            b.align_right_side()?;
            b.bind_off_at(neck_edge, neck.centre / 2)?;
            let used = if neck.centre / 2 > 0 { 2 } else { 0 };
            let end = b.stitches().saturating_sub(neck.per_side);
            let step = edge_decrease(neck_edge, b.fill(Side::Right));
            b.shape(end, neck.rows.saturating_sub(used), &step, bias)?;
            b.bind_off_all("")?;
        }
    }
    Ok(b.finish())
}

/// Divide a pullover front for the neck and work each side to the
/// shoulder. The first side's stitches stay on the needle; the others wait
/// on hold until the first shoulder is bound off.
fn split_front(
    b: &mut PieceBuilder,
    neck: NeckShape,
    bias: crate::shaping::ShapingBias,
) -> Result<(), PatternError> {
    b.align_right_side()?;
    let side = b.stitches().saturating_sub(neck.centre) / 2;
    let shoulder = side.saturating_sub(neck.per_side);
    let fill = b.fill(Side::Right);

    let mut elements = vec![format!("K{side}"), format!("Place {side} sts on hold")];
    if neck.centre > 0 {
        elements.push(format!("BO {} sts", neck.centre));
    }
    elements.push(format!("{fill} to end"));
    let removed = i64::from(b.stitches()) - i64::from(side);
    b.row(Step::new(elements.join(", "), -removed))?;

    b.shape(
        shoulder,
        neck.rows.saturating_sub(1),
        &edge_decrease(Edge::Start, fill),
        bias,
    )?;
    b.bind_off_all("")?;

    b.set_side(Side::Wrong);
    b.row(Step::new(
        format!(
            "Return {side} held sts to needle, Rejoin yarn at neck edge, {} to end",
            b.fill(Side::Wrong)
        ),
        i64::from(side),
    ))?;
    b.shape(
        shoulder,
        neck.rows.saturating_sub(2),
        &edge_decrease(Edge::End, fill),
        bias,
    )?;
    b.bind_off_all("")
}

fn rows_since(b: &PieceBuilder, before: usize) -> u32 {
    u32::try_from(b.len().saturating_sub(before)).unwrap_or(u32::MAX)
}

/// Start a flat sleeve: cuff ribbing then paired shaping up to `top`
/// stitches, over the sleeve length below the underarm.
///
/// Short sleeves widen the cuff when the sleeve is too short to increase
/// all the way to `top`.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn sleeve_base(
    plan: &Plan<'_>,
    id: &str,
    name: &str,
    top: u32,
) -> Result<PieceBuilder, PatternError> {
    let rows = plan.sleeve_rows().saturating_sub(plan.cuff_rows());
    let pairs = rows.saturating_sub(1) / 2;
    let cuff = plan.cuff_stitches().max(top.saturating_sub(2 * pairs));

    let mut b = PieceBuilder::new(id, name, Work::Flat, plan.fabric);
    b.cast_on(cuff)?;
    b.rib(plan.cuff_rows())?;
    let step = if top > b.stitches() {
        paired_increase(b.fill(Side::Right))
    } else {
        paired_decrease(b.fill(Side::Right))
    };
    b.shape(top, rows, &step, plan.config.shaping_bias)?;
    Ok(b)
}

/// Left and right copies of a sleeve built by `build`.
///
/// # Errors
///
/// Propagates errors from `build`.
pub fn sleeve_pair(
    build: impl Fn(&str, &str) -> Result<Piece, PatternError>,
) -> Result<Vec<Piece>, PatternError> {
    Ok(vec![
        build("left-sleeve", "Left sleeve")?,
        build("right-sleeve", "Right sleeve")?,
    ])
}

/// Back and front panels (or back and two cardigan fronts).
///
/// # Errors
///
/// Propagates panel errors.
pub fn body_panels(
    plan: &Plan<'_>,
    armhole: &Armhole,
    neck: Option<NeckShape>,
) -> Result<Vec<Piece>, PatternError> {
    let mut pieces = vec![body_panel(plan, "back", "Back", PanelKind::Full, armhole, None)?];
    if plan.is_cardigan() {
        pieces.push(body_panel(
            plan,
            "left-front",
            "Left front",
            PanelKind::Half {
                side_edge: Edge::Start,
            },
            armhole,
            neck,
        )?);
        pieces.push(body_panel(
            plan,
            "right-front",
            "Right front",
            PanelKind::Half {
                side_edge: Edge::End,
            },
            armhole,
            neck,
        )?);
    } else {
        pieces.push(body_panel(plan, "front", "Front", PanelKind::Full, armhole, neck)?);
    }
    Ok(pieces)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::construction::test_plan;
    use crate::parse::parse;
    use crate::types::{GarmentType, Neckline};

    #[test]
    fn medium_panel_dims() {
        test_plan(GarmentType::Pullover, Neckline::Crew, |plan| {
            let dims = PanelDims::for_plan(plan);
            assert_eq!(dims.hip % 2, 0);
            assert_eq!(dims.chest % 2, 0);
            assert_eq!(dims.shoulder % 2, 0);
            assert!(dims.shoulder <= dims.chest);
            assert_eq!(
                dims.lower_rows + dims.armhole_rows + plan.hem_rows(),
                plan.targets.body_rows
            );
        });
    }

    #[test]
    fn crew_neck_fits_the_rows() {
        test_plan(GarmentType::Pullover, Neckline::Crew, |plan| {
            let neck = NeckShape::for_plan(plan, 88, 50);
            assert_eq!(neck.centre % 2, 0);
            assert!(neck.per_side <= (neck.rows - 2) / 2);
            assert_eq!(neck.width() % 2, 0);
        });
    }

    #[test]
    fn boat_neck_is_bound_off_straight() {
        test_plan(GarmentType::Pullover, Neckline::Boat, |plan| {
            let neck = NeckShape::for_plan(plan, 88, 50);
            assert_eq!(neck.per_side, 0);
            assert!(neck.centre > 0);
        });
    }

    #[test]
    fn v_neck_uses_every_row_available() {
        test_plan(GarmentType::Pullover, Neckline::VNeck, |plan| {
            let neck = NeckShape::for_plan(plan, 88, 44);
            assert_eq!(neck.rows, 44);
            assert_eq!(neck.centre, 0);
        });
    }

    #[test]
    fn front_with_neck_parses_and_binds_off() {
        test_plan(GarmentType::Pullover, Neckline::Crew, |plan| {
            let dims = PanelDims::for_plan(plan);
            let chunks = crate::shaping::bind_off_curve((dims.chest - dims.shoulder) / 2);
            let rows = dims.armhole_rows - 2 * u32::try_from(chunks.len()).unwrap();
            let neck = NeckShape::for_plan(plan, dims.shoulder, rows);
            let front = body_panel(
                plan,
                "front",
                "Front",
                PanelKind::Full,
                &Armhole::Curve(chunks),
                Some(neck),
            )
            .unwrap();
            let parsed = parse(&front).unwrap();
            assert_eq!(parsed.final_stitch_count(), 0);
            assert!(front.rows.iter().any(|r| r.text.contains("held sts")));
        });
    }

    #[test]
    fn half_front_shapes_one_edge() {
        test_plan(GarmentType::Cardigan, Neckline::VNeck, |plan| {
            let dims = PanelDims::for_plan(plan);
            let chunks = crate::shaping::bind_off_curve((dims.chest - dims.shoulder) / 2);
            let neck = NeckShape::for_plan(plan, dims.shoulder, 20);
            let front = body_panel(
                plan,
                "left-front",
                "Left front",
                PanelKind::Half {
                    side_edge: Edge::Start,
                },
                &Armhole::Curve(chunks),
                Some(neck),
            )
            .unwrap();
            assert_eq!(front.rows[0].stitch_count, dims.hip / 2);
            assert!(
                !front
                    .rows
                    .iter()
                    .any(|r| r.text.contains("SSK, K to last 3 sts"))
            );
            assert_eq!(parse(&front).unwrap().final_stitch_count(), 0);
        });
    }
}
