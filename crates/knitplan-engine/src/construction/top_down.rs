//! Seamless top-down raglan pullover.
//!
//! The yoke is cast on at the neck and worked in the round with four
//! raglan markers. Each raglan round increases on both sides of every
//! marker (8 stitches); once the sleeves are wide enough, body rounds
//! increase the back and front only (4 stitches). At the underarm the
//! sleeve stitches go on hold, the body continues to the hem, and each
//! sleeve is picked up from its held stitches and worked down to the cuff.
//!
//! ```text
//!   raglan-4      raglan-1      raglan-2      raglan-3
//!      │    back     │  sleeve   │   front     │  sleeve  │
//!      └─────────────┴───────────┴─────────────┴──────────┘
//!      round start                                  round end
//! ```

use crate::types::{PatternError, Piece, Work, round_count};

use super::finishing;
use super::panels::PanelDims;
use super::piece::{PieceBuilder, Side, Step, paired_decrease, paired_increase};
use super::{Plan, even};

/// Neck circumference relative to the back neck width.
const NECK_AROUND: f64 = 2.5;

/// Raglan markers in working order after the round start.
const RAGLANS: [&str; 3] = ["raglan-1", "raglan-2", "raglan-3"];
/// Marker at the start of the round.
const ROUND_START: &str = "raglan-4";
/// Marker at the centre of the first underarm.
const SIDE: &str = "side";

/// Stitch counts of the yoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yoke {
    /// Stitches cast on at the neck.
    pub cast_on: u32,
    /// Back (and front) stitches after the cast-on.
    pub back: u32,
    /// Stitches of each sleeve after the cast-on.
    pub sleeve: u32,
    /// Raglan rounds (+8 each).
    pub raglan_rounds: u32,
    /// Body-only increase rounds (+4 each).
    pub body_rounds: u32,
    /// Stitches cast on at each underarm.
    pub underarm: u32,
    /// Rounds available for the increases.
    pub rounds: u32,
}

impl Yoke {
    /// Yoke for the plan.
    ///
    /// Raglan rounds stop when the sleeve plus the underarm reaches the
    /// upper arm; body rounds continue until back plus underarm reaches
    /// half the chest. Both are capped by the rounds in the yoke depth.
    #[must_use]
    pub fn for_plan(plan: &Plan<'_>) -> Self {
        let dims = PanelDims::for_plan(plan);
        let underarm = plan.underarm_stitches();
        let cast_on =
            even(round_count(f64::from(plan.targets.neck_stitches) * NECK_AROUND)).max(24);
        let sleeve = even(cast_on / 6).max(2);
        let back = (cast_on - 2 * sleeve) / 2;
        let rounds = dims.armhole_rows.saturating_sub(1);

        let raglan_rounds = (plan.bicep_stitches().saturating_sub(underarm + sleeve) / 2).min(rounds);
        let body_rounds = (dims.chest.saturating_sub(underarm + back) / 2)
            .saturating_sub(raglan_rounds)
            .min(rounds - raglan_rounds);
        Self {
            cast_on,
            back,
            sleeve,
            raglan_rounds,
            body_rounds,
            underarm,
            rounds,
        }
    }

    /// Sleeve stitches placed on hold at the division.
    #[must_use]
    pub const fn held(&self) -> u32 {
        self.sleeve + 2 * self.raglan_rounds
    }

    /// Back (or front) stitches at the division.
    #[must_use]
    pub const fn back_at_division(&self) -> u32 {
        self.back + 2 * (self.raglan_rounds + self.body_rounds)
    }

    /// Stitches on the yoke just before the division.
    #[must_use]
    pub const fn before_division(&self) -> u32 {
        self.cast_on + 8 * self.raglan_rounds + 4 * self.body_rounds
    }
}

/// Yoke and body, both sleeves (or armhole bands), and the neckband.
///
/// # Errors
///
/// Propagates shaping and builder errors.
pub fn pieces(plan: &Plan<'_>) -> Result<Vec<Piece>, PatternError> {
    let yoke = Yoke::for_plan(plan);
    let mut pieces = vec![yoke_and_body(plan, &yoke)?];
    let parts = if plan.is_sleeveless() {
        [
            ("left-armhole-band", "Left armhole band"),
            ("right-armhole-band", "Right armhole band"),
        ]
    } else {
        [("left-sleeve", "Left sleeve"), ("right-sleeve", "Right sleeve")]
    };
    for (id, name) in parts {
        pieces.push(from_held(plan, &yoke, id, name)?);
    }
    pieces.push(finishing::neckband(plan, yoke.cast_on)?);
    Ok(pieces)
}

fn yoke_and_body(plan: &Plan<'_>, yoke: &Yoke) -> Result<Piece, PatternError> {
    let dims = PanelDims::for_plan(plan);
    let bias = plan.config.shaping_bias;
    let mut b = PieceBuilder::new("yoke-and-body", "Yoke and body", Work::Round, plan.fabric);
    let fill = b.fill(Side::Right);

    b.cast_on(yoke.cast_on)?;
    b.row(Step::plain(crate::vocabulary::labeled(
        "Join in the round",
        &format!(
            "PM {ROUND_START}, K{back}, PM {}, K{sleeve}, PM {}, K{back}, PM {}, K to end",
            RAGLANS[0],
            RAGLANS[1],
            RAGLANS[2],
            back = yoke.back,
            sleeve = yoke.sleeve,
        ),
    )))?;

    let raglan_span = yoke
        .raglan_rounds
        .max(yoke.rounds.saturating_sub(2 * yoke.body_rounds));
    let after_raglan = yoke.cast_on + 8 * yoke.raglan_rounds;
    b.shape(after_raglan, raglan_span, &raglan_increase(fill), bias)?;
    b.shape(
        yoke.before_division(),
        yoke.rounds - raglan_span,
        &body_increase(fill),
        bias,
    )?;

    b.row(division(yoke, fill))?;

    let start = b.stitches();
    let hip = 2 * dims.hip;
    let events = round_count(f64::from(hip.abs_diff(start)) / 4.0);
    let (end, step) = if hip >= start {
        (start + 4 * events, side_increase(fill))
    } else {
        (start.saturating_sub(4 * events), side_decrease(fill))
    };
    b.shape(end, dims.lower_rows.saturating_sub(1), &step, bias)?;

    b.rib(plan.hem_rows())?;
    b.bind_off_all("in rib")?;
    Ok(b.finish())
}

/// Increase before and after every raglan marker.
fn raglan_increase(fill: &str) -> Step {
    let mut elements = vec![format!("SM {ROUND_START}")];
    for marker in RAGLANS {
        elements.push(format!(
            "K1, M1L, {fill} to 1 st before {marker}, M1R, K1, SM {marker}"
        ));
    }
    elements.push(format!("K1, M1L, {fill} to last st, M1R, K1"));
    Step::new(elements.join(", "), 8)
}

/// Increase at the raglans of the back and front only.
fn body_increase(fill: &str) -> Step {
    let [first, second, third] = RAGLANS;
    Step::new(
        format!(
            "SM {ROUND_START}, K1, M1L, {fill} to 1 st before {first}, M1R, K1, SM {first}, \
             {fill} to {second}, SM {second}, \
             K1, M1L, {fill} to 1 st before {third}, M1R, K1, SM {third}, {fill} to end"
        ),
        4,
    )
}

/// Put the sleeves on hold and cast on the underarms.
fn division(yoke: &Yoke, fill: &str) -> Step {
    let [first, second, third] = RAGLANS;
    let held = yoke.held();
    let half = yoke.underarm / 2;
    Step::new(
        format!(
            "SM {ROUND_START}, {fill} to {first}, SM {first}, Place {held} sts on hold, \
             CO {half} sts, PM {SIDE}, CO {} sts, SM {second}, {fill} to {third}, SM {third}, \
             Place {held} sts on hold, CO {} sts",
            yoke.underarm - half,
            yoke.underarm,
        ),
        2 * i64::from(yoke.underarm) - 2 * i64::from(held),
    )
}

fn side_increase(fill: &str) -> Step {
    Step::new(
        format!(
            "K1, M1L, {fill} to 1 st before {SIDE}, M1R, K1, SM {SIDE}, \
             K1, M1L, {fill} to last st, M1R, K1"
        ),
        4,
    )
}

fn side_decrease(fill: &str) -> Step {
    Step::new(
        format!(
            "K1, SSK, {fill} to 3 sts before {SIDE}, K2tog, K1, SM {SIDE}, \
             K1, SSK, {fill} to last 3 sts, K2tog, K1"
        ),
        -4,
    )
}

/// A sleeve or armhole band worked down from the held stitches.
fn from_held(plan: &Plan<'_>, yoke: &Yoke, id: &str, name: &str) -> Result<Piece, PatternError> {
    let mut b = PieceBuilder::new(id, name, Work::Round, plan.fabric);
    let top = yoke.held() + yoke.underarm;
    b.row(Step::new(
        format!(
            "Return {} held sts to needles, PU {} sts from underarm cast-on",
            yoke.held(),
            yoke.underarm
        ),
        i64::from(top),
    ))?;

    if plan.is_sleeveless() {
        b.rib(plan.band_rows())?;
    } else {
        let rows = plan.sleeve_rows().saturating_sub(plan.cuff_rows() + 1);
        let cuff = plan.cuff_stitches().max(top.saturating_sub(2 * rows));
        let fill = b.fill(Side::Right);
        let step = if cuff > top {
            paired_increase(fill)
        } else {
            paired_decrease(fill)
        };
        b.shape(cuff, rows, &step, plan.config.shaping_bias)?;
        b.rib(plan.cuff_rows())?;
    }
    b.bind_off_all("in rib")?;
    Ok(b.finish())
}
