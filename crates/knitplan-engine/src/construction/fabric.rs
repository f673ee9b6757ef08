//! Body fabrics the generator can write instructions for.

use crate::types::{PatternError, StitchPattern, Work};

use super::piece::Side;

/// A supported body fabric.
///
/// Rows of plain fabric are written relative to the row ends
/// (`K to end`, `Work in seed st to last 3 sts`), so the same shaping
/// rows work for every fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fabric {
    /// Knit on the right side, purl on the wrong side.
    Stockinette,
    /// Knit every row (alternate knit and purl rounds).
    Garter,
    /// Seed stitch.
    Seed,
    /// 1x1 ribbing.
    Ribbing,
}

impl Fabric {
    /// Resolve the analysis stitch pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::UnsupportedConstruction`] for cables, lace,
    /// colorwork, and unrecognized patterns.
    pub fn from_stitch_pattern(pattern: StitchPattern) -> Result<Self, PatternError> {
        match pattern {
            StitchPattern::Stockinette => Ok(Self::Stockinette),
            StitchPattern::Garter => Ok(Self::Garter),
            StitchPattern::Seed => Ok(Self::Seed),
            StitchPattern::Ribbing => Ok(Self::Ribbing),
            StitchPattern::Cable | StitchPattern::Lace | StitchPattern::Colorwork => Err(
                PatternError::UnsupportedConstruction(format!(
                    "{} stitch pattern is not supported",
                    pattern_name(pattern)
                )),
            ),
            StitchPattern::Other => Err(PatternError::UnsupportedConstruction(
                "unrecognized stitch pattern".to_string(),
            )),
        }
    }

    /// How plain stitches of this fabric are worked on a given side.
    #[must_use]
    pub const fn fill(self, work: Work, side: Side) -> &'static str {
        match (self, work, side) {
            (Self::Stockinette, Work::Flat, Side::Wrong) => "P",
            (Self::Stockinette, _, _) | (Self::Garter, Work::Flat, _) => "K",
            (Self::Garter, Work::Round, _) => "Work in garter st",
            (Self::Seed, _, _) => "Work in seed st",
            (Self::Ribbing, _, _) => "Rib",
        }
    }

    /// Lowercase name, for titles.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stockinette => "stockinette",
            Self::Garter => "garter stitch",
            Self::Seed => "seed stitch",
            Self::Ribbing => "ribbing",
        }
    }
}

const fn pattern_name(pattern: StitchPattern) -> &'static str {
    match pattern {
        StitchPattern::Cable => "cable",
        StitchPattern::Lace => "lace",
        StitchPattern::Colorwork => "colorwork",
        _ => "this",
    }
}
