//! Scoring rules for guess patterns.
//!
//! An [`Objective`] maps a set of guessed cells and a layout to a small
//! non-negative score. The same function serves Monte Carlo trials (sampled
//! layouts, scores summed as integer fitness) and exact evaluation
//! (enumerated layouts, scores weighted by probability).

use sploosh_engine::{Bitboard, Layout};

/// What a guess pattern is optimised for.
///
/// Parsed case-insensitively from the variant name, e.g. `atleast1` or
/// `FindTarget3`.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::FromStr,
)]
pub enum Objective {
    /// Hit at least one target.
    #[default]
    AtLeast1,
    /// Hit at least two distinct targets.
    AtLeast2,
    /// Hit at least three distinct targets (all of them in the standard game).
    AtLeast3,
    /// Hit the length-2 target.
    FindTarget2,
    /// Hit the length-3 target.
    FindTarget3,
    /// Hit the length-4 target.
    FindTarget4,
    /// Number of guessed cells covered by any target.
    MaxHits,
    /// Hit nothing at all.
    FindNone,
    /// Hit exactly one distinct target.
    Exactly1,
    /// Hit exactly two distinct targets.
    Exactly2,
}

impl Objective {
    pub const ALL: [Self; 10] = [
        Self::AtLeast1,
        Self::AtLeast2,
        Self::AtLeast3,
        Self::FindTarget2,
        Self::FindTarget3,
        Self::FindTarget4,
        Self::MaxHits,
        Self::FindNone,
        Self::Exactly1,
        Self::Exactly2,
    ];

    /// Scores the guessed cells `mask` against `layout`.
    ///
    /// Every objective except [`Objective::MaxHits`] is a 0/1 indicator.
    #[must_use]
    pub fn score(self, mask: Bitboard, layout: &Layout) -> u32 {
        let find = |length| {
            layout
                .target_with_length(length)
                .is_some_and(|target| target.intersects(mask))
        };
        let touched = || layout.targets_touched(mask);
        let hit = match self {
            Self::AtLeast1 => layout.combined().intersects(mask),
            Self::AtLeast2 => touched() >= 2,
            Self::AtLeast3 => touched() >= 3,
            Self::FindTarget2 => find(2),
            Self::FindTarget3 => find(3),
            Self::FindTarget4 => find(4),
            Self::MaxHits => return (layout.combined() & mask).count(),
            Self::FindNone => layout.combined().is_disjoint(mask),
            Self::Exactly1 => touched() == 1,
            Self::Exactly2 => touched() == 2,
        };
        u32::from(hit)
    }

    /// Largest score a single layout can produce for patterns of `size` cells.
    #[must_use]
    pub fn max_score(self, size: u32) -> u32 {
        match self {
            Self::MaxHits => size,
            _ => 1,
        }
    }
}
