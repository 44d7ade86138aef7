use arrayvec::ArrayVec;
use serde::Serialize;

use super::{
    bit_board::{Bitboard, Square},
    rules::MAX_TARGETS,
};

/// Result of firing at a single cell.
///
/// The derived order (`Miss < Hit < Sink`) is the order games are sorted in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum ShotOutcome {
    Miss,
    Hit,
    /// A hit that completes the last uncovered cell of a target.
    Sink,
}

impl ShotOutcome {
    #[must_use]
    pub fn is_any_hit(self) -> bool {
        !self.is_miss()
    }
}

/// One complete placement of all targets.
///
/// Targets are stored in placement order and are pairwise disjoint;
/// `combined` is their union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    combined: Bitboard,
    targets: ArrayVec<Bitboard, MAX_TARGETS>,
}

impl Layout {
    pub(crate) fn from_targets(targets: ArrayVec<Bitboard, MAX_TARGETS>) -> Self {
        let combined = targets.iter().fold(Bitboard::EMPTY, |acc, &t| acc | t);
        debug_assert_eq!(
            combined.count(),
            targets.iter().map(|t| t.count()).sum::<u32>(),
            "targets must be pairwise disjoint"
        );
        Self { combined, targets }
    }

    /// Builds a layout from explicit target masks.
    ///
    /// Returns `None` if there are no targets, more than [`MAX_TARGETS`],
    /// an empty target, or two targets that overlap.
    #[must_use]
    pub fn new(targets: &[Bitboard]) -> Option<Self> {
        if targets.is_empty() || targets.len() > MAX_TARGETS {
            return None;
        }
        let mut combined = Bitboard::EMPTY;
        for &target in targets {
            if target.is_empty() || target.intersects(combined) {
                return None;
            }
            combined |= target;
        }
        Some(Self {
            combined,
            targets: targets.iter().copied().collect(),
        })
    }

    #[must_use]
    pub fn combined(&self) -> Bitboard {
        self.combined
    }

    #[must_use]
    pub fn targets(&self) -> &[Bitboard] {
        &self.targets
    }

    /// Returns the target with exactly `length` cells, if any.
    #[must_use]
    pub fn target_with_length(&self, length: u8) -> Option<Bitboard> {
        self.targets
            .iter()
            .copied()
            .find(|t| t.count() == u32::from(length))
    }

    #[must_use]
    pub fn target_containing(&self, square: Square) -> Option<Bitboard> {
        self.targets.iter().copied().find(|t| t.contains(square))
    }

    /// Number of distinct targets that share at least one cell with `mask`.
    #[must_use]
    pub fn targets_touched(&self, mask: Bitboard) -> usize {
        self.targets.iter().filter(|t| t.intersects(mask)).count()
    }

    /// Number of targets entirely covered by `shots`.
    #[must_use]
    pub fn targets_sunk(&self, shots: Bitboard) -> usize {
        self.targets.iter().filter(|t| t.is_subset(shots)).count()
    }

    /// Classifies a shot at `square`, given every shot fired so far
    /// (including this one).
    #[must_use]
    pub fn outcome(&self, shots: Bitboard, square: Square) -> ShotOutcome {
        debug_assert!(shots.contains(square));
        match self.target_containing(square) {
            None => ShotOutcome::Miss,
            Some(target) if target.is_subset(shots) => ShotOutcome::Sink,
            Some(_) => ShotOutcome::Hit,
        }
    }
}

/// A layout with its exact placement probability.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedLayout {
    layout: Layout,
    probability: f64,
}

impl WeightedLayout {
    pub(crate) fn new(layout: Layout, probability: f64) -> Self {
        Self {
            layout,
            probability,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}
