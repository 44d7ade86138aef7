use serde::Serialize;
use sploosh_engine::{Bitboard, Layout, ShotOutcome, Square};

use crate::strategy::SolverError;

/// What the guesser knows after some real shots.
///
/// Invariant: `revealed_target_cells` is a subset of `shot_locations`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialSolution {
    shot_locations: Bitboard,
    revealed_target_cells: Bitboard,
    targets_found: u32,
}

impl PartialSolution {
    /// The state before any shot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        shot_locations: Bitboard,
        revealed_target_cells: Bitboard,
        targets_found: u32,
    ) -> Result<Self, SolverError> {
        if let Some(square) = (revealed_target_cells & !shot_locations).first() {
            return Err(SolverError::UnshotHit { square });
        }
        Ok(Self {
            shot_locations,
            revealed_target_cells,
            targets_found,
        })
    }

    #[must_use]
    pub fn shot_locations(&self) -> Bitboard {
        self.shot_locations
    }

    #[must_use]
    pub fn revealed_target_cells(&self) -> Bitboard {
        self.revealed_target_cells
    }

    #[must_use]
    pub fn targets_found(&self) -> u32 {
        self.targets_found
    }

    /// Records the outcome of firing at `square`.
    pub fn record_shot(&mut self, square: Square, outcome: ShotOutcome) {
        self.shot_locations = self.shot_locations.with(square);
        if outcome.is_any_hit() {
            self.revealed_target_cells = self.revealed_target_cells.with(square);
        }
        if outcome.is_sink() {
            self.targets_found += 1;
        }
    }

    /// Returns `true` if `layout` explains every observation.
    ///
    /// Every shot cell covered by a target must have been revealed as a hit,
    /// every revealed cell must belong to a target, and the number of
    /// targets fully covered by revealed cells must equal `targets_found`.
    #[must_use]
    pub fn is_consistent(&self, layout: &Layout) -> bool {
        let combined = layout.combined();
        if ((!self.shot_locations & combined) | self.revealed_target_cells) != combined {
            return false;
        }
        let found = layout.targets_sunk(self.revealed_target_cells);
        u32::try_from(found).is_ok_and(|found| found == self.targets_found)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use sploosh_engine::{LayoutSet, Rules};

    use super::*;

    static STANDARD: LazyLock<LayoutSet> =
        LazyLock::new(|| LayoutSet::enumerate(&Rules::standard()));

    fn sq(x: u8, y: u8) -> Square {
        Square::new(x, y).unwrap()
    }

    fn sample_layout() -> Layout {
        Layout::new(&[
            Bitboard::from_ascii("##......"),
            Bitboard::from_ascii("........\n........\n..###..."),
            Bitboard::from_ascii("........\n........\n........\n........\n....####"),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_partial_accepts_everything() {
        let partial = PartialSolution::new();
        assert!(STANDARD.iter().all(|w| partial.is_consistent(w.layout())));
    }

    #[test]
    fn test_record_shot() {
        let layout = sample_layout();
        let mut partial = PartialSolution::new();
        let mut shots = Bitboard::EMPTY;
        for square in [sq(5, 5), sq(0, 0), sq(1, 0), sq(2, 2)] {
            shots = shots.with(square);
            partial.record_shot(square, layout.outcome(shots, square));
            assert!(partial.is_consistent(&layout));
        }
        assert_eq!(partial.shot_locations().count(), 4);
        assert_eq!(partial.revealed_target_cells().count(), 3);
        assert_eq!(partial.targets_found(), 1);
    }

    #[test]
    fn test_inconsistent_observations() {
        let layout = sample_layout();

        // a miss recorded on a target cell
        let mut partial = PartialSolution::new();
        partial.record_shot(sq(0, 0), ShotOutcome::Miss);
        assert!(!partial.is_consistent(&layout));

        // a hit recorded on an empty cell
        let mut partial = PartialSolution::new();
        partial.record_shot(sq(7, 7), ShotOutcome::Hit);
        assert!(!partial.is_consistent(&layout));

        // a fully covered target that was never reported sunk
        let partial =
            PartialSolution::from_parts(sq(0, 0).bit() | sq(1, 0).bit(), sq(0, 0).bit() | sq(1, 0).bit(), 0)
                .unwrap();
        assert!(!partial.is_consistent(&layout));
    }

    #[test]
    fn test_filter_keeps_true_layout() {
        let layout = sample_layout();
        let mut partial = PartialSolution::new();
        let mut shots = Bitboard::EMPTY;
        for square in [sq(3, 3), sq(2, 2), sq(3, 2), sq(4, 2), sq(6, 4)] {
            shots = shots.with(square);
            partial.record_shot(square, layout.outcome(shots, square));
        }
        let consistent = STANDARD
            .iter()
            .filter(|w| partial.is_consistent(w.layout()))
            .collect::<Vec<_>>();
        assert!(consistent.iter().any(|w| w.layout() == &layout));
        assert!(consistent.len() < STANDARD.len());
        for w in consistent {
            assert!(w.layout().targets_sunk(partial.revealed_target_cells()) == 1);
            assert!(!w.layout().combined().contains(sq(3, 3)));
        }
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(matches!(
            PartialSolution::from_parts(Bitboard::EMPTY, sq(1, 1).bit(), 0),
            Err(SolverError::UnshotHit { .. })
        ));
    }
}
