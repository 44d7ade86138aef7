//! Guess patterns evaluated against layouts.
//!
//! A pattern is a fixed number of distinct guessed cells drawn from the
//! playable cells of a [`PatternShape`]. Two forms exist:
//!
//! - [`MaskPattern`] is an unordered set of cells, enough for objectives that
//!   only test intersection with targets.
//! - [`OrderedPattern`] keeps the order cells are fired in, so it can tell
//!   *when* a target sinks, not just whether it eventually does.
//!
//! # Operations
//!
//! - **Generation**: [`Pattern::random`] repeatedly selects one of the
//!   still-unselected cells uniformly, so no cell position is favoured.
//! - **Mutation**: [`MaskPattern`] swaps one selected cell for one
//!   unselected cell. [`OrderedPattern`] redraws the cell at one random
//!   index; when the redrawn cell already appears elsewhere in the sequence
//!   the two entries trade places instead.
//!
//! Both operators keep the pattern size and the distinctness of its cells,
//! and neither needs a retry loop: [`PatternShape`] validation guarantees
//! there is always a free cell to draw.

use std::{fmt, hash::Hash};

use arrayvec::ArrayVec;
use rand::Rng;
use serde::Serialize;

use crate::core::{Bitboard, CELL_COUNT, Layout, Rules, ShotOutcome, Square};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PatternError {
    #[display("pattern size must be between 1 and {max}, got {size}")]
    InvalidSize { size: u32, max: u32 },
    #[display("expected {expected} cells, got {actual}")]
    SizeMismatch { expected: u32, actual: u32 },
    #[display("cell {square} is outside the playable grid")]
    OutsideGrid { square: Square },
    #[display("cell {square} appears more than once")]
    DuplicateCell { square: Square },
}

/// Playable cells and the number of guesses a pattern holds.
///
/// Invariant: `1 <= size < cells.count()`. At least one cell is always
/// left unselected, so mutation can always swap one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternShape {
    cells: Bitboard,
    size: u32,
}

impl PatternShape {
    pub fn new(cells: Bitboard, size: u32) -> Result<Self, PatternError> {
        let max = cells.count().saturating_sub(1);
        if size == 0 || size > max {
            return Err(PatternError::InvalidSize { size, max });
        }
        Ok(Self { cells, size })
    }

    /// Shape covering every playable cell of `rules`.
    pub fn for_rules(rules: &Rules, size: u32) -> Result<Self, PatternError> {
        Self::new(rules.cells(), size)
    }

    #[must_use]
    pub fn cells(&self) -> Bitboard {
        self.cells
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    fn check_cell(&self, square: Square) -> Result<(), PatternError> {
        if self.cells.contains(square) {
            Ok(())
        } else {
            Err(PatternError::OutsideGrid { square })
        }
    }
}

/// A candidate that can be generated, mutated and scored by its cell set.
pub trait Pattern: Clone + Eq + Hash + fmt::Debug {
    /// The set of guessed cells, regardless of order.
    fn mask(&self) -> Bitboard;

    fn size(&self) -> u32 {
        self.mask().count()
    }

    /// Generates a pattern of `shape.size()` cells chosen uniformly.
    fn random<R>(shape: &PatternShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized;

    /// Applies one mutation step in place.
    fn mutate<R>(&mut self, shape: &PatternShape, rng: &mut R)
    where
        R: Rng + ?Sized;

    #[must_use]
    fn mutated<R>(&self, shape: &PatternShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut child = self.clone();
        child.mutate(shape, rng);
        child
    }
}

/// Draws `shape.size()` distinct cells, each uniform over the cells not yet
/// drawn, and hands them to `push` in draw order.
fn draw_cells<R, F>(shape: &PatternShape, rng: &mut R, mut push: F)
where
    R: Rng + ?Sized,
    F: FnMut(Square),
{
    let mut taken = Bitboard::EMPTY;
    for _ in 0..shape.size {
        let square = (shape.cells & !taken)
            .choose(rng)
            .expect("shape always leaves a free cell");
        taken = taken.with(square);
        push(square);
    }
}

/// An unordered set of guessed cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MaskPattern(Bitboard);

impl MaskPattern {
    pub fn from_mask(shape: &PatternShape, mask: Bitboard) -> Result<Self, PatternError> {
        if mask.count() != shape.size {
            return Err(PatternError::SizeMismatch {
                expected: shape.size,
                actual: mask.count(),
            });
        }
        if let Some(square) = (mask & !shape.cells).first() {
            return Err(PatternError::OutsideGrid { square });
        }
        Ok(Self(mask))
    }
}

impl Pattern for MaskPattern {
    fn mask(&self) -> Bitboard {
        self.0
    }

    fn random<R>(shape: &PatternShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut mask = Bitboard::EMPTY;
        draw_cells(shape, rng, |square| mask = mask.with(square));
        Self(mask)
    }

    fn mutate<R>(&mut self, shape: &PatternShape, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let set = self.0.choose(rng).expect("pattern is never empty");
        let unset = (shape.cells & !self.0)
            .choose(rng)
            .expect("shape always leaves a free cell");
        self.0 = self.0.without(set).with(unset);
    }
}

/// A sequence of distinct guessed cells, fired in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderedPattern {
    squares: ArrayVec<Square, { CELL_COUNT as usize }>,
}

impl OrderedPattern {
    pub fn from_squares(shape: &PatternShape, squares: &[Square]) -> Result<Self, PatternError> {
        let actual = u32::try_from(squares.len()).unwrap_or(u32::MAX);
        if actual != shape.size {
            return Err(PatternError::SizeMismatch {
                expected: shape.size,
                actual,
            });
        }
        let mut seen = Bitboard::EMPTY;
        for &square in squares {
            shape.check_cell(square)?;
            if seen.contains(square) {
                return Err(PatternError::DuplicateCell { square });
            }
            seen = seen.with(square);
        }
        Ok(Self {
            squares: squares.iter().copied().collect(),
        })
    }

    #[must_use]
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Cells fired before index `index` (exclusive).
    #[must_use]
    pub fn prefix_mask(&self, index: usize) -> Bitboard {
        self.squares.iter().take(index).copied().collect()
    }

    /// Returns `true` if `target` is entirely covered by the shots strictly
    /// before `index`.
    #[must_use]
    pub fn revealed_before(&self, target: Bitboard, index: usize) -> bool {
        target.is_subset(self.prefix_mask(index))
    }

    /// Index of the shot that completes `target`, if the pattern ever does.
    #[must_use]
    pub fn sink_index(&self, target: Bitboard) -> Option<usize> {
        let mut remaining = target;
        if remaining.is_empty() {
            return None;
        }
        for (index, &square) in self.squares.iter().enumerate() {
            remaining = remaining.without(square);
            if remaining.is_empty() {
                return Some(index);
            }
        }
        None
    }

    /// Outcome of each shot when the pattern is fired at `layout`.
    #[must_use]
    pub fn outcomes(&self, layout: &Layout) -> Vec<ShotOutcome> {
        let mut shots = Bitboard::EMPTY;
        self.squares
            .iter()
            .map(|&square| {
                shots = shots.with(square);
                layout.outcome(shots, square)
            })
            .collect()
    }
}

impl Serialize for OrderedPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(&self.squares)
    }
}

impl Pattern for OrderedPattern {
    fn mask(&self) -> Bitboard {
        self.squares.iter().copied().collect()
    }

    fn random<R>(shape: &PatternShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut squares = ArrayVec::new();
        draw_cells(shape, rng, |square| squares.push(square));
        Self { squares }
    }

    fn mutate<R>(&mut self, shape: &PatternShape, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let index = rng.random_range(0..self.squares.len());
        let square = shape.cells.choose(rng).expect("shape is never empty");
        match self.squares.iter().position(|&s| s == square) {
            Some(other) => self.squares.swap(index, other),
            None => self.squares[index] = square,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn sq(x: u8, y: u8) -> Square {
        Square::new(x, y).unwrap()
    }

    fn standard_shape(size: u32) -> PatternShape {
        PatternShape::for_rules(&Rules::standard(), size).unwrap()
    }

    #[test]
    fn test_shape_validation() {
        assert!(matches!(
            PatternShape::new(Bitboard::FULL, 0),
            Err(PatternError::InvalidSize { size: 0, max: 63 })
        ));
        assert!(matches!(
            PatternShape::new(Bitboard::FULL, 64),
            Err(PatternError::InvalidSize { size: 64, max: 63 })
        ));
        assert!(PatternShape::new(Bitboard::FULL, 63).is_ok());
        assert!(PatternShape::new(Bitboard::EMPTY, 1).is_err());
        let toy = Rules::new(2, &[2]).unwrap();
        assert!(PatternShape::for_rules(&toy, 3).is_ok());
        assert!(PatternShape::for_rules(&toy, 4).is_err());
    }

    #[test]
    fn test_random_mask_pattern() {
        let shape = standard_shape(8);
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            let pattern = MaskPattern::random(&shape, &mut rng);
            assert_eq!(pattern.size(), 8);
            assert!(pattern.mask().is_subset(shape.cells()));
        }
    }

    #[test]
    fn test_random_generation_is_unbiased() {
        // every cell of a 4x4 grid should be picked about size/16 of the time
        let shape = PatternShape::new(Bitboard::square_grid(4), 4).unwrap();
        let mut rng = Pcg32::seed_from_u64(17);
        let mut counts = [0_u32; 64];
        for _ in 0..16_000 {
            for square in MaskPattern::random(&shape, &mut rng).mask() {
                counts[usize::from(square.index())] += 1;
            }
        }
        for square in shape.cells() {
            let count = counts[usize::from(square.index())];
            assert!((3600..4400).contains(&count), "{square} picked {count} times");
        }
    }

    #[test]
    fn test_mask_mutation_preserves_popcount() {
        let shape = standard_shape(8);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pattern = MaskPattern::random(&shape, &mut rng);
        for _ in 0..1000 {
            let child = pattern.mutated(&shape, &mut rng);
            assert_eq!(child.size(), 8);
            assert_eq!((child.mask() ^ pattern.mask()).count(), 2);
            pattern = child;
        }
    }

    #[test]
    fn test_mask_mutation_at_capacity() {
        // 63 of 64 cells: exactly one free cell to swap in
        let shape = standard_shape(63);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pattern = MaskPattern::random(&shape, &mut rng);
        let free = (!pattern.mask()).first().unwrap();
        pattern.mutate(&shape, &mut rng);
        assert!(pattern.mask().contains(free));
        assert_eq!(pattern.size(), 63);
    }

    #[test]
    fn test_from_mask() {
        let shape = PatternShape::new(Bitboard::square_grid(2), 2).unwrap();
        assert!(MaskPattern::from_mask(&shape, sq(0, 0).bit() | sq(1, 1).bit()).is_ok());
        assert!(matches!(
            MaskPattern::from_mask(&shape, sq(0, 0).bit()),
            Err(PatternError::SizeMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            MaskPattern::from_mask(&shape, sq(0, 0).bit() | sq(2, 0).bit()),
            Err(PatternError::OutsideGrid { .. })
        ));
    }

    #[test]
    fn test_ordered_mutation_keeps_cells_distinct() {
        let shape = standard_shape(12);
        let mut rng = Pcg32::seed_from_u64(23);
        let mut pattern = OrderedPattern::random(&shape, &mut rng);
        for _ in 0..1000 {
            let child = pattern.mutated(&shape, &mut rng);
            assert_eq!(child.squares().len(), 12);
            assert_eq!(child.mask().count(), 12);
            // either a swap (same cell set) or one cell replaced
            let changed = (child.mask() ^ pattern.mask()).count();
            assert!(changed == 0 || changed == 2);
            let moved = child
                .squares()
                .iter()
                .zip(pattern.squares())
                .filter(|(a, b)| a != b)
                .count();
            if changed == 2 {
                assert_eq!(moved, 1);
            } else {
                assert!(moved == 0 || moved == 2);
            }
            pattern = child;
        }
    }

    #[test]
    fn test_from_squares() {
        let shape = standard_shape(3);
        let ok = OrderedPattern::from_squares(&shape, &[sq(0, 0), sq(1, 0), sq(2, 0)]);
        assert_eq!(ok.unwrap().squares()[1], sq(1, 0));
        assert!(matches!(
            OrderedPattern::from_squares(&shape, &[sq(0, 0), sq(1, 0), sq(0, 0)]),
            Err(PatternError::DuplicateCell { .. })
        ));
        assert!(matches!(
            OrderedPattern::from_squares(&shape, &[sq(0, 0)]),
            Err(PatternError::SizeMismatch { expected: 3, actual: 1 })
        ));
        let toy = PatternShape::new(Bitboard::square_grid(2), 1).unwrap();
        assert!(matches!(
            OrderedPattern::from_squares(&toy, &[sq(3, 3)]),
            Err(PatternError::OutsideGrid { .. })
        ));
    }

    #[test]
    fn test_order_sensitive_queries() {
        let target2 = sq(0, 0).bit() | sq(1, 0).bit();
        let target3 = sq(5, 5).bit() | sq(5, 6).bit() | sq(5, 7).bit();
        let layout = Layout::new(&[target2, target3]).unwrap();

        let shape = standard_shape(4);
        let pattern =
            OrderedPattern::from_squares(&shape, &[sq(1, 0), sq(5, 6), sq(0, 0), sq(3, 3)]).unwrap();

        assert_eq!(pattern.sink_index(target2), Some(2));
        assert_eq!(pattern.sink_index(target3), None);
        assert!(!pattern.revealed_before(target2, 2));
        assert!(pattern.revealed_before(target2, 3));
        assert_eq!(
            pattern.outcomes(&layout),
            [
                ShotOutcome::Hit,
                ShotOutcome::Hit,
                ShotOutcome::Sink,
                ShotOutcome::Miss
            ]
        );

        // same cells in another order sink the first target one shot earlier
        let reordered =
            OrderedPattern::from_squares(&shape, &[sq(1, 0), sq(0, 0), sq(5, 6), sq(3, 3)]).unwrap();
        assert_eq!(reordered.mask(), pattern.mask());
        assert_eq!(reordered.sink_index(target2), Some(1));
    }

    #[test]
    fn test_ordered_serialization() {
        let shape = standard_shape(2);
        let pattern = OrderedPattern::from_squares(&shape, &[sq(2, 1), sq(0, 7)]).unwrap();
        assert_eq!(
            serde_json::to_string(&pattern).unwrap(),
            r#"[{"x":2,"y":1},{"x":0,"y":7}]"#
        );
    }
}
