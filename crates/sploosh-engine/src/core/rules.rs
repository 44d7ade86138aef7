use arrayvec::ArrayVec;

use super::bit_board::{Bitboard, GRID_STRIDE, Orientation};

/// Maximum number of targets a layout can hold.
pub const MAX_TARGETS: usize = 3;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RulesError {
    #[display("grid width must be between 1 and 8, got {width}")]
    InvalidWidth { width: u8 },
    #[display("between 1 and 3 targets are supported, got {count}")]
    InvalidTargetCount { count: usize },
    #[display("target length {length} does not fit a {width}x{width} grid (lengths start at 2)")]
    InvalidTargetLength { length: u8, width: u8 },
    #[display("targets of lengths {lengths:?} cannot all fit a {width}x{width} grid")]
    Overcrowded { lengths: Vec<u8>, width: u8 },
}

/// Grid size and target lengths of a game.
///
/// Targets are placed in the order given by [`Self::target_lengths`]: the
/// first one anywhere, each later one avoiding all earlier ones. The
/// standard game is an 8x8 grid with targets of length 2, 3 and 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    width: u8,
    target_lengths: ArrayVec<u8, MAX_TARGETS>,
}

impl Default for Rules {
    fn default() -> Self {
        Self::standard()
    }
}

impl Rules {
    /// The 8x8 game with targets of length 2, 3 and 4.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            width: GRID_STRIDE,
            target_lengths: ArrayVec::from([2, 3, 4]),
        }
    }

    pub fn new(width: u8, target_lengths: &[u8]) -> Result<Self, RulesError> {
        if !(1..=GRID_STRIDE).contains(&width) {
            return Err(RulesError::InvalidWidth { width });
        }
        if target_lengths.is_empty() || target_lengths.len() > MAX_TARGETS {
            return Err(RulesError::InvalidTargetCount {
                count: target_lengths.len(),
            });
        }
        if let Some(&length) = target_lengths
            .iter()
            .find(|&&length| !(2..=width).contains(&length))
        {
            return Err(RulesError::InvalidTargetLength { length, width });
        }
        let rules = Self {
            width,
            target_lengths: target_lengths.iter().copied().collect(),
        };
        if !rules.admits_layout() {
            return Err(RulesError::Overcrowded {
                lengths: target_lengths.to_vec(),
                width,
            });
        }
        Ok(rules)
    }

    /// Returns `true` if at least one complete layout exists.
    fn admits_layout(&self) -> bool {
        fn place(rules: &Rules, lengths: &[u8], occupied: Bitboard) -> bool {
            let Some((&length, rest)) = lengths.split_first() else {
                return true;
            };
            rules
                .placements(length)
                .into_iter()
                .filter(|run| run.is_disjoint(occupied))
                .any(|run| place(rules, rest, occupied | run))
        }
        place(self, &self.target_lengths, Bitboard::EMPTY)
    }

    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn target_lengths(&self) -> &[u8] {
        &self.target_lengths
    }

    /// Returns the mask of all playable cells.
    #[must_use]
    pub fn cells(&self) -> Bitboard {
        Bitboard::square_grid(self.width)
    }

    /// Total number of cells covered by a complete layout.
    #[must_use]
    pub fn total_target_cells(&self) -> u32 {
        self.target_lengths.iter().map(|&len| u32::from(len)).sum()
    }

    /// Returns every run of `length` cells on the grid.
    ///
    /// For each `(x, y)` with `x` in `0..=width-length` and `y` in
    /// `0..width`, the horizontal run starting at `(x, y)` is followed by the
    /// vertical run starting at `(y, x)`. This order fixes layout indices.
    #[must_use]
    pub fn placements(&self, length: u8) -> Vec<Bitboard> {
        if length == 0 || length > self.width {
            return vec![];
        }
        let starts = usize::from(self.width - length + 1);
        let mut runs = Vec::with_capacity(2 * starts * usize::from(self.width));
        for x in 0..=(self.width - length) {
            for y in 0..self.width {
                runs.push(Bitboard::run_unchecked(x, y, length, Orientation::Horizontal));
                runs.push(Bitboard::run_unchecked(y, x, length, Orientation::Vertical));
            }
        }
        runs
    }
}
