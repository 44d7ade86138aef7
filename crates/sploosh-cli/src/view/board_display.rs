//! Plain-text grid rendering for stderr reports.

use std::fmt;

use sploosh_engine::{
    Bitboard, CELL_COUNT, MaskPattern, OrderedPattern, Pattern as _, ShotOutcome, Square,
};

#[derive(Debug, Clone, PartialEq)]
enum CellMark {
    Empty,
    Guess,
    Order(usize),
    Shot(ShotOutcome),
    Percent(f64),
}

impl fmt::Display for CellMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellMark::Empty => f.write_str(""),
            CellMark::Guess => f.write_str("X"),
            CellMark::Order(order) => write!(f, "{order}"),
            CellMark::Shot(ShotOutcome::Miss) => f.write_str("."),
            CellMark::Shot(ShotOutcome::Hit) => f.write_str("x"),
            CellMark::Shot(ShotOutcome::Sink) => f.write_str("#"),
            CellMark::Percent(percent) => write!(f, "{percent:.1}"),
        }
    }
}

/// A `width`x`width` grid with one mark per cell, drawn with `+---+` borders.
#[derive(Debug, Clone)]
pub(crate) struct BoardDisplay {
    width: u8,
    marks: Vec<CellMark>,
}

impl BoardDisplay {
    fn new(width: u8) -> Self {
        Self {
            width,
            marks: vec![CellMark::Empty; usize::from(CELL_COUNT)],
        }
    }

    fn mark(&mut self, square: Square, mark: CellMark) {
        self.marks[usize::from(square.index())] = mark;
    }

    pub(crate) fn mask(width: u8, mask: Bitboard) -> Self {
        let mut board = Self::new(width);
        for square in mask {
            board.mark(square, CellMark::Guess);
        }
        board
    }

    /// Numbers cells by firing order, starting at 1.
    pub(crate) fn ordered(width: u8, pattern: &OrderedPattern) -> Self {
        let mut board = Self::new(width);
        for (i, &square) in pattern.squares().iter().enumerate() {
            board.mark(square, CellMark::Order(i + 1));
        }
        board
    }

    pub(crate) fn shots<I>(width: u8, shots: I) -> Self
    where
        I: IntoIterator<Item = (Square, ShotOutcome)>,
    {
        let mut board = Self::new(width);
        for (square, outcome) in shots {
            board.mark(square, CellMark::Shot(outcome));
        }
        board
    }

    /// Shows `values` (probabilities in `0..=1`) as percentages.
    pub(crate) fn heatmap(width: u8, values: &[f64]) -> Self {
        let mut board = Self::new(width);
        for square in Bitboard::square_grid(width) {
            if let Some(&value) = values.get(usize::from(square.index())) {
                board.mark(square, CellMark::Percent(value * 100.0));
            }
        }
        board
    }

    fn cell_width(&self) -> usize {
        self.marks
            .iter()
            .map(|mark| mark.to_string().len())
            .max()
            .unwrap_or(0)
            .max(1)
            + 2
    }
}

impl fmt::Display for BoardDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell_width = self.cell_width();
        let border = format!("+{}", "-".repeat(cell_width));
        let border = border.repeat(usize::from(self.width)) + "+";

        writeln!(f, "{border}")?;
        for y in 0..self.width {
            f.write_str("|")?;
            for x in 0..self.width {
                let mark = Square::new(x, y)
                    .map(|square| self.marks[usize::from(square.index())].to_string())
                    .unwrap_or_default();
                write!(f, "{mark:^cell_width$}|")?;
            }
            writeln!(f)?;
            writeln!(f, "{border}")?;
        }
        Ok(())
    }
}

/// Patterns that can be drawn on the grid.
pub(crate) trait PatternView {
    fn board(&self, width: u8) -> BoardDisplay;
}

impl PatternView for MaskPattern {
    fn board(&self, width: u8) -> BoardDisplay {
        BoardDisplay::mask(width, self.mask())
    }
}

impl PatternView for OrderedPattern {
    fn board(&self, width: u8) -> BoardDisplay {
        BoardDisplay::ordered(width, self)
    }
}
