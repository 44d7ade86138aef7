use std::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not},
};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of bits reserved per grid row.
///
/// Every grid, whatever its playable width, uses the same `x + 8 * y` bit
/// layout so masks from different rule sets stay comparable.
pub const GRID_STRIDE: u8 = 8;

/// Total number of addressable cells.
pub const CELL_COUNT: u8 = GRID_STRIDE * GRID_STRIDE;

/// A single cell of the 8x8 grid, stored as its bit index `x + 8 * y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Creates a square from grid coordinates, or `None` when outside the 8x8 grid.
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Option<Self> {
        if x < GRID_STRIDE && y < GRID_STRIDE {
            Some(Self(x + GRID_STRIDE * y))
        } else {
            None
        }
    }

    /// Creates a square from its bit index, or `None` when the index is 64 or above.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn x(self) -> u8 {
        self.0 % GRID_STRIDE
    }

    #[must_use]
    pub const fn y(self) -> u8 {
        self.0 / GRID_STRIDE
    }

    /// Returns the single-cell mask for this square.
    #[must_use]
    pub const fn bit(self) -> Bitboard {
        Bitboard(1 << self.0)
    }

    /// Iterates over all 64 squares in bit order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..CELL_COUNT).map(Self)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

impl Serialize for Square {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct as _;
        let mut state = serializer.serialize_struct("Square", 2)?;
        state.serialize_field("x", &self.x())?;
        state.serialize_field("y", &self.y())?;
        state.end()
    }
}

/// Direction a linear target runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// An 8x8 grid packed into a single 64-bit mask.
///
/// Bit `x + 8 * y` represents cell `(x, y)`. The type is an immutable value:
/// every operation returns a new mask.
///
/// # Examples
///
/// ```
/// use sploosh_engine::{Bitboard, Square};
///
/// let a = Square::new(1, 2).unwrap();
/// let b = Square::new(3, 0).unwrap();
/// let mask = a.bit() | b.bit();
/// assert_eq!(mask.count(), 2);
/// assert!(mask.contains(a));
/// assert_eq!(mask.nth_set(0), Some(b));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = Self(u64::MAX);

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns the mask of the top-left `width` x `width` cells.
    #[must_use]
    pub const fn square_grid(width: u8) -> Self {
        if width >= GRID_STRIDE {
            return Self::FULL;
        }
        let row = (1u64 << width) - 1;
        let mut bits = 0;
        let mut y = 0;
        while y < width {
            bits |= row << (y * GRID_STRIDE);
            y += 1;
        }
        Self(bits)
    }

    /// Returns the run of `length` cells starting at `(x, y)`, or `None` if
    /// the run leaves the 8x8 grid.
    #[must_use]
    pub const fn run(x: u8, y: u8, length: u8, orientation: Orientation) -> Option<Self> {
        let (end_x, end_y) = match orientation {
            Orientation::Horizontal => (x.saturating_add(length), y.saturating_add(1)),
            Orientation::Vertical => (x.saturating_add(1), y.saturating_add(length)),
        };
        if length == 0 || end_x > GRID_STRIDE || end_y > GRID_STRIDE {
            return None;
        }
        Some(Self::run_unchecked(x, y, length, orientation))
    }

    pub(crate) const fn run_unchecked(x: u8, y: u8, length: u8, orientation: Orientation) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < length {
            let (cx, cy) = match orientation {
                Orientation::Horizontal => (x + i, y),
                Orientation::Vertical => (x, y + i),
            };
            bits |= 1 << (cx + GRID_STRIDE * cy);
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, square: Square) -> bool {
        self.0 & (1 << square.0) != 0
    }

    #[must_use]
    pub const fn with(self, square: Square) -> Self {
        Self(self.0 | (1 << square.0))
    }

    #[must_use]
    pub const fn without(self, square: Square) -> Self {
        Self(self.0 & !(1 << square.0))
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_disjoint(self, other: Self) -> bool {
        !self.intersects(other)
    }

    /// Returns `true` if every cell of `self` is also in `other`.
    #[must_use]
    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Returns the lowest set square.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn first(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square(self.0.trailing_zeros() as u8))
        }
    }

    /// Returns the `n`-th set square (0-indexed, counting from bit 0).
    ///
    /// This is a portable linear scan over the set bits; it returns `None`
    /// when the mask has `n` or fewer set bits.
    #[must_use]
    pub const fn nth_set(self, n: u32) -> Option<Square> {
        let mut bits = self.0;
        let mut skipped = 0;
        while skipped < n {
            if bits == 0 {
                return None;
            }
            bits &= bits - 1;
            skipped += 1;
        }
        Self(bits).first()
    }

    /// Picks a set square uniformly at random.
    pub fn choose<R>(self, rng: &mut R) -> Option<Square>
    where
        R: Rng + ?Sized,
    {
        let count = self.count();
        if count == 0 {
            return None;
        }
        self.nth_set(rng.random_range(0..count))
    }

    /// Iterates over the set squares in ascending bit order.
    #[must_use]
    pub const fn squares(self) -> Squares {
        Squares(self.0)
    }

    /// Creates a bitboard from ASCII art for testing.
    ///
    /// `#` marks a set cell and `.` an empty one; blank lines are skipped and
    /// rows are given top to bottom.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::EMPTY;
        let lines = art.lines().filter(|line| !line.trim().is_empty());
        for (y, line) in lines.enumerate() {
            let cells = line.chars().filter(|c| *c == '#' || *c == '.');
            for (x, ch) in cells.enumerate() {
                if ch != '#' {
                    continue;
                }
                let square = u8::try_from(x)
                    .ok()
                    .zip(u8::try_from(y).ok())
                    .and_then(|(x, y)| Square::new(x, y));
                let Some(square) = square else {
                    panic!("cell ({x}, {y}) is outside the grid");
                };
                board = board.with(square);
            }
        }
        board
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = Squares;

    fn into_iter(self) -> Self::IntoIter {
        self.squares()
    }
}

/// Iterator over the set squares of a [`Bitboard`].
#[derive(Debug, Clone)]
pub struct Squares(u64);

impl Iterator for Squares {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        let square = Bitboard(self.0).first()?;
        self.0 &= self.0 - 1;
        Some(square)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Squares {}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitXor for Bitboard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Not for Bitboard {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl Serialize for Bitboard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "0000000000000102" (16 hex digits, bit 0 is the last digit's LSB)
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Bitboard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.len() != 16 {
            return Err(serde::de::Error::custom(format!(
                "expected 16 hex digits, got {}",
                s.len()
            )));
        }
        let bits = u64::from_str_radix(&s, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {s} ({e})")))?;
        Ok(Self(bits))
    }
}
