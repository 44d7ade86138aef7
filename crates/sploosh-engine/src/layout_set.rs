//! Exhaustive layout enumeration with exact placement probabilities.
//!
//! Targets are placed one after another: the first uniformly among all of
//! its runs, each later one uniformly among the runs that avoid every target
//! already placed. A layout's probability is therefore the product of the
//! reciprocal counts of valid runs at each step, not a uniform share of the
//! enumerated set.
//!
//! ```text
//! P(t2, t3, t4) = 1/|runs(2)| * 1/|runs(3) avoiding t2| * 1/|runs(4) avoiding t2|t3|
//! ```

use arrayvec::ArrayVec;

use crate::core::{Bitboard, CELL_COUNT, Layout, MAX_TARGETS, Rules, WeightedLayout};

/// Every legal layout for a rule set, with exact probabilities.
///
/// Built once and read-only afterwards. For the standard rules the set
/// holds 604 584 layouts.
#[derive(Debug, Clone)]
pub struct LayoutSet {
    rules: Rules,
    layouts: Vec<WeightedLayout>,
}

impl LayoutSet {
    /// Enumerates every legal layout for `rules`.
    #[must_use]
    pub fn enumerate(rules: &Rules) -> Self {
        let placements = rules
            .target_lengths()
            .iter()
            .map(|&length| rules.placements(length))
            .collect::<Vec<_>>();

        let mut layouts = vec![];
        let mut placed = ArrayVec::new();
        extend_layouts(
            &placements,
            &mut placed,
            Bitboard::EMPTY,
            1.0,
            &mut layouts,
        );

        let this = Self {
            rules: rules.clone(),
            layouts,
        };
        if let Some((min, max)) = this.probability_range() {
            log::debug!(
                "enumerated {} layouts: probability sum {:.12}, min {min:e}, max {max:e}",
                this.len(),
                this.probability_sum(),
            );
        }
        this
    }

    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    #[must_use]
    pub fn layouts(&self) -> &[WeightedLayout] {
        &self.layouts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedLayout> {
        self.layouts.iter()
    }

    /// Total probability mass; 1.0 up to rounding for any valid rule set.
    #[must_use]
    pub fn probability_sum(&self) -> f64 {
        self.layouts.iter().map(WeightedLayout::probability).sum()
    }

    /// Smallest and largest layout probability.
    #[must_use]
    pub fn probability_range(&self) -> Option<(f64, f64)> {
        let mut probabilities = self.layouts.iter().map(WeightedLayout::probability);
        let first = probabilities.next()?;
        Some(probabilities.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Probability that each cell is covered by some target.
    ///
    /// Indexed by [`Square::index`](crate::Square::index).
    #[must_use]
    pub fn marginal_occupancy(&self) -> [f64; CELL_COUNT as usize] {
        let mut occupancy = [0.0; CELL_COUNT as usize];
        for weighted in &self.layouts {
            for square in weighted.layout().combined() {
                occupancy[usize::from(square.index())] += weighted.probability();
            }
        }
        occupancy
    }

    /// Cells whose marginal occupancy is maximal (within `1e-12`).
    #[must_use]
    pub fn argmax_cells(&self) -> Bitboard {
        let occupancy = self.marginal_occupancy();
        let max = occupancy.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return Bitboard::EMPTY;
        }
        crate::Square::all()
            .filter(|square| (max - occupancy[usize::from(square.index())]).abs() < 1e-12)
            .collect()
    }
}

impl<'a> IntoIterator for &'a LayoutSet {
    type Item = &'a WeightedLayout;
    type IntoIter = std::slice::Iter<'a, WeightedLayout>;

    fn into_iter(self) -> Self::IntoIter {
        self.layouts.iter()
    }
}

#[expect(clippy::cast_precision_loss)]
fn extend_layouts(
    placements: &[Vec<Bitboard>],
    placed: &mut ArrayVec<Bitboard, MAX_TARGETS>,
    occupied: Bitboard,
    probability: f64,
    out: &mut Vec<WeightedLayout>,
) {
    let Some(runs) = placements.get(placed.len()) else {
        out.push(WeightedLayout::new(
            Layout::from_targets(placed.clone()),
            probability,
        ));
        return;
    };

    let valid = runs.iter().filter(|run| run.is_disjoint(occupied)).count();
    if valid == 0 {
        // no room left for this target; the branch carries no layouts
        return;
    }
    let probability = probability * (1.0 / valid as f64);

    for &run in runs {
        if run.intersects(occupied) {
            continue;
        }
        placed.push(run);
        extend_layouts(placements, placed, occupied | run, probability, out);
        placed.pop();
    }
}
