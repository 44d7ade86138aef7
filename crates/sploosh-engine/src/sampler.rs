use arrayvec::ArrayVec;
use rand::{Rng, distr::Distribution};

use crate::core::{Bitboard, Layout, MAX_TARGETS, Orientation, Rules};

/// Draws layouts by replaying the sequential placement procedure.
///
/// Each target picks an orientation with a fair coin and a start position
/// uniformly among the runs of that orientation; a run overlapping an
/// earlier target is rejected and redrawn. Every non-overlapping run is
/// therefore accepted with equal probability, so sampled layouts follow the
/// same distribution as the probabilities of [`LayoutSet`](crate::LayoutSet).
///
/// # Examples
///
/// ```
/// use rand::{Rng as _, SeedableRng as _};
/// use sploosh_engine::{LayoutSampler, Rules};
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(1);
/// let sampler = LayoutSampler::new(&Rules::standard());
/// let layout = rng.sample(&sampler);
/// assert_eq!(layout.combined().count(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct LayoutSampler {
    runs: ArrayVec<TargetRuns, MAX_TARGETS>,
}

#[derive(Debug, Clone)]
struct TargetRuns {
    horizontal: Vec<Bitboard>,
    vertical: Vec<Bitboard>,
}

impl TargetRuns {
    fn new(width: u8, length: u8) -> Self {
        let runs = |orientation| {
            let (x_end, y_end) = match orientation {
                Orientation::Horizontal => (width - length, width - 1),
                Orientation::Vertical => (width - 1, width - length),
            };
            (0..=y_end)
                .flat_map(|y| (0..=x_end).map(move |x| (x, y)))
                .map(|(x, y)| Bitboard::run_unchecked(x, y, length, orientation))
                .collect::<Vec<_>>()
        };
        Self {
            horizontal: runs(Orientation::Horizontal),
            vertical: runs(Orientation::Vertical),
        }
    }

    fn propose<R>(&self, rng: &mut R) -> Bitboard
    where
        R: Rng + ?Sized,
    {
        let runs = if rng.random_bool(0.5) {
            &self.vertical
        } else {
            &self.horizontal
        };
        runs[rng.random_range(0..runs.len())]
    }

    fn has_room(&self, occupied: Bitboard) -> bool {
        self.horizontal
            .iter()
            .chain(&self.vertical)
            .any(|run| run.is_disjoint(occupied))
    }
}

impl LayoutSampler {
    #[must_use]
    pub fn new(rules: &Rules) -> Self {
        let runs = rules
            .target_lengths()
            .iter()
            .map(|&length| TargetRuns::new(rules.width(), length))
            .collect();
        Self { runs }
    }

    fn try_sample<R>(&self, rng: &mut R) -> Option<Layout>
    where
        R: Rng + ?Sized,
    {
        let mut occupied = Bitboard::EMPTY;
        let mut targets = ArrayVec::new();
        for runs in &self.runs {
            if !runs.has_room(occupied) {
                return None;
            }
            let run = loop {
                let run = runs.propose(rng);
                if run.is_disjoint(occupied) {
                    break run;
                }
            };
            occupied |= run;
            targets.push(run);
        }
        Some(Layout::from_targets(targets))
    }
}

impl Distribution<Layout> for LayoutSampler {
    fn sample<R>(&self, rng: &mut R) -> Layout
    where
        R: Rng + ?Sized,
    {
        // A dead end (no room for the next target) restarts the whole layout.
        // `Rules` guarantees some layout exists, so this terminates.
        loop {
            if let Some(layout) = self.try_sample(rng) {
                return layout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{LayoutSet, Square};

    #[test]
    fn test_target_runs_match_placements() {
        let rules = Rules::standard();
        for length in 2..=4 {
            let runs = TargetRuns::new(8, length);
            let mut sampled = runs.horizontal.iter().chain(&runs.vertical).copied().collect::<Vec<_>>();
            let mut expected = rules.placements(length);
            sampled.sort();
            expected.sort();
            assert_eq!(sampled, expected);
            assert_eq!(runs.horizontal.len(), runs.vertical.len());
        }
    }

    #[test]
    fn test_sampled_layouts_are_legal() {
        let rules = Rules::standard();
        let sampler = LayoutSampler::new(&rules);
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..1000 {
            let layout = sampler.sample(&mut rng);
            let targets = layout.targets();
            assert_eq!(targets.len(), 3);
            for (target, length) in targets.iter().zip(rules.target_lengths()) {
                assert_eq!(target.count(), u32::from(*length));
            }
            assert_eq!(layout.combined().count(), 9);
        }
    }

    #[test]
    fn test_toy_grid_frequencies() {
        // 2x2 grid with one length-2 target: four equally likely layouts
        let rules = Rules::new(2, &[2]).unwrap();
        let sampler = LayoutSampler::new(&rules);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut counts = HashMap::new();
        for _ in 0..4000 {
            let layout = sampler.sample(&mut rng);
            assert!(layout.combined().is_subset(rules.cells()));
            *counts.entry(layout.combined()).or_insert(0_u32) += 1;
        }
        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            assert!((800..1200).contains(count), "unbalanced counts: {counts:?}");
        }
    }

    #[test]
    fn test_occupancy_matches_enumeration() {
        let rules = Rules::standard();
        let set = LayoutSet::enumerate(&rules);
        let exact = set.marginal_occupancy();

        let sampler = LayoutSampler::new(&rules);
        let mut rng = Pcg32::seed_from_u64(11);
        let trials = 20_000;
        let mut hits = [0_u32; 64];
        for _ in 0..trials {
            for square in sampler.sample(&mut rng).combined() {
                hits[usize::from(square.index())] += 1;
            }
        }
        for square in Square::all() {
            let i = usize::from(square.index());
            let observed = f64::from(hits[i]) / f64::from(trials);
            assert!(
                (observed - exact[i]).abs() < 0.02,
                "{square}: sampled {observed:.4}, exact {:.4}",
                exact[i]
            );
        }
    }
}
