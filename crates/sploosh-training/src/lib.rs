//! Evolutionary search for fixed guess patterns.
//!
//! Candidates are scored by Monte Carlo trials against freshly sampled
//! layouts, the best half survives each round, and the best quarter seeds
//! mutated children.
//!
//! # Architecture
//!
//! ```text
//! LayoutSampler (sploosh-engine)
//!     ↓ one layout per trial
//! Objective (sploosh-evaluator)
//!     ↓ adds to
//! Population fitness
//!     ↓ sorted, truncated, mutated by
//! PopulationEvolver
//!     ↓ finalists re-scored by
//! ExactEvaluator (sploosh-evaluator)
//! ```
//!
//! See the [`genetic`] module for the round cycle and [`stats`] for the
//! per-round summary.
//!
//! # Current Limitations
//!
//! - **Noisy selection**: survivors are chosen on sampled fitness, so a
//!   lucky pattern can survive a round it does not deserve; only the final
//!   exact evaluation removes the noise.
//! - **Single-threaded**: trials are independent partial sums and could be
//!   split across threads, but are not.

pub mod genetic;
pub mod stats;
