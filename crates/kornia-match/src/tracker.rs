use std::collections::HashSet;

use glam::DMat4;

use crate::candidates::CandidateGenerator;
use crate::configuration::Configuration;
use crate::correspondence::{Correspondence, SeedPair};
use crate::error::MatchError;
use crate::matcher::{Alignment, MatchParams, SearchStats};
use crate::pose::mat4_to_pose;
use crate::query::{count_potential_matches, query_candidates, seed_transform};
use crate::spatial_index::SpatialIndex;
use crate::validate::validate_matches;

/// Outcome of one pass over the seed pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A strictly larger correspondence was found; the scan must restart.
    Improved,
    /// A full pass completed without improvement.
    Converged,
    /// The evaluation budget ran out before the pass completed.
    BudgetExhausted,
}

/// Read-only inputs shared by every pass of one search.
#[derive(Debug)]
pub struct SearchContext<'a> {
    config_a: &'a Configuration,
    config_b: &'a Configuration,
    index: &'a SpatialIndex,
    params: &'a MatchParams,
    generator: CandidateGenerator<'a>,
}

impl<'a> SearchContext<'a> {
    /// Bundle the inputs of a search.
    ///
    /// The index must be built over `config_b` and the parameters already
    /// validated, as [`match_configurations`](crate::match_configurations) does.
    pub fn new(
        config_a: &'a Configuration,
        config_b: &'a Configuration,
        index: &'a SpatialIndex,
        params: &'a MatchParams,
    ) -> Self {
        Self {
            config_a,
            config_b,
            index,
            params,
            generator: CandidateGenerator::new(config_a, config_b),
        }
    }
}

/// Seed pairs already evaluated together under some transform.
#[derive(Debug, Clone, Default)]
struct TestedPairs {
    pairs: HashSet<SeedPair>,
}

impl TestedPairs {
    fn contains(&self, pair: &SeedPair) -> bool {
        self.pairs.contains(pair)
    }

    fn extend(&mut self, pairs: impl IntoIterator<Item = SeedPair>) {
        self.pairs.extend(pairs);
    }
}

/// Mutable state of the best-alignment search.
///
/// Holds the best correspondence found so far, the transform realizing it and
/// the memo of tested seed pairs. The state lives for a single search.
#[derive(Debug, Clone)]
pub struct AlignmentTracker {
    best: Correspondence,
    offset: DMat4,
    tested: TestedPairs,
    stats: SearchStats,
}

impl Default for AlignmentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignmentTracker {
    /// Create a tracker with an empty correspondence and the identity offset.
    pub fn new() -> Self {
        Self {
            best: Correspondence::new(),
            offset: DMat4::IDENTITY,
            tested: TestedPairs::default(),
            stats: SearchStats::default(),
        }
    }

    /// The best correspondence found so far.
    pub fn best(&self) -> &Correspondence {
        &self.best
    }

    /// The transform realizing the best correspondence.
    pub fn offset(&self) -> &DMat4 {
        &self.offset
    }

    /// Counters of the search so far.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Run one pass over the seed pairs, stopping at the first improvement.
    ///
    /// Accepting a new best can make previously skipped seeds worth trying
    /// again, so the caller restarts the pass until it returns
    /// [`ScanOutcome::Converged`].
    pub fn scan(&mut self, ctx: &SearchContext<'_>) -> Result<ScanOutcome, MatchError> {
        self.stats.passes += 1;

        for seed in ctx.generator.seeds() {
            // both ends are explained by the current best
            if self.best.contains_a(seed.a) && self.best.contains_b(seed.b) {
                continue;
            }
            if self.tested.contains(&seed) {
                continue;
            }
            if ctx
                .params
                .max_evaluations
                .is_some_and(|max| self.stats.evaluations >= max)
            {
                return Ok(ScanOutcome::BudgetExhausted);
            }

            self.stats.evaluations += 1;
            let b_t_a = seed_transform(ctx.config_a, ctx.config_b, seed)?;
            let candidates = query_candidates(ctx.config_a, ctx.index, &b_t_a, ctx.params.radius);

            if count_potential_matches(ctx.config_a, &candidates) <= self.best.len() {
                log::trace!("seed ({}, {}) cannot beat the current best", seed.a, seed.b);
                continue;
            }

            self.stats.validations += 1;
            let valid = validate_matches(
                ctx.config_a,
                ctx.config_b,
                &candidates,
                &b_t_a,
                &ctx.params.pose_tolerance,
            );
            self.tested.extend(valid.iter());

            if valid.len() > self.best.len() {
                log::debug!(
                    "seed ({}, {}) improves the alignment: {} -> {} matches",
                    seed.a,
                    seed.b,
                    self.best.len(),
                    valid.len()
                );
                self.best = valid;
                self.offset = b_t_a;
                self.stats.improvements += 1;
                return Ok(ScanOutcome::Improved);
            }
        }

        Ok(ScanOutcome::Converged)
    }

    /// Consume the tracker into the final alignment.
    pub fn into_alignment(self) -> Alignment {
        Alignment {
            correspondence: self.best,
            transform: mat4_to_pose(&self.offset),
            stats: self.stats,
        }
    }

    pub(crate) fn set_converged(&mut self, converged: bool) {
        self.stats.converged = converged;
    }
}
