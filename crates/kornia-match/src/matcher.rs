use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::correspondence::Correspondence;
use crate::error::MatchError;
use crate::pose::{Pose, PoseTolerance};
use crate::spatial_index::{check_radius, SpatialIndex};
use crate::tracker::{AlignmentTracker, ScanOutcome, SearchContext};

/// Parameters of the configuration matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Distance under which two positions are considered the same location.
    pub radius: f64,
    /// Element-wise tolerance used to compare full poses.
    pub pose_tolerance: PoseTolerance,
    /// Optional cap on the number of seed transforms evaluated.
    ///
    /// `None` runs the search until convergence.
    pub max_evaluations: Option<usize>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            radius: 0.01,
            pose_tolerance: PoseTolerance::default(),
            max_evaluations: None,
        }
    }
}

impl MatchParams {
    /// Check that the parameters are usable.
    pub fn validate(&self) -> Result<(), MatchError> {
        check_radius(self.radius)?;
        let PoseTolerance { rtol, atol } = self.pose_tolerance;
        if !(rtol.is_finite() && atol.is_finite() && rtol >= 0.0 && atol >= 0.0) {
            return Err(MatchError::InvalidArgument(format!(
                "pose tolerance must be finite and non-negative, got rtol={rtol} atol={atol}"
            )));
        }
        Ok(())
    }
}

/// Counters describing how a search went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of seed transforms evaluated against the spatial index.
    pub evaluations: usize,
    /// Number of candidate sets that went through full validation.
    pub validations: usize,
    /// Number of times the best alignment was replaced.
    pub improvements: usize,
    /// Number of passes over the seed pairs.
    pub passes: usize,
    /// Whether the search reached a fixed point rather than its evaluation budget.
    pub converged: bool,
}

/// Best correspondence between two configurations and the transform realizing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Matched slot pairs.
    pub correspondence: Correspondence,
    /// Rigid transform from the frame of A to the frame of B.
    pub transform: Pose,
    /// Search counters.
    pub stats: SearchStats,
}

/// Find the rigid transform matching the largest number of instances of A onto B.
///
/// Instances correspond when they share class and color and their poses agree
/// after the transform. Trial transforms are generated from pairs of same-class
/// instances, rarest classes first, and the largest validated correspondence
/// wins. Ties keep the first alignment found.
///
/// # Arguments
///
/// * `config_a` - Configuration to align.
/// * `config_b` - Reference configuration.
/// * `index` - Optional prebuilt spatial index over `config_b`, reusable across calls.
/// * `params` - Matching parameters.
///
/// # Returns
///
/// The best alignment. The correspondence is empty and the transform is the
/// identity when no class and color compatible pair exists.
///
/// # Errors
///
/// Fails with [`MatchError::InvalidArgument`] for invalid parameters or an index
/// not built over `config_b`, and with [`MatchError::InvalidPose`] naming the
/// configuration if one of its poses is not invertible.
///
/// Example:
///
/// ```
/// use kornia_match::{match_configurations, Configuration, Instance, MatchParams};
/// use kornia_match::pose::pose_from_rotation_translation;
///
/// let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let a = Configuration::from_instances([
///     Instance::new(1, 0, pose_from_rotation_translation(&eye, &[0.0, 0.0, 0.0])),
///     Instance::new(1, 0, pose_from_rotation_translation(&eye, &[1.0, 0.0, 0.0])),
/// ]);
/// let b = Configuration::from_instances([
///     Instance::new(1, 0, pose_from_rotation_translation(&eye, &[10.0, 0.0, 0.0])),
///     Instance::new(1, 0, pose_from_rotation_translation(&eye, &[11.0, 0.0, 0.0])),
/// ]);
///
/// let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;
/// assert_eq!(alignment.correspondence.len(), 2);
/// assert_eq!(alignment.transform[0][3], 10.0);
/// # Ok::<(), kornia_match::MatchError>(())
/// ```
pub fn match_configurations(
    config_a: &Configuration,
    config_b: &Configuration,
    index: Option<&SpatialIndex>,
    params: &MatchParams,
) -> Result<Alignment, MatchError> {
    params.validate()?;
    config_a
        .check_poses()
        .map_err(|source| MatchError::InvalidPose {
            configuration: "A",
            source,
        })?;
    config_b
        .check_poses()
        .map_err(|source| MatchError::InvalidPose {
            configuration: "B",
            source,
        })?;

    let owned_index;
    let index = match index {
        Some(index) if index.num_slots() != config_b.len() => {
            return Err(MatchError::InvalidArgument(format!(
                "spatial index covers {} slots but the configuration has {}",
                index.num_slots(),
                config_b.len()
            )));
        }
        Some(index) => index,
        None => {
            owned_index = SpatialIndex::new(config_b);
            &owned_index
        }
    };

    let now = std::time::Instant::now();
    let ctx = SearchContext::new(config_a, config_b, index, params);
    let mut tracker = AlignmentTracker::new();

    loop {
        match tracker.scan(&ctx)? {
            ScanOutcome::Improved => continue,
            ScanOutcome::Converged => {
                tracker.set_converged(true);
                break;
            }
            ScanOutcome::BudgetExhausted => {
                log::warn!(
                    "evaluation budget of {:?} exhausted, returning the best alignment so far",
                    params.max_evaluations
                );
                break;
            }
        }
    }

    let alignment = tracker.into_alignment();
    log::debug!(
        "matched {} instances in {} passes ({} evaluations), elapsed: {:?}",
        alignment.correspondence.len(),
        alignment.stats.passes,
        alignment.stats.evaluations,
        now.elapsed()
    );

    Ok(alignment)
}
