use glam::DMat4;

use crate::configuration::Configuration;
use crate::correspondence::SeedPair;
use crate::error::MatchError;
use crate::pose::{pose_to_mat4, relative_transform};
use crate::spatial_index::SpatialIndex;

/// Compute the trial transform that maps the seed instance of A onto the seed instance of B.
///
/// The transform is `pose_b[b] * pose_a[a]^-1`.
pub fn seed_transform(
    config_a: &Configuration,
    config_b: &Configuration,
    seed: SeedPair,
) -> Result<DMat4, MatchError> {
    let pose_a = pose_to_mat4(&config_a.poses()[seed.a]);
    let pose_b = pose_to_mat4(&config_b.poses()[seed.b]);
    Ok(relative_transform(&pose_a, &pose_b, seed.a)?)
}

/// Positions of the instances of A after applying `b_t_a`.
///
/// Background and empty slots are reported as `None`.
pub fn transform_positions(config_a: &Configuration, b_t_a: &DMat4) -> Vec<Option<[f64; 3]>> {
    (0..config_a.len())
        .map(|i| {
            config_a.is_present(i).then(|| {
                let transformed = *b_t_a * pose_to_mat4(&config_a.poses()[i]);
                transformed.w_axis.truncate().to_array()
            })
        })
        .collect()
}

/// For every slot of A, the slots of B lying within `radius` after applying `b_t_a`.
///
/// Background and empty slots of A get an empty list.
pub fn query_candidates(
    config_a: &Configuration,
    index: &SpatialIndex,
    b_t_a: &DMat4,
    radius: f64,
) -> Vec<Vec<usize>> {
    transform_positions(config_a, b_t_a)
        .iter()
        .map(|p| match p {
            Some(p) => index.query_point(p, radius),
            None => Vec::new(),
        })
        .collect()
}

/// Upper bound on the number of matches a set of raw candidates can validate to.
pub fn count_potential_matches(config_a: &Configuration, candidates: &[Vec<usize>]) -> usize {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, c)| !c.is_empty() && config_a.is_present(*i))
        .count()
}
