use kiddo::immutable::float::kdtree::ImmutableKdTree;

use crate::configuration::Configuration;
use crate::error::MatchError;

/// Static nearest-neighbor index over the instance positions of a configuration.
///
/// The index is immutable once built and can be shared across threads for
/// concurrent queries.
pub struct SpatialIndex {
    // kd-tree over the indexed positions, `None` when there is nothing to index
    tree: Option<ImmutableKdTree<f64, u32, 3, 32>>,
    // maps a kd-tree item back to its slot index
    slots: Vec<usize>,
    // number of slots of the indexed configuration
    num_slots: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.slots.len())
            .field("num_slots", &self.num_slots)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    /// Build the index over the positions of the instances of `config`.
    ///
    /// Background and empty slots are left out of the index.
    pub fn new(config: &Configuration) -> Self {
        let slots = config.instance_indices().collect::<Vec<_>>();
        let points = slots
            .iter()
            .map(|&i| config.position(i))
            .collect::<Vec<_>>();
        Self::from_parts(&points, slots, config.len())
    }

    /// Build the index over raw points, slot `i` being `points[i]`.
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self::from_parts(points, (0..points.len()).collect(), points.len())
    }

    fn from_parts(points: &[[f64; 3]], slots: Vec<usize>, num_slots: usize) -> Self {
        let tree = match points.is_empty() {
            true => None,
            false => Some(ImmutableKdTree::new_from_slice(points)),
        };
        Self {
            tree,
            slots,
            num_slots,
        }
    }

    /// Number of indexed positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the index holds no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots of the configuration the index was built from.
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Slots whose position lies within `radius` of `point`, in ascending order.
    pub fn query_point(&self, point: &[f64; 3], radius: f64) -> Vec<usize> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };

        let mut found = tree
            .within_unsorted::<kiddo::SquaredEuclidean>(point, radius * radius)
            .into_iter()
            .map(|nn| self.slots[nn.item as usize])
            .collect::<Vec<_>>();
        found.sort_unstable();
        found
    }

    /// For each point, the slots whose position lies within `radius`.
    ///
    /// # Arguments
    ///
    /// * `points` - Query positions.
    /// * `radius` - Search radius, must be finite and strictly positive.
    ///
    /// # Returns
    ///
    /// One list per query point, each sorted by ascending slot index.
    pub fn query_within_radius(
        &self,
        points: &[[f64; 3]],
        radius: f64,
    ) -> Result<Vec<Vec<usize>>, MatchError> {
        check_radius(radius)?;
        Ok(points.iter().map(|p| self.query_point(p, radius)).collect())
    }
}

/// Check that a search radius is finite and strictly positive.
pub(crate) fn check_radius(radius: f64) -> Result<(), MatchError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(MatchError::InvalidArgument(format!(
            "radius must be finite and positive, got {radius}"
        )));
    }
    Ok(())
}
