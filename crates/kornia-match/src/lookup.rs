use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::correspondence::Correspondence;

/// Lookup tables derived from a correspondence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLookup {
    /// Map from slots of A to their matched slot in B.
    pub a_to_b: BTreeMap<usize, usize>,
    /// Map from slots of B to their matched slot in A.
    pub b_to_a: BTreeMap<usize, usize>,
    /// Instances of A without a match.
    pub misses_a: BTreeSet<usize>,
    /// Instances of B without a match.
    pub misses_b: BTreeSet<usize>,
}

/// Build forward and backward maps and the unmatched instances on both sides.
pub fn build_lookup(
    correspondence: &Correspondence,
    config_a: &Configuration,
    config_b: &Configuration,
) -> MatchLookup {
    let a_to_b = correspondence.a_to_b().clone();
    let b_to_a = correspondence.b_to_a().clone();
    let misses_a = config_a
        .instance_indices()
        .filter(|a| !a_to_b.contains_key(a))
        .collect();
    let misses_b = config_b
        .instance_indices()
        .filter(|b| !b_to_a.contains_key(b))
        .collect();

    MatchLookup {
        a_to_b,
        b_to_a,
        misses_a,
        misses_b,
    }
}
