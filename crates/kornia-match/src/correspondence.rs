use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// An ordered pair of slot indices, one in configuration A and one in configuration B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeedPair {
    /// Slot index in configuration A.
    pub a: usize,
    /// Slot index in configuration B.
    pub b: usize,
}

impl SeedPair {
    /// Create a new pair.
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }
}

impl From<(usize, usize)> for SeedPair {
    fn from((a, b): (usize, usize)) -> Self {
        Self { a, b }
    }
}

/// A partial bijection between the slots of two configurations.
///
/// No A slot and no B slot appears in more than one pair. Pairs are iterated in
/// ascending order of their A slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SeedPair>", into = "Vec<SeedPair>")]
pub struct Correspondence {
    a_to_b: BTreeMap<usize, usize>,
    b_to_a: BTreeMap<usize, usize>,
}

impl Correspondence {
    /// Create an empty correspondence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.a_to_b.len()
    }

    /// Check if the correspondence has no pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.a_to_b.is_empty()
    }

    /// Add the pair `(a, b)`.
    ///
    /// Returns `false` and leaves the correspondence untouched if `a` or `b` is
    /// already part of another pair.
    pub fn insert(&mut self, a: usize, b: usize) -> bool {
        if self.a_to_b.contains_key(&a) || self.b_to_a.contains_key(&b) {
            return false;
        }
        self.a_to_b.insert(a, b);
        self.b_to_a.insert(b, a);
        true
    }

    /// Whether the pair `(a, b)` is present.
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.a_to_b.get(&a) == Some(&b)
    }

    /// Whether slot `a` of configuration A is matched.
    #[inline]
    pub fn contains_a(&self, a: usize) -> bool {
        self.a_to_b.contains_key(&a)
    }

    /// Whether slot `b` of configuration B is matched.
    #[inline]
    pub fn contains_b(&self, b: usize) -> bool {
        self.b_to_a.contains_key(&b)
    }

    /// The B slot matched to `a`, if any.
    pub fn get_b(&self, a: usize) -> Option<usize> {
        self.a_to_b.get(&a).copied()
    }

    /// The A slot matched to `b`, if any.
    pub fn get_a(&self, b: usize) -> Option<usize> {
        self.b_to_a.get(&b).copied()
    }

    /// Iterate over the pairs in ascending order of A slot.
    pub fn iter(&self) -> impl Iterator<Item = SeedPair> + '_ {
        self.a_to_b.iter().map(|(&a, &b)| SeedPair { a, b })
    }

    /// Forward map from A slots to B slots.
    pub fn a_to_b(&self) -> &BTreeMap<usize, usize> {
        &self.a_to_b
    }

    /// Backward map from B slots to A slots.
    pub fn b_to_a(&self) -> &BTreeMap<usize, usize> {
        &self.b_to_a
    }
}

impl TryFrom<Vec<SeedPair>> for Correspondence {
    type Error = MatchError;

    fn try_from(pairs: Vec<SeedPair>) -> Result<Self, Self::Error> {
        let mut correspondence = Self::new();
        for pair in pairs {
            if !correspondence.insert(pair.a, pair.b) {
                return Err(MatchError::InvalidArgument(format!(
                    "pair ({}, {}) reuses an already matched slot",
                    pair.a, pair.b
                )));
            }
        }
        Ok(correspondence)
    }
}

impl From<Correspondence> for Vec<SeedPair> {
    fn from(correspondence: Correspondence) -> Self {
        correspondence.iter().collect()
    }
}
