use std::collections::BTreeMap;

use crate::configuration::Configuration;
use crate::correspondence::SeedPair;

// Instances of one class label in both configurations.
#[derive(Debug, Clone)]
struct ClassGroup {
    class: u32,
    a: Vec<usize>,
    b: Vec<usize>,
}

/// Enumerates the seed pairs used to generate trial transforms.
///
/// Classes are visited from the rarest to the most common in configuration A,
/// ties broken by label, since a wrong guess about a rare instance is cheap to
/// reject. Within a class every A instance is paired with every B instance of
/// the same color.
#[derive(Debug, Clone)]
pub struct CandidateGenerator<'a> {
    config_a: &'a Configuration,
    config_b: &'a Configuration,
    groups: Vec<ClassGroup>,
}

impl<'a> CandidateGenerator<'a> {
    /// Group the instances of both configurations by class label.
    pub fn new(config_a: &'a Configuration, config_b: &'a Configuration) -> Self {
        let mut by_class: BTreeMap<u32, ClassGroup> = BTreeMap::new();
        for a in config_a.instance_indices() {
            let class = config_a.class()[a];
            by_class
                .entry(class)
                .or_insert_with(|| ClassGroup {
                    class,
                    a: Vec::new(),
                    b: Vec::new(),
                })
                .a
                .push(a);
        }
        for b in config_b.instance_indices() {
            if let Some(group) = by_class.get_mut(&config_b.class()[b]) {
                group.b.push(b);
            }
        }

        // the map is keyed by label, so a stable sort keeps ties in label order
        let mut groups = by_class.into_values().collect::<Vec<_>>();
        groups.sort_by_key(|g| g.a.len());

        Self {
            config_a,
            config_b,
            groups,
        }
    }

    /// Class labels present in A, in visiting order.
    pub fn class_order(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.iter().map(|g| g.class)
    }

    /// Iterate over the seed pairs sharing class and color, in visiting order.
    pub fn seeds(&self) -> impl Iterator<Item = SeedPair> + '_ {
        let color_a = self.config_a.color();
        let color_b = self.config_b.color();
        self.groups
            .iter()
            // classes missing from B cannot produce a seed
            .filter(|g| !g.b.is_empty())
            .flat_map(move |g| {
                g.a.iter().flat_map(move |&a| {
                    g.b.iter()
                        .filter(move |&&b| color_a[a] == color_b[b])
                        .map(move |&b| SeedPair { a, b })
                })
            })
    }
}
