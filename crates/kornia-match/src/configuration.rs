use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, MatchError};
use crate::pose::{check_pose, pose_to_mat4, pose_translation, Pose, IDENTITY};

/// A single labeled rigid-body instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    /// Class label of the instance. Zero marks an empty slot.
    pub class: u32,
    /// Color label of the instance.
    pub color: u32,
    /// Placement of the instance in the configuration frame.
    pub pose: Pose,
}

impl Instance {
    /// Create a new instance.
    pub fn new(class: u32, color: u32, pose: Pose) -> Self {
        Self { class, color, pose }
    }
}

/// An indexed collection of labeled, posed instances.
///
/// Slot 0 is reserved as background and never takes part in matching, nor does
/// any slot whose class label is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigurationParts")]
pub struct Configuration {
    class: Vec<u32>,
    color: Vec<u32>,
    pose: Vec<Pose>,
}

#[derive(Deserialize)]
struct ConfigurationParts {
    class: Vec<u32>,
    color: Vec<u32>,
    pose: Vec<Pose>,
}

impl TryFrom<ConfigurationParts> for Configuration {
    type Error = MatchError;

    fn try_from(parts: ConfigurationParts) -> Result<Self, Self::Error> {
        Self::new(parts.class, parts.color, parts.pose)
    }
}

impl Configuration {
    /// Create a configuration from per-slot class labels, color labels and poses.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MismatchedLengths`] if the three arrays differ in length.
    pub fn new(class: Vec<u32>, color: Vec<u32>, pose: Vec<Pose>) -> Result<Self, MatchError> {
        if class.len() != color.len() || class.len() != pose.len() {
            return Err(MatchError::MismatchedLengths {
                class: class.len(),
                color: color.len(),
                pose: pose.len(),
            });
        }
        Ok(Self { class, color, pose })
    }

    /// Create a configuration from a list of instances.
    ///
    /// The background slot is inserted first, so the i-th instance lands in slot `i + 1`.
    pub fn from_instances(instances: impl IntoIterator<Item = Instance>) -> Self {
        let mut class = vec![0];
        let mut color = vec![0];
        let mut pose = vec![IDENTITY];
        for instance in instances {
            class.push(instance.class);
            color.push(instance.color);
            pose.push(instance.pose);
        }
        Self { class, color, pose }
    }

    /// Number of slots, including the background and empty slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.class.len()
    }

    /// Check if the configuration has no slots at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.class.is_empty()
    }

    /// Per-slot class labels.
    pub fn class(&self) -> &[u32] {
        &self.class
    }

    /// Per-slot color labels.
    pub fn color(&self) -> &[u32] {
        &self.color
    }

    /// Per-slot poses.
    pub fn poses(&self) -> &[Pose] {
        &self.pose
    }

    /// Whether slot `index` holds an instance that can take part in matching.
    #[inline]
    pub fn is_present(&self, index: usize) -> bool {
        index != 0 && self.class.get(index).is_some_and(|&c| c != 0)
    }

    /// Iterate over the slot indices holding an instance, in ascending order.
    pub fn instance_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.len()).filter(|&i| self.class[i] != 0)
    }

    /// Number of instances, excluding background and empty slots.
    pub fn num_instances(&self) -> usize {
        self.instance_indices().count()
    }

    /// Position of slot `index`, taken from the translation column of its pose.
    #[inline]
    pub fn position(&self, index: usize) -> [f64; 3] {
        pose_translation(&self.pose[index])
    }

    /// Positions of all slots.
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.pose.iter().map(pose_translation).collect()
    }

    /// Check that every instance pose is finite and invertible.
    pub fn check_poses(&self) -> Result<(), GeometryError> {
        self.instance_indices()
            .try_for_each(|i| check_pose(&pose_to_mat4(&self.pose[i]), i))
    }
}
