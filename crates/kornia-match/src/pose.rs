use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A 4x4 homogeneous rigid transform stored in row-major order.
///
/// The upper 3x3 block holds the orientation and the last column the position.
pub type Pose = [[f64; 4]; 4];

/// The identity pose.
pub const IDENTITY: Pose = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Convert a row-major pose into a column-major glam matrix.
#[inline]
pub fn pose_to_mat4(pose: &Pose) -> DMat4 {
    DMat4::from_cols_array_2d(pose).transpose()
}

/// Convert a glam matrix back into a row-major pose.
#[inline]
pub fn mat4_to_pose(mat: &DMat4) -> Pose {
    mat.transpose().to_cols_array_2d()
}

/// Get the translation column of a pose.
#[inline]
pub fn pose_translation(pose: &Pose) -> [f64; 3] {
    [pose[0][3], pose[1][3], pose[2][3]]
}

/// Build a pose from a rotation matrix and a translation vector.
///
/// Example:
///
/// ```
/// use kornia_match::pose::{pose_from_rotation_translation, pose_translation};
///
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let pose = pose_from_rotation_translation(&rotation, &[1.0, 2.0, 3.0]);
/// assert_eq!(pose_translation(&pose), [1.0, 2.0, 3.0]);
/// ```
pub fn pose_from_rotation_translation(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> Pose {
    let mut pose = IDENTITY;
    for (row, (dst, src)) in pose.iter_mut().zip(rotation.iter()).enumerate() {
        dst[..3].copy_from_slice(src);
        dst[3] = translation[row];
    }
    pose
}

/// Build a pose from a glam rotation matrix and translation.
pub fn pose_from_mat3(rotation: DMat3, translation: DVec3) -> Pose {
    mat4_to_pose(&DMat4::from_cols(
        rotation.x_axis.extend(0.0),
        rotation.y_axis.extend(0.0),
        rotation.z_axis.extend(0.0),
        translation.extend(1.0),
    ))
}

/// Check that the pose of slot `index` is finite and invertible.
pub fn check_pose(pose: &DMat4, index: usize) -> Result<(), GeometryError> {
    if !pose.is_finite() {
        return Err(GeometryError::NonFinitePose { index });
    }

    let determinant = pose.determinant();
    if determinant.abs() <= f64::EPSILON {
        return Err(GeometryError::SingularPose { index, determinant });
    }

    Ok(())
}

/// Compute the transform mapping the frame of `src_pose` onto `dst_pose`.
///
/// Returns `dst_pose * src_pose^-1`, so that `T * src_pose == dst_pose`.
///
/// # Arguments
///
/// * `src_pose` - Pose of the source instance.
/// * `dst_pose` - Pose of the destination instance.
/// * `src_index` - Slot index of the source instance, used for error reporting.
pub fn relative_transform(
    src_pose: &DMat4,
    dst_pose: &DMat4,
    src_index: usize,
) -> Result<DMat4, GeometryError> {
    check_pose(src_pose, src_index)?;
    Ok(*dst_pose * src_pose.inverse())
}

/// Element-wise closeness tolerance between two poses.
///
/// Two entries `x` and `y` are close when `|x - y| <= atol + rtol * |y|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseTolerance {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
}

impl Default for PoseTolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl PoseTolerance {
    /// Check whether every entry of `lhs` is close to the matching entry of `rhs`.
    pub fn allclose(&self, lhs: &DMat4, rhs: &DMat4) -> bool {
        lhs.to_cols_array()
            .iter()
            .zip(rhs.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= self.atol + self.rtol * y.abs())
    }
}
