use crate::num::{Matrix3, Number, Point3, Pose3, Vector3};

use nalgebra::{Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Camera-to-world pose produced by one calibration pass.
///
/// A camera point `p` (body convention) maps to the world as `rotation * p + translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseResult {
    pub rotation: Matrix3,
    pub translation: Vector3,

    /// unconstrained 3x3 block of the least-squares solution, before projection
    pub linear_map: Matrix3,
    pub rank: usize,
    pub residual_rms: Number,
    /// the SVD projection produced a reflection and the last axis was flipped
    pub reflection_corrected: bool,
}

/// Serializable summary of a [`PoseResult`], rotation in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    pub rotation: [[Number; 3]; 3],
    pub translation: [Number; 3],
    pub determinant: Number,
    pub rank: usize,
    pub residual_rms: Number,
    pub reflection_corrected: bool,
}

impl PoseResult {
    #[inline]
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// The pose as an isometry. `None` if the rotation is a reflection,
    /// which only happens when the reflection correction is disabled.
    pub fn to_isometry(&self) -> Option<Pose3> {
        if self.rotation.determinant() <= 0.0 {
            return None;
        }
        let rotation = Rotation3::from_matrix_unchecked(self.rotation);
        Some(Pose3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_rotation_matrix(&rotation),
        ))
    }

    pub fn report(&self) -> PoseReport {
        let r = &self.rotation;
        PoseReport {
            rotation: [
                [r[(0, 0)], r[(0, 1)], r[(0, 2)]],
                [r[(1, 0)], r[(1, 1)], r[(1, 2)]],
                [r[(2, 0)], r[(2, 1)], r[(2, 2)]],
            ],
            translation: [self.translation.x, self.translation.y, self.translation.z],
            determinant: r.determinant(),
            rank: self.rank,
            residual_rms: self.residual_rms,
            reflection_corrected: self.reflection_corrected,
        }
    }
}
