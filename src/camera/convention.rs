use crate::error::{ConfigError, Result};
use crate::num::{Matrix3, Number, Point3};

/// Fixed axis permutation applied to every back-projected point before solving.
///
/// The default maps the optical frame (x right, y down, z forward) onto the
/// body frame of the calibration rig (x forward, y left, z up). Another camera
/// mount needs another matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConvention(Matrix3);

impl AxisConvention {
    const ORTHOGONALITY_TOLERANCE: Number = 1e-6;

    #[rustfmt::skip]
    pub fn optical_to_body() -> Self {
        Self(Matrix3::new(
             0.0,  0.0, 1.0,
            -1.0,  0.0, 0.0,
             0.0, -1.0, 0.0,
        ))
    }

    /// Keep points in the optical frame.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn new(matrix: Matrix3) -> Result<Self> {
        let error = (matrix.transpose() * matrix - Matrix3::identity()).amax();
        if !error.is_finite() || error > Self::ORTHOGONALITY_TOLERANCE {
            return Err(ConfigError::InvalidAxisConvention.into());
        }
        Ok(Self(matrix))
    }

    /// Nine values in row-major order.
    pub fn from_row_slice(values: &[Number; 9]) -> Result<Self> {
        Self::new(Matrix3::from_row_slice(values))
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix3 {
        &self.0
    }

    #[inline]
    pub fn apply(&self, point: &Point3) -> Point3 {
        Point3::from(self.0 * point.coords)
    }
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self::optical_to_body()
    }
}
