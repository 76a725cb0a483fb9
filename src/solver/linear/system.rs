use log::debug;

use crate::error::{GeometryError, Result};
use crate::num::{CoeffMatrix, DVector, Point3};

/// `A x = b` for the twelve unknowns of `w = M p + t`.
///
/// `x = [m00 m01 m02 m10 m11 m12 m20 m21 m22 t0 t1 t2]`, three rows per point.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    pub matrix_a: CoeffMatrix,
    pub vector_b: DVector,
}

impl LinearSystem {
    /// Three equations per point against twelve unknowns.
    pub const MIN_POINTS: usize = 4;
    pub const NUM_UNKNOWNS: usize = 12;

    pub fn build(camera: &[Point3], world: &[Point3]) -> Result<Self> {
        if camera.len() != world.len() {
            return Err(GeometryError::CountMismatch {
                camera: camera.len(),
                world: world.len(),
            }
            .into());
        }

        let num_points = camera.len();
        if num_points < Self::MIN_POINTS {
            return Err(GeometryError::NotEnoughPoints {
                got: num_points,
                min: Self::MIN_POINTS,
            }
            .into());
        }

        let mut matrix_a = CoeffMatrix::zeros(num_points * 3);
        let mut vector_b = DVector::zeros(num_points * 3);

        for (i, (p, w)) in camera.iter().zip(world.iter()).enumerate() {
            let p = p.coords.transpose();

            for axis in 0..3 {
                let n_row = i * 3 + axis;
                matrix_a
                    .fixed_view_mut::<1, 3>(n_row, axis * 3)
                    .copy_from(&p);
                matrix_a[(n_row, 9 + axis)] = 1.0;
                vector_b[n_row] = w[axis];
            }
        }

        debug!(
            "built {}x{} linear system from {} correspondences",
            matrix_a.nrows(),
            matrix_a.ncols(),
            num_points
        );

        Ok(Self { matrix_a, vector_b })
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.matrix_a.nrows() / 3
    }
}
