use super::system::LinearSystem;
use crate::error::{CalibrationError, GeometryError};
use crate::num::{Number, Vector3};
use crate::solver::Solver;

use nalgebra::{SVector, SVD};

pub type Solution = SVector<Number, 12>;

/// Least-squares solution of a [`LinearSystem`] together with its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquares {
    pub solution: Solution,
    /// numerical rank of the coefficient matrix
    pub rank: usize,
    /// root mean square of the per-point residual distance
    pub residual_rms: Number,
}

impl LeastSquares {
    /// Unknowns 9..12, the translation part of the solution.
    #[inline]
    pub fn translation(&self) -> Vector3 {
        Vector3::new(self.solution[9], self.solution[10], self.solution[11])
    }
}

/// Solves `A x = b` by SVD and refuses rank-deficient systems.
///
/// A rank-deficient system still has a minimum-norm solution, which is
/// meaningless as a pose, so the rank is checked before the solution is used.
pub struct LeastSquaresSolver<'a> {
    pub system: &'a LinearSystem,
    /// singular values below `rank_tolerance * sigma_max` count as zero
    pub rank_tolerance: Number,
}

impl<'a> Solver<Result<LeastSquares, CalibrationError>> for LeastSquaresSolver<'a> {
    fn solve(self) -> Result<LeastSquares, CalibrationError> {
        let svd = SVD::try_new(
            self.system.matrix_a.clone(),
            true,
            true,
            Self::SVD_EPS,
            Self::SVD_MAX_ITER,
        )
        .ok_or(GeometryError::SvdFailed("coefficient matrix did not converge"))?;

        let sigma_max = svd.singular_values.max();
        if !sigma_max.is_finite() || sigma_max <= 0.0 {
            return Err(GeometryError::RankDeficient {
                rank: 0,
                required: LinearSystem::NUM_UNKNOWNS,
            }
            .into());
        }

        let eps = sigma_max * self.rank_tolerance;
        let rank = svd.rank(eps);
        if rank < LinearSystem::NUM_UNKNOWNS {
            return Err(GeometryError::RankDeficient {
                rank,
                required: LinearSystem::NUM_UNKNOWNS,
            }
            .into());
        }

        let solution: Solution = svd
            .solve(&self.system.vector_b, eps)
            .map_err(GeometryError::SvdFailed)?;

        let residual = &self.system.matrix_a * solution - &self.system.vector_b;
        let residual_rms = (residual.norm_squared() / self.system.num_points() as Number).sqrt();

        Ok(LeastSquares {
            solution,
            rank,
            residual_rms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::{Matrix3, Point3};

    fn solve(camera: &[Point3], world: &[Point3]) -> Result<LeastSquares, CalibrationError> {
        let system = LinearSystem::build(camera, world)?;
        LeastSquaresSolver {
            system: &system,
            rank_tolerance: 1e-9,
        }
        .solve()
    }

    fn tetrahedron() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.4, 0.7, 0.2),
        ]
    }

    #[test]
    fn recovers_affine_map_exactly() {
        let m = Matrix3::new(1.0, 0.2, 0.0, -0.1, 0.9, 0.3, 0.0, 0.0, 1.1);
        let t = Vector3::new(0.3, -1.0, 2.0);
        let camera = tetrahedron();
        let world: Vec<Point3> = camera.iter().map(|p| Point3::from(m * p.coords + t)).collect();

        let result = solve(&camera, &world).unwrap();

        assert_eq!(result.rank, 12);
        assert!(result.residual_rms < 1e-9);
        assert!((result.translation() - t).norm() < 1e-9);
        let m_est = Matrix3::from_row_slice(&result.solution.as_slice()[..9]);
        assert!((m_est - m).norm() < 1e-9);
    }

    #[test]
    fn coplanar_points_are_rank_deficient() {
        let camera = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.5, 0.2, 1.0),
        ];
        let world = camera.clone();

        let err = solve(&camera, &world).unwrap_err();
        match err {
            CalibrationError::DegenerateGeometry(GeometryError::RankDeficient { rank, required }) => {
                assert_eq!(required, 12);
                assert_eq!(rank, 9);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn collinear_points_are_rank_deficient() {
        let camera: Vec<Point3> = (0..6)
            .map(|i| Point3::new(i as f64, 2.0 * i as f64, 1.0 + i as f64))
            .collect();
        let world = camera.clone();

        let err = solve(&camera, &world).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::DegenerateGeometry(GeometryError::RankDeficient { rank: 6, .. })
        ));
    }

    #[test]
    fn noisy_fit_reports_residual() {
        let camera = tetrahedron();
        let mut world = camera.clone();
        world[4].x += 0.01;

        let result = solve(&camera, &world).unwrap();
        assert!(result.residual_rms > 1e-5);
        assert!(result.residual_rms < 0.01);
    }
}
