use super::base::PoseResult;
use super::procrustes::nearest_rotation;
use crate::error::{CalibrationError, GeometryError};
use crate::num::{Matrix3, Number, Point3};
use crate::solver::common::{center, spread_ratio};
use crate::solver::{LeastSquaresSolver, LinearSystem, Solver};

use log::info;

/// Camera-to-world pose from paired camera-frame and world-frame points.
///
/// The twelve entries of `w = M p + t` are solved without constraints, then
/// `M` is projected onto the closest rotation.
///
/// The rank check only catches exactly degenerate sets. Clicks on a single
/// wall are coplanar up to depth noise and still give a full-rank system, so
/// the camera points must also be spread out of any plane by at least
/// `min_spread_ratio` of their extent.
pub struct PoseSolver<'a> {
    pub camera: &'a [Point3],
    pub world: &'a [Point3],

    pub rank_tolerance: Number,
    pub min_spread_ratio: Number,
    pub enforce_proper_rotation: bool,
}

impl<'a> PoseSolver<'a> {
    pub const DEFAULT_RANK_TOLERANCE: Number = 1e-9;
    pub const DEFAULT_MIN_SPREAD_RATIO: Number = 1e-2;

    #[inline]
    pub fn new(camera: &'a [Point3], world: &'a [Point3]) -> Self {
        Self {
            camera,
            world,
            rank_tolerance: Self::DEFAULT_RANK_TOLERANCE,
            min_spread_ratio: Self::DEFAULT_MIN_SPREAD_RATIO,
            enforce_proper_rotation: true,
        }
    }
}

impl<'a> Solver<Result<PoseResult, CalibrationError>> for PoseSolver<'a> {
    fn solve(self) -> Result<PoseResult, CalibrationError> {
        // 1. Center the camera points; w = M (p' + c) + t = M p' + (M c + t)
        let (centered, centroid) = center(self.camera);

        // 2. Solve the unconstrained linear system
        let system = LinearSystem::build(&centered, self.world)?;
        let least_squares = LeastSquaresSolver {
            system: &system,
            rank_tolerance: self.rank_tolerance,
        }
        .solve()?;

        // 3. Refuse sets that are flat up to noise
        let spread = spread_ratio(&centered);
        if spread < self.min_spread_ratio {
            return Err(GeometryError::IllConditioned {
                ratio: spread,
                min: self.min_spread_ratio,
            }
            .into());
        }

        // 4. Undo the centering
        let linear_map = Matrix3::from_row_slice(&least_squares.solution.as_slice()[..9]);
        let translation = least_squares.translation() - linear_map * centroid;

        // 5. Snap the linear map onto a rotation
        let (rotation, reflection_corrected) = nearest_rotation(
            &linear_map,
            self.enforce_proper_rotation,
            Self::SVD_EPS,
            Self::SVD_MAX_ITER,
        )?;

        info!(
            "solved pose from {} points: rank {}, residual {:.6}, reflection corrected: {}",
            system.num_points(),
            least_squares.rank,
            least_squares.residual_rms,
            reflection_corrected
        );

        Ok(PoseResult {
            rotation,
            translation,
            linear_map,
            rank: least_squares.rank,
            residual_rms: least_squares.residual_rms,
            reflection_corrected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Vector3;
    use nalgebra::Rotation3;

    fn apply(r: &Matrix3, t: &Vector3, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| Point3::from(r * p.coords + t)).collect()
    }

    #[test]
    fn unit_axes_with_offset() {
        let world = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let t0 = Vector3::new(0.0, 0.0, 1.0);
        // R0 = I, so camera points are R0^T (w - t0)
        let camera: Vec<Point3> = world.iter().map(|w| w - t0).collect();

        let pose = PoseSolver::new(&camera, &world).solve().unwrap();

        assert!((pose.rotation - Matrix3::identity()).norm() < 1e-9);
        assert!((pose.translation - t0).norm() < 1e-9);
        assert!(!pose.reflection_corrected);
    }

    #[test]
    fn recovers_known_rigid_transform() {
        let r0 = *Rotation3::from_euler_angles(0.2, -0.5, 2.4).matrix();
        let t0 = Vector3::new(-1.5, 0.7, 3.2);
        let camera = vec![
            Point3::new(2.1, 0.3, -0.2),
            Point3::new(1.7, -0.6, 0.4),
            Point3::new(3.0, 0.1, 0.9),
            Point3::new(2.4, 0.8, -0.7),
            Point3::new(1.2, -0.1, 0.05),
            Point3::new(2.8, -0.9, -0.3),
        ];
        let world = apply(&r0, &t0, &camera);

        let pose = PoseSolver::new(&camera, &world).solve().unwrap();

        assert!((pose.rotation - r0).norm() < 1e-9);
        assert!((pose.translation - t0).norm() < 1e-9);
        assert!(pose.residual_rms < 1e-9);
        assert_eq!(pose.rank, 12);
    }

    #[test]
    fn far_away_points_still_solve() {
        let r0 = *Rotation3::from_euler_angles(0.05, 0.1, -0.3).matrix();
        let t0 = Vector3::new(10.0, -4.0, 1.0);
        let camera: Vec<Point3> = [
            (0.0, 0.0, 0.0),
            (0.2, 0.0, 0.0),
            (0.0, 0.2, 0.0),
            (0.0, 0.0, 0.2),
            (0.1, 0.15, 0.05),
        ]
        .iter()
        .map(|&(x, y, z)| Point3::new(x + 8.0, y + 0.5, z - 0.4))
        .collect();
        let world = apply(&r0, &t0, &camera);

        let pose = PoseSolver::new(&camera, &world).solve().unwrap();
        assert!((pose.rotation - r0).norm() < 1e-8);
        assert!((pose.translation - t0).norm() < 1e-7);
    }

    #[test]
    fn reflective_map_is_corrected() {
        // world points are a mirror image of the camera points
        let mirror = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        let camera = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.5, 0.5, 0.5),
        ];
        let world = apply(&mirror, &Vector3::zeros(), &camera);

        let hardened = PoseSolver::new(&camera, &world).solve().unwrap();
        assert!(hardened.reflection_corrected);
        assert!((hardened.rotation.determinant() - 1.0).abs() < 1e-9);

        let literal = PoseSolver {
            enforce_proper_rotation: false,
            ..PoseSolver::new(&camera, &world)
        }
        .solve()
        .unwrap();
        assert!(!literal.reflection_corrected);
        assert!((literal.rotation.determinant() + 1.0).abs() < 1e-9);
        assert!((literal.rotation - mirror).norm() < 1e-9);
    }

    #[test]
    fn three_points_are_not_enough() {
        let camera = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
        ];
        let err = PoseSolver::new(&camera, &camera).solve().unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::DegenerateGeometry(GeometryError::NotEnoughPoints { got: 3, .. })
        ));
    }

    #[test]
    fn coplanar_points_are_refused() {
        let camera = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let err = PoseSolver::new(&camera, &camera).solve().unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::DegenerateGeometry(GeometryError::RankDeficient { .. })
        ));
    }

    #[test]
    fn nearly_coplanar_points_are_refused() {
        let r0 = *Rotation3::from_euler_angles(0.4, 0.1, -0.8).matrix();
        let t0 = Vector3::new(0.5, -2.0, 1.2);
        // a tilted wall, each point off the plane by a fraction of a millimetre
        let camera: Vec<Point3> = [
            (0.0, 0.0, 0.0003),
            (1.0, 0.0, -0.0002),
            (0.0, 1.0, 0.0004),
            (1.0, 1.0, -0.0001),
            (0.3, 0.6, 0.0002),
            (0.8, 0.2, -0.0004),
        ]
        .iter()
        .map(|&(x, y, dz)| Point3::new(x, y, 2.0 + 0.3 * x - 0.1 * y + dz))
        .collect();
        let world = apply(&r0, &t0, &camera);

        let err = PoseSolver::new(&camera, &world).solve().unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::DegenerateGeometry(GeometryError::IllConditioned { .. })
        ));

        // the threshold is what refuses it, the linear system has full rank
        let pose = PoseSolver {
            min_spread_ratio: 0.0,
            ..PoseSolver::new(&camera, &world)
        }
        .solve()
        .unwrap();
        assert_eq!(pose.rank, 12);
    }
}
