use log::debug;

use super::Intrinsics;
use crate::error::{ConfigError, Result};
use crate::num::{Matrix3, Number, Point2, Point3};

/// Turns a pixel and a raw depth sample into a point in the optical frame
/// (x right, y down, z forward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackProjector {
    camera_matrix: Matrix3,
    camera_matrix_inv: Matrix3,
    /// raw depth units per world unit, e.g. 1000 for millimetres to metres
    depth_scale: Number,
}

impl BackProjector {
    /// Reuses the inverse camera matrix cached by `intrinsics`.
    pub fn new(intrinsics: &Intrinsics, depth_scale: Number) -> Result<Self> {
        if !depth_scale.is_finite() || depth_scale <= 0.0 {
            return Err(ConfigError::InvalidDepthScale(depth_scale).into());
        }

        Ok(Self {
            camera_matrix: *intrinsics.camera_matrix(),
            camera_matrix_inv: *intrinsics.camera_matrix_inv(),
            depth_scale,
        })
    }

    #[inline]
    pub fn depth_scale(&self) -> Number {
        self.depth_scale
    }

    /// `K^-1 * [u, v, 1]^T * (depth / depth_scale)`
    ///
    /// The caller guarantees a non-zero depth.
    pub fn back_project(&self, pixel: &Point2, depth: Number) -> Point3 {
        let ray = self.camera_matrix_inv * pixel.to_homogeneous();
        let point = Point3::from(ray * (depth / self.depth_scale));
        debug!(
            "back-projected ({}, {}) @ {} -> {:?}",
            pixel.x, pixel.y, depth, point
        );
        point
    }

    /// Inverse of [`Self::back_project`]: the pixel and raw depth that observe `point`.
    pub fn project(&self, point: &Point3) -> (Point2, Number) {
        let uvw = self.camera_matrix * point.coords;
        let pixel = Point2::new(uvw.x / uvw.z, uvw.y / uvw.z);
        (pixel, point.z * self.depth_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibrationError;

    fn projector() -> BackProjector {
        let intrinsics = Intrinsics::from_focal(575.8, 575.8, 314.5, 235.5, 640, 480).unwrap();
        BackProjector::new(&intrinsics, 1000.0).unwrap()
    }

    #[test]
    fn principal_point_lies_on_optical_axis() {
        let point = projector().back_project(&Point2::new(314.5, 235.5), 1500.0);
        assert!((point - Point3::new(0.0, 0.0, 1.5)).norm() < 1e-12);
    }

    #[test]
    fn round_trip_reproduces_point() {
        let projector = projector();
        let points = [
            Point3::new(0.3, -0.2, 1.1),
            Point3::new(-0.45, 0.31, 2.7),
            Point3::new(0.01, 0.02, 0.6),
        ];
        for point in points.iter() {
            let (pixel, depth) = projector.project(point);
            let restored = projector.back_project(&pixel, depth);
            assert!(
                (restored - point).norm() < 1e-9,
                "{:?} came back as {:?}",
                point,
                restored
            );
        }
    }

    #[test]
    fn depth_scale_converts_units() {
        let intrinsics = Intrinsics::from_focal(500.0, 500.0, 320.0, 240.0, 640, 480).unwrap();
        let metres = BackProjector::new(&intrinsics, 1.0).unwrap();
        let millimetres = BackProjector::new(&intrinsics, 1000.0).unwrap();

        let pixel = Point2::new(100.0, 50.0);
        let a = metres.back_project(&pixel, 2.0);
        let b = millimetres.back_project(&pixel, 2000.0);
        assert!((a - b).norm() < 1e-12);
    }

    #[test]
    fn rays_use_the_intrinsics_inverse() {
        let intrinsics = Intrinsics::from_focal(575.8, 570.1, 314.5, 235.5, 640, 480).unwrap();
        let projector = BackProjector::new(&intrinsics, 1000.0).unwrap();

        let pixel = Point2::new(17.0, 402.0);
        let expected = intrinsics.camera_matrix_inv() * pixel.to_homogeneous() * 2.0;
        let point = projector.back_project(&pixel, 2000.0);
        assert_eq!(point.coords, expected);
    }

    #[test]
    fn rejects_bad_depth_scale() {
        let intrinsics = Intrinsics::from_focal(500.0, 500.0, 320.0, 240.0, 640, 480).unwrap();
        for scale in [0.0, -1.0, Number::NAN, Number::INFINITY].iter() {
            let err = BackProjector::new(&intrinsics, *scale).unwrap_err();
            assert!(matches!(
                err,
                CalibrationError::Configuration(ConfigError::InvalidDepthScale(_))
            ));
        }
    }

    #[test]
    fn projects_principal_axis_to_principal_point() {
        let (pixel, depth) = projector().project(&Point3::new(0.0, 0.0, 2.5));
        assert!((pixel - Point2::new(314.5, 235.5)).norm() < 1e-12);
        assert!((depth - 2500.0).abs() < 1e-9);
    }
}
