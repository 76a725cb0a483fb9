use crate::num::{Matrix3, Number, Point3, Vector3};

use itertools::Itertools;

/// Shift points so their centroid sits at the origin.
///
/// Solving for the pose of centred points keeps the translation column of the
/// coefficient matrix from dominating when the points are far from the camera.
pub fn center(points: &[Point3]) -> (Vec<Point3>, Vector3) {
    let num_points = points.len().max(1) as Number;

    let centroid = points
        .iter()
        .fold(Vector3::zeros(), |sum, p| sum + p.coords)
        / num_points;

    let centered = points.iter().map(|p| p - centroid).collect_vec();
    (centered, centroid)
}

/// Thickness of a centred point set relative to its extent, the square root of
/// the smallest over the largest eigenvalue of its scatter matrix.
///
/// Zero for coplanar or collinear points, one for an isotropic cloud. Depth
/// noise keeps real clicks on a wall from ever being exactly coplanar, so this
/// is compared against a threshold well above the noise level.
pub fn spread_ratio(centered: &[Point3]) -> Number {
    let scatter = centered
        .iter()
        .fold(Matrix3::zeros(), |sum, p| sum + p.coords * p.coords.transpose());
    let eigenvalues = scatter.symmetric_eigenvalues();

    let largest = eigenvalues.max();
    if !largest.is_finite() || largest <= 0.0 {
        return 0.0;
    }
    (eigenvalues.min().max(0.0) / largest).sqrt()
}
