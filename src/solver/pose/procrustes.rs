use crate::error::{GeometryError, Result};
use crate::num::Matrix3;

use log::warn;
use nalgebra::SVD;

/// Closest orthogonal matrix to `m` in the Frobenius sense: `U * V^T` from `m = U S V^T`.
///
/// With `enforce_proper` set, a reflection (`det < 0`) is turned into a rotation
/// by negating the column of `U` paired with the smallest singular value. The
/// returned flag tells whether that happened.
pub fn nearest_rotation(
    m: &Matrix3,
    enforce_proper: bool,
    eps: f64,
    max_iter: usize,
) -> Result<(Matrix3, bool)> {
    let svd = SVD::try_new(*m, true, true, eps, max_iter)
        .ok_or(GeometryError::SvdFailed("rotation block did not converge"))?;

    let mut matrix_u = svd.u.ok_or(GeometryError::SvdFailed("U was not computed"))?;
    let matrix_v_t = svd
        .v_t
        .ok_or(GeometryError::SvdFailed("V^T was not computed"))?;

    let rotation = matrix_u * matrix_v_t;
    if !enforce_proper || rotation.determinant() >= 0.0 {
        return Ok((rotation, false));
    }

    // singular values are sorted, the last column pairs with the smallest one
    warn!(
        "linear map is reflective (singular values {:?}), flipping the weakest axis",
        svd.singular_values.as_slice()
    );
    matrix_u.column_mut(2).neg_mut();
    Ok((matrix_u * matrix_v_t, true))
}
