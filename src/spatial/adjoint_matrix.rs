use crate::math::{Mat3, Real};

use super::SpatialMatrix;

/// Writes the motion-transform operator
///
/// ```text
/// [R  .]
/// [S  R]
/// ```
///
/// into `out`. The upper-right block is not touched.
#[inline]
pub fn spatial_adjoint_into<T: Real>(r: &Mat3<T>, s: &Mat3<T>, out: &mut SpatialMatrix<T>) {
    // diagonal blocks
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(r);
    out.fixed_view_mut::<3, 3>(3, 3).copy_from(r);

    // lower off diagonal
    out.fixed_view_mut::<3, 3>(3, 0).copy_from(s);
}

/// Same as [`spatial_adjoint_into`] on a zeroed matrix.
#[inline]
pub fn spatial_adjoint<T: Real>(r: &Mat3<T>, s: &Mat3<T>) -> SpatialMatrix<T> {
    let mut ad = SpatialMatrix::zeros();
    spatial_adjoint_into(r, s, &mut ad);
    ad
}

#[inline]
pub fn adj_spatial_adjoint<T: Real>(
    _r: &Mat3<T>,
    _s: &Mat3<T>,
    adj_r: &mut Mat3<T>,
    adj_s: &mut Mat3<T>,
    adj_ret: &SpatialMatrix<T>,
) {
    *adj_r += adj_ret.fixed_view::<3, 3>(0, 0);
    *adj_r += adj_ret.fixed_view::<3, 3>(3, 3);

    *adj_s += adj_ret.fixed_view::<3, 3>(3, 0);
}
