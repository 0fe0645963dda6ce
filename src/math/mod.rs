//! Scalar trait, `nalgebra` aliases and the adjoints of the small vector
//! operations the spatial kernels are built from.
//!
//! `nalgebra` gives us the forward arithmetic; the reverse halves live here
//! so that every kernel in the crate can route its gradients through them.

mod quat;

pub use quat::{
    adj_quat_inverse, adj_quat_mul, adj_quat_rotate, quat_identity, quat_inverse, quat_mul,
    quat_rotate,
};

use nalgebra as na;

/// Scalar type accepted by every kernel.
pub trait Real: na::RealField + Copy {}

impl<T: na::RealField + Copy> Real for T {}

/// 3D vector alias.
pub type Vec3<T> = na::Vector3<T>;
/// 6D vector alias.
pub type Vec6<T> = na::Vector6<T>;
/// 3x3 matrix alias.
pub type Mat3<T> = na::Matrix3<T>;
/// 6x6 matrix alias.
pub type Mat6<T> = na::Matrix6<T>;
/// Raw (not necessarily unit) quaternion, coordinates stored `[x, y, z, w]`.
pub type Quat<T> = na::Quaternion<T>;

#[inline]
pub(crate) fn two<T: Real>() -> T {
    T::one() + T::one()
}

/// `adj_a += adj_ret * b`, `adj_b += adj_ret * a` for `ret = a · b`.
#[inline]
pub fn adj_dot<T: Real>(
    a: &Vec3<T>,
    b: &Vec3<T>,
    adj_a: &mut Vec3<T>,
    adj_b: &mut Vec3<T>,
    adj_ret: T,
) {
    *adj_a += b * adj_ret;
    *adj_b += a * adj_ret;
}

/// Adjoint of `ret = a × b`.
#[inline]
pub fn adj_cross<T: Real>(
    a: &Vec3<T>,
    b: &Vec3<T>,
    adj_a: &mut Vec3<T>,
    adj_b: &mut Vec3<T>,
    adj_ret: &Vec3<T>,
) {
    // g·(a×b) = a·(b×g) = b·(g×a)
    *adj_a += b.cross(adj_ret);
    *adj_b += adj_ret.cross(a);
}
