//! Rigid body transforms: a translation and a rotation quaternion.
//!
//! Composition and inversion keep a unit quaternion unit. The affine
//! operations (`add`, `sub`, scaling and `lerp`) act on the raw seven
//! components and produce non-unit quaternions; they are kept that way on
//! purpose so gradients flowing through them stay the plain linear ones.

mod atomic;

pub use atomic::{atomic_add, AtomicScalar, AtomicTransform};

use core::ops::{Add, Index, IndexMut, Mul, Sub};

use approx::{AbsDiffEq, RelativeEq};

use crate::math::{
    adj_quat_inverse, adj_quat_mul, adj_quat_rotate, quat_identity, quat_inverse, quat_mul,
    quat_rotate, Quat, Real, Vec3,
};

pub type Transformf = Transform<f32>;
pub type Transformd = Transform<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform<T: Real> {
    pub p: Vec3<T>,
    pub q: Quat<T>,
}

impl<T: Real> Transform<T> {
    #[inline]
    pub fn new(p: Vec3<T>, q: Quat<T>) -> Self {
        Self { p, q }
    }

    #[inline]
    pub fn identity() -> Self {
        transform_identity()
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        transform_inverse(self)
    }

    #[inline]
    pub fn transform_point(&self, x: &Vec3<T>) -> Vec3<T> {
        transform_point(self, x)
    }

    #[inline]
    pub fn transform_vector(&self, x: &Vec3<T>) -> Vec3<T> {
        transform_vector(self, x)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        transform_is_finite(self)
    }
}

impl<T: Real> Default for Transform<T> {
    fn default() -> Self {
        transform_identity()
    }
}

/// Flat view `[p.x, p.y, p.z, q.x, q.y, q.z, q.w]`.
impl<T: Real> Index<usize> for Transform<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        debug_assert!(index < 7, "transform index {index} out of range");
        if index < 3 {
            &self.p[index]
        } else {
            &self.q.coords[index - 3]
        }
    }
}

impl<T: Real> IndexMut<usize> for Transform<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < 7, "transform index {index} out of range");
        if index < 3 {
            &mut self.p[index]
        } else {
            &mut self.q.coords[index - 3]
        }
    }
}

impl<T: Real> Mul for Transform<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        transform_multiply(&self, &rhs)
    }
}

impl<T: Real> Mul<T> for Transform<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        transform_scale(&self, rhs)
    }
}

impl Mul<Transform<f32>> for f32 {
    type Output = Transform<f32>;
    #[inline]
    fn mul(self, rhs: Transform<f32>) -> Transform<f32> {
        transform_scale_left(self, &rhs)
    }
}

impl Mul<Transform<f64>> for f64 {
    type Output = Transform<f64>;
    #[inline]
    fn mul(self, rhs: Transform<f64>) -> Transform<f64> {
        transform_scale_left(self, &rhs)
    }
}

impl<T: Real> Add for Transform<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        transform_add(&self, &rhs)
    }
}

impl<T: Real> Sub for Transform<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        transform_sub(&self, &rhs)
    }
}

impl<T: Real + AbsDiffEq<Epsilon = T>> AbsDiffEq for Transform<T> {
    type Epsilon = T;

    fn default_epsilon() -> T {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.p.abs_diff_eq(&other.p, epsilon)
            && self.q.coords.abs_diff_eq(&other.q.coords, epsilon)
    }
}

impl<T: Real + RelativeEq<Epsilon = T>> RelativeEq for Transform<T> {
    fn default_max_relative() -> T {
        T::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: T, max_relative: T) -> bool {
        self.p.relative_eq(&other.p, epsilon, max_relative)
            && self.q.coords.relative_eq(&other.q.coords, epsilon, max_relative)
    }
}

#[inline]
pub fn transform_identity<T: Real>() -> Transform<T> {
    Transform::new(Vec3::zeros(), quat_identity())
}

#[inline]
pub fn transform_get_translation<T: Real>(t: &Transform<T>) -> Vec3<T> {
    t.p
}

#[inline]
pub fn transform_get_rotation<T: Real>(t: &Transform<T>) -> Quat<T> {
    t.q
}

#[inline]
pub fn transform_is_finite<T: Real>(t: &Transform<T>) -> bool {
    t.p.iter().chain(t.q.coords.iter()).all(|x| x.is_finite())
}

/// `a * b`: apply `b` first, then `a`.
#[inline]
pub fn transform_multiply<T: Real>(a: &Transform<T>, b: &Transform<T>) -> Transform<T> {
    Transform::new(quat_rotate(&a.q, &b.p) + a.p, quat_mul(&a.q, &b.q))
}

#[inline]
pub fn transform_inverse<T: Real>(t: &Transform<T>) -> Transform<T> {
    let q_inv = quat_inverse(&t.q);
    Transform::new(-quat_rotate(&q_inv, &t.p), q_inv)
}

#[inline]
pub fn transform_vector<T: Real>(t: &Transform<T>, x: &Vec3<T>) -> Vec3<T> {
    quat_rotate(&t.q, x)
}

#[inline]
pub fn transform_point<T: Real>(t: &Transform<T>, x: &Vec3<T>) -> Vec3<T> {
    t.p + quat_rotate(&t.q, x)
}

#[inline]
pub fn transform_add<T: Real>(a: &Transform<T>, b: &Transform<T>) -> Transform<T> {
    Transform::new(a.p + b.p, Quat::from(a.q.coords + b.q.coords))
}

#[inline]
pub fn transform_sub<T: Real>(a: &Transform<T>, b: &Transform<T>) -> Transform<T> {
    Transform::new(a.p - b.p, Quat::from(a.q.coords - b.q.coords))
}

/// Scales all seven components; the quaternion ends up unnormalized.
#[inline]
pub fn transform_scale<T: Real>(a: &Transform<T>, s: T) -> Transform<T> {
    Transform::new(a.p * s, Quat::from(a.q.coords * s))
}

/// `s * a`, same components as [`transform_scale`].
#[inline]
pub fn transform_scale_left<T: Real>(s: T, a: &Transform<T>) -> Transform<T> {
    transform_scale(a, s)
}

/// Componentwise blend `a (1 - s) + b s`. Not an SE(3) interpolation.
#[inline]
pub fn transform_lerp<T: Real>(a: &Transform<T>, b: &Transform<T>, s: T) -> Transform<T> {
    transform_scale(a, T::one() - s) + transform_scale(b, s)
}

/// Contraction over all seven components.
#[inline]
pub fn transform_tensordot<T: Real>(a: &Transform<T>, b: &Transform<T>) -> T {
    a.p.dot(&b.p) + a.q.coords.dot(&b.q.coords)
}

#[inline]
pub fn transform_index<T: Real>(t: &Transform<T>, i: usize) -> T {
    t[i]
}

// adjoint methods

#[inline]
pub fn adj_transform<T: Real>(
    _p: &Vec3<T>,
    _q: &Quat<T>,
    adj_p: &mut Vec3<T>,
    adj_q: &mut Quat<T>,
    adj_ret: &Transform<T>,
) {
    *adj_p += adj_ret.p;
    adj_q.coords += adj_ret.q.coords;
}

#[inline]
pub fn adj_transform_get_translation<T: Real>(
    _t: &Transform<T>,
    adj_t: &mut Transform<T>,
    adj_ret: &Vec3<T>,
) {
    adj_t.p += adj_ret;
}

#[inline]
pub fn adj_transform_get_rotation<T: Real>(
    _t: &Transform<T>,
    adj_t: &mut Transform<T>,
    adj_ret: &Quat<T>,
) {
    adj_t.q.coords += adj_ret.coords;
}

#[inline]
pub fn adj_transform_multiply<T: Real>(
    a: &Transform<T>,
    b: &Transform<T>,
    adj_a: &mut Transform<T>,
    adj_b: &mut Transform<T>,
    adj_ret: &Transform<T>,
) {
    // translational part
    adj_quat_rotate(&a.q, &b.p, &mut adj_a.q, &mut adj_b.p, &adj_ret.p);
    adj_a.p += adj_ret.p;

    // rotational part
    adj_quat_mul(&a.q, &b.q, &mut adj_a.q, &mut adj_b.q, &adj_ret.q);
}

#[inline]
pub fn adj_transform_inverse<T: Real>(
    t: &Transform<T>,
    adj_t: &mut Transform<T>,
    adj_ret: &Transform<T>,
) {
    // forward
    let q_inv = quat_inverse(&t.q);
    let p = quat_rotate(&q_inv, &t.p);
    let np = -p;

    // backward
    let mut adj_q_inv = Quat::from_parts(T::zero(), Vec3::zeros());
    let mut adj_np = Vec3::zeros();
    adj_transform(&np, &q_inv, &mut adj_np, &mut adj_q_inv, adj_ret);
    let adj_p = -adj_np;
    adj_quat_rotate(&q_inv, &t.p, &mut adj_q_inv, &mut adj_t.p, &adj_p);
    adj_quat_inverse(&t.q, &mut adj_t.q, &adj_q_inv);
}

#[inline]
pub fn adj_transform_vector<T: Real>(
    t: &Transform<T>,
    x: &Vec3<T>,
    adj_t: &mut Transform<T>,
    adj_x: &mut Vec3<T>,
    adj_ret: &Vec3<T>,
) {
    adj_quat_rotate(&t.q, x, &mut adj_t.q, adj_x, adj_ret);
}

#[inline]
pub fn adj_transform_point<T: Real>(
    t: &Transform<T>,
    x: &Vec3<T>,
    adj_t: &mut Transform<T>,
    adj_x: &mut Vec3<T>,
    adj_ret: &Vec3<T>,
) {
    adj_quat_rotate(&t.q, x, &mut adj_t.q, adj_x, adj_ret);
    adj_t.p += adj_ret;
}

#[inline]
pub fn adj_transform_add<T: Real>(
    _a: &Transform<T>,
    _b: &Transform<T>,
    adj_a: &mut Transform<T>,
    adj_b: &mut Transform<T>,
    adj_ret: &Transform<T>,
) {
    adj_a.p += adj_ret.p;
    adj_b.p += adj_ret.p;
    adj_a.q.coords += adj_ret.q.coords;
    adj_b.q.coords += adj_ret.q.coords;
}

#[inline]
pub fn adj_transform_sub<T: Real>(
    _a: &Transform<T>,
    _b: &Transform<T>,
    adj_a: &mut Transform<T>,
    adj_b: &mut Transform<T>,
    adj_ret: &Transform<T>,
) {
    adj_a.p += adj_ret.p;
    adj_b.p -= adj_ret.p;
    adj_a.q.coords += adj_ret.q.coords;
    adj_b.q.coords -= adj_ret.q.coords;
}

#[inline]
pub fn adj_transform_scale<T: Real>(
    a: &Transform<T>,
    s: T,
    adj_a: &mut Transform<T>,
    adj_s: &mut T,
    adj_ret: &Transform<T>,
) {
    adj_a.p += adj_ret.p * s;
    *adj_s += a.p.dot(&adj_ret.p);
    adj_a.q.coords += adj_ret.q.coords * s;
    *adj_s += a.q.coords.dot(&adj_ret.q.coords);
}

#[inline]
pub fn adj_transform_scale_left<T: Real>(
    s: T,
    a: &Transform<T>,
    adj_s: &mut T,
    adj_a: &mut Transform<T>,
    adj_ret: &Transform<T>,
) {
    adj_transform_scale(a, s, adj_a, adj_s, adj_ret);
}

#[inline]
pub fn adj_transform_lerp<T: Real>(
    a: &Transform<T>,
    b: &Transform<T>,
    s: T,
    adj_a: &mut Transform<T>,
    adj_b: &mut Transform<T>,
    adj_s: &mut T,
    adj_ret: &Transform<T>,
) {
    *adj_a = *adj_a + transform_scale(adj_ret, T::one() - s);
    *adj_b = *adj_b + transform_scale(adj_ret, s);
    *adj_s += transform_tensordot(b, adj_ret) - transform_tensordot(a, adj_ret);
}

#[inline]
pub fn adj_transform_tensordot<T: Real>(
    a: &Transform<T>,
    b: &Transform<T>,
    adj_a: &mut Transform<T>,
    adj_b: &mut Transform<T>,
    adj_ret: T,
) {
    *adj_a = *adj_a + transform_scale(b, adj_ret);
    *adj_b = *adj_b + transform_scale(a, adj_ret);
}

#[inline]
pub fn adj_transform_index<T: Real>(
    _t: &Transform<T>,
    i: usize,
    adj_t: &mut Transform<T>,
    adj_ret: T,
) {
    adj_t[i] += adj_ret;
}
