//! 6D spatial vectors in Featherstone order: `[angular; linear]`.
//!
//! A motion vector (twist) is `[ω; v]`, a force vector (wrench) is `[τ; f]`.
//! The two halves are stored as separate fields; `top`/`bottom` hand out
//! borrows of those fields, so writing through them updates the vector.

mod adjoint_matrix;

pub use adjoint_matrix::{adj_spatial_adjoint, spatial_adjoint, spatial_adjoint_into};

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};

use crate::math::{adj_cross, Mat6, Real, Vec3, Vec6};

/// 6x6 spatial matrix (inertia, motion transforms).
pub type SpatialMatrix<T> = Mat6<T>;
pub type SpatialMatrixf = SpatialMatrix<f32>;
pub type SpatialMatrixd = SpatialMatrix<f64>;

pub type SpatialVectorf = SpatialVector<f32>;
pub type SpatialVectord = SpatialVector<f64>;

/// Twist or wrench.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialVector<T: Real> {
    /// Angular part.
    pub w: Vec3<T>,
    /// Linear part.
    pub v: Vec3<T>,
}

impl<T: Real> SpatialVector<T> {
    #[inline]
    pub fn new(w: Vec3<T>, v: Vec3<T>) -> Self {
        Self { w, v }
    }

    #[inline]
    pub fn zeros() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }

    /// From `[w0, w1, w2, v0, v1, v2]`.
    #[inline]
    pub fn from_array(a: [T; 6]) -> Self {
        Self::new(Vec3::new(a[0], a[1], a[2]), Vec3::new(a[3], a[4], a[5]))
    }

    #[inline]
    pub fn as_array(&self) -> [T; 6] {
        [self.w.x, self.w.y, self.w.z, self.v.x, self.v.y, self.v.z]
    }

    #[inline]
    pub fn from_vector6(x: &Vec6<T>) -> Self {
        Self::new(Vec3::new(x[0], x[1], x[2]), Vec3::new(x[3], x[4], x[5]))
    }

    #[inline]
    pub fn to_vector6(&self) -> Vec6<T> {
        Vec6::from_row_slice(&self.as_array())
    }

    #[inline]
    pub fn top(&self) -> &Vec3<T> {
        &self.w
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut Vec3<T> {
        &mut self.w
    }

    #[inline]
    pub fn bottom(&self) -> &Vec3<T> {
        &self.v
    }

    #[inline]
    pub fn bottom_mut(&mut self) -> &mut Vec3<T> {
        &mut self.v
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> T {
        spatial_dot(self, other)
    }

    /// Motion cross product `self ×ₘ other`.
    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        spatial_cross(self, other)
    }

    /// Force cross product `self ×f other`.
    #[inline]
    pub fn cross_dual(&self, other: &Self) -> Self {
        spatial_cross_dual(self, other)
    }
}

impl<T: Real> Default for SpatialVector<T> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Real> Add for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.w + rhs.w, self.v + rhs.v)
    }
}

impl<T: Real> Sub for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.w - rhs.w, self.v - rhs.v)
    }
}

impl<T: Real> Mul<T> for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Self::new(self.w * rhs, self.v * rhs)
    }
}

impl<T: Real> Neg for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.w, -self.v)
    }
}

impl<T: Real> AddAssign for SpatialVector<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.w += rhs.w;
        self.v += rhs.v;
    }
}

impl<T: Real> SubAssign for SpatialVector<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.w -= rhs.w;
        self.v -= rhs.v;
    }
}

impl<T: Real + AbsDiffEq<Epsilon = T>> AbsDiffEq for SpatialVector<T> {
    type Epsilon = T;

    fn default_epsilon() -> T {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.w.abs_diff_eq(&other.w, epsilon) && self.v.abs_diff_eq(&other.v, epsilon)
    }
}

impl<T: Real + RelativeEq<Epsilon = T>> RelativeEq for SpatialVector<T> {
    fn default_max_relative() -> T {
        T::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: T, max_relative: T) -> bool {
        self.w.relative_eq(&other.w, epsilon, max_relative)
            && self.v.relative_eq(&other.v, epsilon, max_relative)
    }
}

#[inline]
pub fn spatial_dot<T: Real>(a: &SpatialVector<T>, b: &SpatialVector<T>) -> T {
    a.w.dot(&b.w) + a.v.dot(&b.v)
}

#[inline]
pub fn spatial_cross<T: Real>(a: &SpatialVector<T>, b: &SpatialVector<T>) -> SpatialVector<T> {
    let w = a.w.cross(&b.w);
    let v = a.v.cross(&b.w) + a.w.cross(&b.v);
    SpatialVector::new(w, v)
}

#[inline]
pub fn spatial_cross_dual<T: Real>(
    a: &SpatialVector<T>,
    b: &SpatialVector<T>,
) -> SpatialVector<T> {
    let w = a.w.cross(&b.w) + a.v.cross(&b.v);
    let v = a.w.cross(&b.v);
    SpatialVector::new(w, v)
}

#[inline]
pub fn spatial_top<T: Real>(a: &SpatialVector<T>) -> Vec3<T> {
    a.w
}

#[inline]
pub fn spatial_bottom<T: Real>(a: &SpatialVector<T>) -> Vec3<T> {
    a.v
}

#[inline]
pub fn adj_spatial_dot<T: Real>(
    a: &SpatialVector<T>,
    b: &SpatialVector<T>,
    adj_a: &mut SpatialVector<T>,
    adj_b: &mut SpatialVector<T>,
    adj_ret: T,
) {
    *adj_a += *b * adj_ret;
    *adj_b += *a * adj_ret;
}

#[inline]
pub fn adj_spatial_cross<T: Real>(
    a: &SpatialVector<T>,
    b: &SpatialVector<T>,
    adj_a: &mut SpatialVector<T>,
    adj_b: &mut SpatialVector<T>,
    adj_ret: &SpatialVector<T>,
) {
    adj_cross(&a.w, &b.w, &mut adj_a.w, &mut adj_b.w, &adj_ret.w);

    adj_cross(&a.v, &b.w, &mut adj_a.v, &mut adj_b.w, &adj_ret.v);
    adj_cross(&a.w, &b.v, &mut adj_a.w, &mut adj_b.v, &adj_ret.v);
}

#[inline]
pub fn adj_spatial_cross_dual<T: Real>(
    a: &SpatialVector<T>,
    b: &SpatialVector<T>,
    adj_a: &mut SpatialVector<T>,
    adj_b: &mut SpatialVector<T>,
    adj_ret: &SpatialVector<T>,
) {
    adj_cross(&a.w, &b.w, &mut adj_a.w, &mut adj_b.w, &adj_ret.w);
    adj_cross(&a.v, &b.v, &mut adj_a.v, &mut adj_b.v, &adj_ret.w);

    adj_cross(&a.w, &b.v, &mut adj_a.w, &mut adj_b.v, &adj_ret.v);
}

#[inline]
pub fn adj_spatial_top<T: Real>(
    _a: &SpatialVector<T>,
    adj_a: &mut SpatialVector<T>,
    adj_ret: &Vec3<T>,
) {
    *adj_a.top_mut() += adj_ret;
}

#[inline]
pub fn adj_spatial_bottom<T: Real>(
    _a: &SpatialVector<T>,
    adj_a: &mut SpatialVector<T>,
    adj_ret: &Vec3<T>,
) {
    *adj_a.bottom_mut() += adj_ret;
}
