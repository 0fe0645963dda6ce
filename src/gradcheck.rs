//! Finite-difference validation of hand-written adjoints.
//!
//! Host side only: these helpers allocate and log, the kernels they check
//! do neither.

use nalgebra::{Matrix3, Matrix6, Quaternion, Vector3};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adjoint::Adjoint;
use crate::spatial::SpatialVector;
use crate::transform::Transform;

#[derive(Debug, Clone, PartialEq)]
pub struct GradCheckParam {
    /// Central difference step.
    pub eps: f64,
    pub rel_tol: f64,
    pub abs_tol: f64,
}

impl Default for GradCheckParam {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            rel_tol: 1e-4,
            abs_tol: 1e-6,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GradCheckError {
    #[error("gradient length mismatch: analytic {analytic}, numeric {numeric}")]
    LengthMismatch { analytic: usize, numeric: usize },

    #[error("gradient mismatch at {index}: analytic {analytic}, numeric {numeric}")]
    Mismatch {
        index: usize,
        analytic: f64,
        numeric: f64,
    },
}

/// Values that can be viewed as a flat list of `f64` components.
pub trait Flat: Sized {
    const LEN: usize;

    fn zeroed() -> Self;

    fn flatten(&self, out: &mut Vec<f64>);

    /// Reads the first `LEN` entries of `xs`.
    fn unflatten(xs: &[f64]) -> Self;

    fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(Self::LEN);
        self.flatten(&mut out);
        out
    }
}

impl Flat for f64 {
    const LEN: usize = 1;

    fn zeroed() -> Self {
        0.
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.push(*self);
    }

    fn unflatten(xs: &[f64]) -> Self {
        xs[0]
    }
}

impl Flat for Vector3<f64> {
    const LEN: usize = 3;

    fn zeroed() -> Self {
        Vector3::zeros()
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.as_slice());
    }

    fn unflatten(xs: &[f64]) -> Self {
        Vector3::from_column_slice(&xs[..3])
    }
}

impl Flat for Quaternion<f64> {
    const LEN: usize = 4;

    fn zeroed() -> Self {
        Quaternion::new(0., 0., 0., 0.)
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.coords.as_slice());
    }

    fn unflatten(xs: &[f64]) -> Self {
        // coords are [x, y, z, w]
        Quaternion::new(xs[3], xs[0], xs[1], xs[2])
    }
}

impl Flat for Matrix3<f64> {
    const LEN: usize = 9;

    fn zeroed() -> Self {
        Matrix3::zeros()
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.as_slice());
    }

    fn unflatten(xs: &[f64]) -> Self {
        Matrix3::from_column_slice(&xs[..9])
    }
}

impl Flat for Matrix6<f64> {
    const LEN: usize = 36;

    fn zeroed() -> Self {
        Matrix6::zeros()
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(self.as_slice());
    }

    fn unflatten(xs: &[f64]) -> Self {
        Matrix6::from_column_slice(&xs[..36])
    }
}

impl Flat for SpatialVector<f64> {
    const LEN: usize = 6;

    fn zeroed() -> Self {
        SpatialVector::zeros()
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.as_array());
    }

    fn unflatten(xs: &[f64]) -> Self {
        SpatialVector::from_array([xs[0], xs[1], xs[2], xs[3], xs[4], xs[5]])
    }
}

impl Flat for Transform<f64> {
    const LEN: usize = 7;

    fn zeroed() -> Self {
        Transform::new(Vector3::zeros(), Quaternion::new(0., 0., 0., 0.))
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        out.extend((0..7).map(|i| self[i]));
    }

    fn unflatten(xs: &[f64]) -> Self {
        let mut t = Self::zeroed();
        for (i, x) in xs[..7].iter().enumerate() {
            t[i] = *x;
        }
        t
    }
}

impl<A: Flat, B: Flat> Flat for (A, B) {
    const LEN: usize = A::LEN + B::LEN;

    fn zeroed() -> Self {
        (A::zeroed(), B::zeroed())
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        self.0.flatten(out);
        self.1.flatten(out);
    }

    fn unflatten(xs: &[f64]) -> Self {
        (A::unflatten(xs), B::unflatten(&xs[A::LEN..]))
    }
}

impl<A: Flat, B: Flat, C: Flat> Flat for (A, B, C) {
    const LEN: usize = A::LEN + B::LEN + C::LEN;

    fn zeroed() -> Self {
        (A::zeroed(), B::zeroed(), C::zeroed())
    }

    fn flatten(&self, out: &mut Vec<f64>) {
        self.0.flatten(out);
        self.1.flatten(out);
        self.2.flatten(out);
    }

    fn unflatten(xs: &[f64]) -> Self {
        (
            A::unflatten(xs),
            B::unflatten(&xs[A::LEN..]),
            C::unflatten(&xs[A::LEN + B::LEN..]),
        )
    }
}

/// Central-difference gradient of a scalar function at `x`.
pub fn finite_difference<F>(mut f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: FnMut(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            probe[i] = x[i] + eps;
            let plus = f(&probe);
            probe[i] = x[i] - eps;
            let minus = f(&probe);
            probe[i] = x[i];
            (plus - minus) / (2. * eps)
        })
        .collect()
}

/// Compares two gradients component-wise against `abs_tol + rel_tol * scale`.
pub fn compare(
    analytic: &[f64],
    numeric: &[f64],
    param: &GradCheckParam,
) -> Result<(), GradCheckError> {
    if analytic.len() != numeric.len() {
        warn!(
            analytic = analytic.len(),
            numeric = numeric.len(),
            "gradient length mismatch"
        );
        return Err(GradCheckError::LengthMismatch {
            analytic: analytic.len(),
            numeric: numeric.len(),
        });
    }
    for (index, (a, n)) in analytic.iter().zip(numeric).enumerate() {
        let scale = a.abs().max(n.abs());
        if (a - n).abs() > param.abs_tol + param.rel_tol * scale {
            warn!(index, analytic = a, numeric = n, "gradient mismatch");
            return Err(GradCheckError::Mismatch {
                index,
                analytic: *a,
                numeric: *n,
            });
        }
    }
    debug!(len = analytic.len(), "gradient check passed");
    Ok(())
}

/// Checks the full Jacobian of `op` at `x`: one backward pass per output
/// component against finite differences of that component.
pub fn check_adjoint<A>(
    op: &A,
    x: &A::Input,
    param: &GradCheckParam,
) -> Result<(), GradCheckError>
where
    A: Adjoint,
    A::Input: Flat,
    A::Output: Flat,
{
    let out_len = <A::Output as Flat>::LEN;
    let x_flat = x.to_vec();
    for k in 0..out_len {
        let mut seed = vec![0.; out_len];
        seed[k] = 1.;
        let adj_output = <A::Output as Flat>::unflatten(&seed);

        let mut adj_input = <A::Input as Flat>::zeroed();
        op.backward(x, &mut adj_input, &adj_output);

        let numeric = finite_difference(
            |xs| op.forward(&<A::Input as Flat>::unflatten(xs)).to_vec()[k],
            &x_flat,
            param.eps,
        );
        compare(&adj_input.to_vec(), &numeric, param)?;
    }
    Ok(())
}
