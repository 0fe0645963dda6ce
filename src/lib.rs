//! # spady is a library of spatial algebra kernels for multi-body kinematics.
//! spady = spatial + adjoint + dynamics
//!
//! Every forward kernel is paired with an `adj_*` function that accumulates
//! reverse-mode gradients into caller supplied buffers.

// #![cfg_attr(not(test), no_std)]
// #![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod adjoint;
pub mod dynamics;
pub mod gradcheck;
pub mod math;
pub mod multi_body;
pub mod spatial;
pub mod transform;

pub use adjoint::{op, Adjoint, Op};
pub use dynamics::{
    adj_spatial_jacobian, adj_spatial_mass, spatial_jacobian, spatial_mass, Ancestors,
    Articulation, Jacobian, JointTree, MassMatrix, NO_PARENT,
};
pub use gradcheck::{GradCheckError, GradCheckParam};
pub use math::Real;
pub use multi_body::{
    validate_articulation, validate_tree, JointSpec, MultiBody, MultiBodyBuilder, TreeError,
};
pub use spatial::{
    adj_spatial_adjoint, spatial_adjoint, spatial_adjoint_into, SpatialMatrix, SpatialMatrixd,
    SpatialMatrixf, SpatialVector, SpatialVectord, SpatialVectorf,
};
pub use transform::{AtomicScalar, AtomicTransform, Transform, Transformd, Transformf};
