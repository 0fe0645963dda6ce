use nalgebra::DMatrix;

use super::{row_index, Articulation, JointTree};
use crate::math::Real;
use crate::spatial::SpatialVector;

/// Calls `f(row_start, col, dof)` for every motion subspace column that
/// lands in the Jacobian of `articulation`.
///
/// `row_start` is the first of the six rows of the local joint, `col` the
/// local column and `dof` the global index into the motion subspace.
#[inline]
fn for_each_entry<F>(tree: &JointTree, articulation: &Articulation, mut f: F)
where
    F: FnMut(usize, usize, usize),
{
    let articulation_dof_start = articulation.dof_start(tree);
    for i in 0..articulation.joint_count {
        let row_start = i * 6;
        // fill out each row of the Jacobian walking up the tree
        for j in tree.ancestors(articulation.joint_start + i) {
            for dof in tree.dof_range(j) {
                f(row_start, dof - articulation_dof_start, dof);
            }
        }
    }
}

/// Builds the `(joint_count * 6) x dof_count` spatial Jacobian of one
/// articulation into `j`, row-major, starting at `j_start`.
///
/// Row block `i` holds the motion subspace of local joint `i` and all of its
/// ancestors, angular rows first. Entries of non-ancestor joints are not
/// written, so `j` must be zeroed by the caller.
pub fn spatial_jacobian<T: Real>(
    s: &[SpatialVector<T>],
    tree: &JointTree,
    articulation: &Articulation,
    j_start: usize,
    j: &mut [T],
) {
    let stride = articulation.dof_count(tree);
    let j = &mut j[j_start..];
    for_each_entry(tree, articulation, |row_start, col, dof| {
        for (k, x) in s[dof].as_array().into_iter().enumerate() {
            j[row_index(stride, row_start + k, col)] = x;
        }
    });
}

pub fn adj_spatial_jacobian<T: Real>(
    _s: &[SpatialVector<T>],
    tree: &JointTree,
    articulation: &Articulation,
    j_start: usize,
    adj_s: &mut [SpatialVector<T>],
    adj_j: &[T],
) {
    let stride = articulation.dof_count(tree);
    let adj_j = &adj_j[j_start..];
    for_each_entry(tree, articulation, |row_start, col, dof| {
        adj_s[dof] += SpatialVector::from_array(core::array::from_fn(|k| {
            adj_j[row_index(stride, row_start + k, col)]
        }));
    });
}

/// Owned Jacobian of a single articulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian<T: Real> {
    val: DMatrix<T>,
}

impl<T: Real> Jacobian<T> {
    pub fn assemble(
        s: &[SpatialVector<T>],
        tree: &JointTree,
        articulation: &Articulation,
    ) -> Self {
        let rows = articulation.joint_count * 6;
        let cols = articulation.dof_count(tree);
        let mut buf = vec![T::zero(); rows * cols];
        spatial_jacobian(s, tree, articulation, 0, &mut buf);
        Self {
            val: DMatrix::from_row_slice(rows, cols, &buf),
        }
    }

    /// The six rows belonging to local joint `joint`.
    pub fn joint_rows(&self, joint: usize) -> DMatrix<T> {
        self.val.rows(joint * 6, 6).into_owned()
    }

    pub fn column(&self, col: usize) -> DMatrix<T> {
        self.val.columns(col, 1).into_owned()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.val
    }

    pub fn into_inner(self) -> DMatrix<T> {
        self.val
    }
}
