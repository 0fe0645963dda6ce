mod jacobian;
mod mass;

use core::ops::Range;

pub use self::jacobian::{adj_spatial_jacobian, spatial_jacobian, Jacobian};
pub use self::mass::{adj_spatial_mass, spatial_mass, MassMatrix};

/// Parent of a root joint.
pub const NO_PARENT: i32 = -1;

/// Borrowed view over the flat joint index arrays of a batch.
///
/// `parents[j]` is the global index of joint `j`'s parent or [`NO_PARENT`].
/// `qd_start` has one entry per joint plus a trailing end marker; joint `j`
/// owns the generalized velocities `qd_start[j]..qd_start[j + 1]`.
#[derive(Debug, Clone, Copy)]
pub struct JointTree<'a> {
    pub parents: &'a [i32],
    pub qd_start: &'a [i32],
}

impl<'a> JointTree<'a> {
    pub fn new(parents: &'a [i32], qd_start: &'a [i32]) -> Self {
        debug_assert_eq!(parents.len() + 1, qd_start.len());
        Self { parents, qd_start }
    }

    pub fn joint_count(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    pub fn dof_start(&self, joint: usize) -> usize {
        self.qd_start[joint] as usize
    }

    #[inline]
    pub fn dof_range(&self, joint: usize) -> Range<usize> {
        self.dof_start(joint)..self.dof_start(joint + 1)
    }

    /// `joint` followed by its parent, grandparent, ... up to the root.
    ///
    /// The tree must be acyclic; this is only checked in debug builds.
    #[inline]
    pub fn ancestors(&self, joint: usize) -> Ancestors<'a> {
        Ancestors {
            parents: self.parents,
            next: joint as i32,
            budget: self.parents.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    parents: &'a [i32],
    next: i32,
    budget: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.next == NO_PARENT {
            return None;
        }
        debug_assert!(self.budget > 0, "joint tree contains a cycle");
        self.budget = self.budget.wrapping_sub(1);
        let joint = self.next as usize;
        self.next = self.parents[joint];
        Some(joint)
    }
}

/// Contiguous joint range of one mechanism inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Articulation {
    pub joint_start: usize,
    pub joint_count: usize,
}

impl Articulation {
    pub fn new(joint_start: usize, joint_count: usize) -> Self {
        Self {
            joint_start,
            joint_count,
        }
    }

    pub fn joints(&self) -> Range<usize> {
        self.joint_start..self.joint_start + self.joint_count
    }

    /// Global index of the first generalized velocity of the articulation.
    #[inline]
    pub fn dof_start(&self, tree: &JointTree) -> usize {
        tree.dof_start(self.joint_start)
    }

    #[inline]
    pub fn dof_count(&self, tree: &JointTree) -> usize {
        tree.dof_start(self.joint_start + self.joint_count) - self.dof_start(tree)
    }
}

#[inline]
pub(crate) fn row_index(stride: usize, i: usize, j: usize) -> usize {
    i * stride + j
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ancestors_walk_to_root() {
        let parents = [-1, 0, 1, 0];
        let qd_start = [0, 1, 2, 3, 4];
        let tree = JointTree::new(&parents, &qd_start);
        assert_eq!(tree.ancestors(2).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(tree.ancestors(3).collect::<Vec<_>>(), vec![3, 0]);
        assert_eq!(tree.ancestors(0).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cycle")]
    fn test_ancestors_cycle_asserts() {
        let parents = [1, 0];
        let qd_start = [0, 1, 2];
        let tree = JointTree::new(&parents, &qd_start);
        let _ = tree.ancestors(0).count();
    }

    #[test]
    fn test_articulation_dofs() {
        let parents = [-1, -1, 1, 1];
        let qd_start = [0, 1, 3, 4, 7];
        let tree = JointTree::new(&parents, &qd_start);
        let art = Articulation::new(1, 3);
        assert_eq!(art.dof_start(&tree), 1);
        assert_eq!(art.dof_count(&tree), 6);
        assert_eq!(art.joints(), 1..4);
        assert_eq!(tree.dof_range(3), 4..7);
        assert_eq!(tree.joint_count(), 4);
    }
}
