//! Host side construction and validation of the flat joint arrays the
//! assembly kernels read.
//!
//! The kernels trust `joint_parents`/`joint_qd_start` blindly. Everything
//! here runs once per model, allocates freely and reports problems through
//! [`TreeError`] instead.

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dynamics::{Articulation, JointTree, NO_PARENT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("joint_qd_start has {got} entries, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("joint_qd_start begins at negative offset {0}")]
    NegativeDofStart(i32),

    #[error("dof range of joint {joint} is decreasing: {start} > {end}")]
    DecreasingDofStart { joint: usize, start: i32, end: i32 },

    #[error("joint {joint} has parent {parent} outside 0..{joint_count}")]
    ParentOutOfRange {
        joint: usize,
        parent: i32,
        joint_count: usize,
    },

    #[error("joint tree contains a cycle through joint {0}")]
    Cycle(usize),

    #[error("articulation {articulation:?} exceeds the {joint_count} joints of the batch")]
    ArticulationOutOfRange {
        articulation: Articulation,
        joint_count: usize,
    },

    #[error("joint {joint} has parent {parent} outside its articulation")]
    ParentOutsideArticulation { joint: usize, parent: usize },
}

fn graph_of(parents: &[i32]) -> DiGraphMap<usize, ()> {
    let mut graph = DiGraphMap::new();
    for joint in 0..parents.len() {
        graph.add_node(joint);
    }
    for (joint, parent) in parents.iter().enumerate() {
        if *parent != NO_PARENT {
            graph.add_edge(*parent as usize, joint, ());
        }
    }
    graph
}

/// Checks that `parents`/`qd_start` describe a forest the assembly kernels
/// can walk: matching lengths, non-decreasing dof starts, in-range parents
/// and no cycles.
pub fn validate_tree(parents: &[i32], qd_start: &[i32]) -> Result<(), TreeError> {
    let joint_count = parents.len();
    let result = check_tree(parents, qd_start);
    match &result {
        Ok(()) => debug!(joint_count, "joint tree validated"),
        Err(e) => warn!(joint_count, error = %e, "invalid joint tree"),
    }
    result
}

fn check_tree(parents: &[i32], qd_start: &[i32]) -> Result<(), TreeError> {
    let joint_count = parents.len();
    if qd_start.len() != joint_count + 1 {
        return Err(TreeError::LengthMismatch {
            expected: joint_count + 1,
            got: qd_start.len(),
        });
    }
    if qd_start[0] < 0 {
        return Err(TreeError::NegativeDofStart(qd_start[0]));
    }
    for (joint, w) in qd_start.windows(2).enumerate() {
        if w[0] > w[1] {
            return Err(TreeError::DecreasingDofStart {
                joint,
                start: w[0],
                end: w[1],
            });
        }
    }
    for (joint, parent) in parents.iter().enumerate() {
        if *parent != NO_PARENT && !(0..joint_count as i32).contains(parent) {
            return Err(TreeError::ParentOutOfRange {
                joint,
                parent: *parent,
                joint_count,
            });
        }
    }
    // self loops count as cycles too
    petgraph::algo::toposort(&graph_of(parents), None)
        .map(|_| ())
        .map_err(|cycle| TreeError::Cycle(cycle.node_id()))
}

/// Checks that every ancestor of a joint in `articulation` lies inside it,
/// so the local column of each visited dof is in range.
pub fn validate_articulation(
    tree: &JointTree,
    articulation: &Articulation,
) -> Result<(), TreeError> {
    if articulation.joint_start + articulation.joint_count > tree.joint_count() {
        return Err(TreeError::ArticulationOutOfRange {
            articulation: *articulation,
            joint_count: tree.joint_count(),
        });
    }
    let joints = articulation.joints();
    for joint in joints.clone() {
        let parent = tree.parents[joint];
        if parent != NO_PARENT && !joints.contains(&(parent as usize)) {
            warn!(joint, parent, "joint escapes its articulation");
            return Err(TreeError::ParentOutsideArticulation {
                joint,
                parent: parent as usize,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointSpec {
    pub parent: Option<usize>,
    pub dof_count: usize,
}

/// Collects joints in order. Every root starts a new articulation and the
/// joints that follow it, up to the next root, belong to that articulation.
#[derive(Debug, Clone, Default)]
pub struct MultiBodyBuilder {
    joints: Vec<JointSpec>,
}

impl MultiBodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a joint and returns its global index.
    pub fn joint(&mut self, parent: Option<usize>, dof_count: usize) -> usize {
        self.joints.push(JointSpec { parent, dof_count });
        self.joints.len() - 1
    }

    pub fn build(self) -> Result<MultiBody, TreeError> {
        MultiBody::from_joints(&self.joints)
    }
}

/// A batch of articulations in the flat layout the kernels consume.
#[derive(Debug, Clone)]
pub struct MultiBody {
    // joint index graph, parent -> child
    graph: DiGraphMap<usize, ()>,
    joint_parents: Vec<i32>,
    joint_qd_start: Vec<i32>,
    articulations: Vec<Articulation>,
}

impl MultiBody {
    pub fn from_joints(joints: &[JointSpec]) -> Result<MultiBody, TreeError> {
        let mut joint_parents = Vec::with_capacity(joints.len());
        let mut joint_qd_start = Vec::with_capacity(joints.len() + 1);
        let mut articulations: Vec<Articulation> = vec![];
        let mut dof = 0;

        for (index, spec) in joints.iter().enumerate() {
            match spec.parent {
                None => articulations.push(Articulation::new(index, 0)),
                Some(parent) => {
                    let current = articulations.last().map(|a| a.joint_start);
                    if !matches!(current, Some(start) if start <= parent && parent < index) {
                        warn!(joint = index, parent, "parent must precede its child");
                        return Err(TreeError::ParentOutsideArticulation {
                            joint: index,
                            parent,
                        });
                    }
                }
            }
            if let Some(articulation) = articulations.last_mut() {
                articulation.joint_count += 1;
            }
            joint_parents.push(spec.parent.map_or(NO_PARENT, |p| p as i32));
            joint_qd_start.push(dof as i32);
            dof += spec.dof_count;
        }
        joint_qd_start.push(dof as i32);

        validate_tree(&joint_parents, &joint_qd_start)?;
        debug!(
            joints = joints.len(),
            dofs = dof,
            articulations = articulations.len(),
            "built multi body"
        );
        Ok(MultiBody {
            graph: graph_of(&joint_parents),
            joint_parents,
            joint_qd_start,
            articulations,
        })
    }

    pub fn tree(&self) -> JointTree<'_> {
        JointTree::new(&self.joint_parents, &self.joint_qd_start)
    }

    pub fn joint_parents(&self) -> &[i32] {
        &self.joint_parents
    }

    pub fn joint_qd_start(&self) -> &[i32] {
        &self.joint_qd_start
    }

    pub fn articulations(&self) -> &[Articulation] {
        &self.articulations
    }

    pub fn joint_count(&self) -> usize {
        self.joint_parents.len()
    }

    pub fn dof_count(&self) -> usize {
        self.joint_qd_start.last().map_or(0, |d| *d as usize)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.graph
            .neighbors_directed(index, petgraph::Direction::Incoming)
            .next()
    }

    pub fn children(&self, index: usize) -> Vec<usize> {
        let mut children: Vec<_> = self
            .graph
            .neighbors_directed(index, petgraph::Direction::Outgoing)
            .collect();
        children.sort_unstable();
        children
    }

    /// Joints reachable from `start`, breadth first.
    pub fn bfs(&self, start: usize) -> Vec<usize> {
        let bfs = Bfs::new(&self.graph, start);
        let iter = BfsIter {
            graph: &self.graph,
            bfs,
        };
        iter.collect()
    }

    /// Offsets of each articulation's Jacobian in one packed buffer,
    /// followed by the total length.
    pub fn jacobian_starts(&self) -> Vec<usize> {
        let tree = self.tree();
        packed_starts(
            self.articulations
                .iter()
                .map(|a| a.joint_count * 6 * a.dof_count(&tree)),
        )
    }

    /// Offsets of each articulation's mass matrix in one packed buffer,
    /// followed by the total length.
    pub fn mass_starts(&self) -> Vec<usize> {
        packed_starts(self.articulations.iter().map(|a| (a.joint_count * 6).pow(2)))
    }
}

fn packed_starts(sizes: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut starts = vec![0];
    let mut total = 0;
    for size in sizes {
        total += size;
        starts.push(total);
    }
    starts
}

struct BfsIter<'a> {
    graph: &'a DiGraphMap<usize, ()>,
    bfs: Bfs<usize, HashSet<usize>>,
}

impl<'a> Iterator for BfsIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.bfs.next(self.graph)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{spatial_jacobian, spatial_mass, Jacobian, MassMatrix};
    use crate::spatial::SpatialVector;
    use nalgebra::Matrix6;

    fn two_arms() -> MultiBody {
        let mut builder = MultiBodyBuilder::new();
        // arm 0: a chain of three hinges
        let a0 = builder.joint(None, 1);
        let a1 = builder.joint(Some(a0), 1);
        builder.joint(Some(a1), 1);
        // arm 1: a free base with two branches
        let b0 = builder.joint(None, 6);
        builder.joint(Some(b0), 1);
        builder.joint(Some(b0), 3);
        builder.build().unwrap()
    }

    #[test]
    fn test_build_layout() {
        let mb = two_arms();
        assert_eq!(mb.joint_parents(), &[-1, 0, 1, -1, 3, 3]);
        assert_eq!(mb.joint_qd_start(), &[0, 1, 2, 3, 9, 10, 13]);
        assert_eq!(
            mb.articulations(),
            &[Articulation::new(0, 3), Articulation::new(3, 3)]
        );
        assert_eq!(mb.joint_count(), 6);
        assert_eq!(mb.dof_count(), 13);
        assert_eq!(mb.parent(4), Some(3));
        assert_eq!(mb.parent(3), None);
        assert_eq!(mb.children(3), vec![4, 5]);
        assert_eq!(mb.bfs(3).len(), 3);
        assert_eq!(mb.bfs(0), vec![0, 1, 2]);
        for art in mb.articulations() {
            validate_articulation(&mb.tree(), art).unwrap();
        }
    }

    #[test]
    fn test_builder_rejects_parent_from_other_articulation() {
        let mut builder = MultiBodyBuilder::new();
        let a = builder.joint(None, 1);
        builder.joint(None, 1);
        builder.joint(Some(a), 1);
        assert_eq!(
            builder.build().unwrap_err(),
            TreeError::ParentOutsideArticulation { joint: 2, parent: 0 }
        );

        let mut builder = MultiBodyBuilder::new();
        builder.joint(Some(0), 1);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_validate_tree_errors() {
        assert_eq!(validate_tree(&[-1, 0], &[0, 1, 2]), Ok(()));
        assert_eq!(
            validate_tree(&[-1, 0], &[0, 1]),
            Err(TreeError::LengthMismatch {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            validate_tree(&[-1, 0], &[0, 2, 1]),
            Err(TreeError::DecreasingDofStart {
                joint: 1,
                start: 2,
                end: 1
            })
        );
        assert_eq!(
            validate_tree(&[-1], &[-1, 0]),
            Err(TreeError::NegativeDofStart(-1))
        );
        assert_eq!(
            validate_tree(&[-1, 5], &[0, 1, 2]),
            Err(TreeError::ParentOutOfRange {
                joint: 1,
                parent: 5,
                joint_count: 2
            })
        );
        assert!(matches!(
            validate_tree(&[-1, 2, 1], &[0, 1, 2, 3]),
            Err(TreeError::Cycle(1 | 2))
        ));
        assert_eq!(validate_tree(&[0], &[0, 1]), Err(TreeError::Cycle(0)));
    }

    #[test]
    fn test_validate_articulation() {
        let parents = [-1, 0, 0];
        let qd_start = [0, 1, 2, 3];
        let tree = JointTree::new(&parents, &qd_start);
        assert_eq!(validate_articulation(&tree, &Articulation::new(0, 3)), Ok(()));
        assert_eq!(
            validate_articulation(&tree, &Articulation::new(1, 2)),
            Err(TreeError::ParentOutsideArticulation { joint: 1, parent: 0 })
        );
        assert!(matches!(
            validate_articulation(&tree, &Articulation::new(2, 2)),
            Err(TreeError::ArticulationOutOfRange { .. })
        ));
    }

    #[test]
    fn test_packed_batch_assembly() {
        let mb = two_arms();
        let tree = mb.tree();
        let s: Vec<_> = (0..mb.dof_count())
            .map(|d| SpatialVector::from_array([d as f64 + 1.; 6]))
            .collect();
        let i_s: Vec<_> = (0..mb.joint_count())
            .map(|j| Matrix6::from_element(j as f64))
            .collect();

        let j_starts = mb.jacobian_starts();
        let m_starts = mb.mass_starts();
        assert_eq!(j_starts, vec![0, 18 * 3, 18 * 3 + 18 * 10]);
        assert_eq!(m_starts, vec![0, 324, 648]);

        let mut j = vec![0.; *j_starts.last().unwrap()];
        let mut m = vec![0.; *m_starts.last().unwrap()];
        for (k, art) in mb.articulations().iter().enumerate() {
            spatial_jacobian(&s, &tree, art, j_starts[k], &mut j);
            spatial_mass(&i_s, art, m_starts[k], &mut m);
        }

        for (k, art) in mb.articulations().iter().enumerate() {
            let packed_j = &j[j_starts[k]..j_starts[k + 1]];
            let own_j = Jacobian::assemble(&s, &tree, art);
            let (rows, cols) = own_j.as_matrix().shape();
            for r in 0..rows {
                for c in 0..cols {
                    assert_eq!(packed_j[r * cols + c], own_j.as_matrix()[(r, c)]);
                }
            }
            let packed_m = &m[m_starts[k]..m_starts[k + 1]];
            let own_m = MassMatrix::assemble(&i_s, art);
            let n = own_m.as_matrix().nrows();
            for r in 0..n {
                for c in 0..n {
                    assert_eq!(packed_m[r * n + c], own_m.as_matrix()[(r, c)]);
                }
            }
        }
    }
}
