use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, Result};

/// One joint of the dangling hierarchy, in world space at bind time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointNode {
    pub position: Vec3,
    pub rotation: Quat,
    /// World rotation of the bone this joint hangs from.
    pub anchor_rotation: Quat,
    pub mass: f32,
    /// Child joints in scene order; the first one is the structural child.
    pub children: Vec<usize>,
}

impl JointNode {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            anchor_rotation: Quat::IDENTITY,
            mass: 1.0,
            children: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Quat, anchor_rotation: Quat) -> Self {
        self.rotation = rotation;
        self.anchor_rotation = anchor_rotation;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }
}

/// Arena of joints plus the ordered list of strand roots.
///
/// A node's index in the arena is also the index of its particle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JointHierarchy {
    nodes: Vec<JointNode>,
    roots: Vec<usize>,
}

impl JointHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: JointNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends `child` to the children of `parent`.
    pub fn attach(&mut self, parent: usize, child: usize) -> Result<()> {
        let count = self.nodes.len();
        for (index, target) in [(parent, child), (child, parent)] {
            if target >= count {
                return Err(DynamicsError::InvalidLink {
                    index,
                    target,
                    count,
                });
            }
        }
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Registers `index` as the head of the next strand.
    pub fn add_root(&mut self, index: usize) -> Result<()> {
        if index >= self.nodes.len() {
            return Err(DynamicsError::InvalidRoot {
                index,
                count: self.nodes.len(),
            });
        }
        self.roots.push(index);
        Ok(())
    }

    /// Adds a straight strand through `positions`, registers its head as a
    /// root and returns the head index.
    pub fn add_chain(&mut self, positions: &[Vec3], mass: f32) -> Option<usize> {
        let mut previous: Option<usize> = None;
        let mut head = None;
        for &position in positions {
            let index = self.add_node(JointNode::new(position).with_mass(mass));
            match previous {
                Some(parent) => self.nodes[parent].children.push(index),
                None => head = Some(index),
            }
            previous = Some(index);
        }
        if let Some(head) = head {
            self.roots.push(head);
        }
        head
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[JointNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&JointNode> {
        self.nodes.get(index)
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn first_child(&self, index: usize) -> Option<usize> {
        self.nodes.get(index)?.children.first().copied()
    }

    /// The child a joint's bone aims at when it branches.
    pub fn last_child(&self, index: usize) -> Option<usize> {
        self.nodes.get(index)?.children.last().copied()
    }

    /// The child of `index` when it has exactly one.
    pub fn only_child(&self, index: usize) -> Option<usize> {
        match self.nodes.get(index)?.children.as_slice() {
            [child] => Some(*child),
            _ => None,
        }
    }
}
