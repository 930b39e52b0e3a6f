//! Derives the five constraint families and the batch table from a joint
//! hierarchy.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::batches::{build_batches, ConstraintBatch};
use super::hierarchy::JointHierarchy;
use crate::core::constraints::{Constraint, ConstraintType, FamilyMap, Strength};

/// Which families are built, collide and how strong they are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyOptions {
    /// Treat the roots as a closed ring rather than an open strip.
    pub wrap_horizontal: bool,
    /// Pin the last joint of every strand as well as the head.
    pub fix_tails: bool,
    pub enabled: FamilyMap<bool>,
    pub collide: FamilyMap<bool>,
    pub strength: FamilyMap<Strength>,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            wrap_horizontal: false,
            fix_tails: false,
            // Ordered like ConstraintType::ALL.
            enabled: FamilyMap::new([true, true, false, true, true]),
            collide: FamilyMap::new([true, true, true, false, false]),
            strength: FamilyMap::splat(Strength::default()),
        }
    }
}

/// Per-particle facts resolved from the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLayout {
    pub parent: Option<usize>,
    /// Structural child used for bone aiming.
    pub child: Option<usize>,
    pub depth: u32,
    pub fixed: bool,
    /// Direction to the structural child in the joint's local frame.
    pub bone_axis: Vec3,
}

impl Default for PointLayout {
    fn default() -> Self {
        Self {
            parent: None,
            child: None,
            depth: 0,
            fixed: true,
            bone_axis: Vec3::Y,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub layout: Vec<PointLayout>,
    pub max_depth: u32,
    /// Every constraint the hierarchy produces, enabled or not.
    pub families: FamilyMap<Vec<Constraint>>,
    /// Enabled constraints partitioned into endpoint-disjoint batches.
    pub batches: Vec<ConstraintBatch>,
}

impl Topology {
    /// Normalised depth of a particle, `0` at the roots and `1` at the
    /// deepest joint.
    pub fn rate(&self, index: usize) -> f32 {
        if self.max_depth == 0 {
            return 0.0;
        }
        self.layout[index].depth as f32 / self.max_depth as f32
    }

    pub fn point_count(&self) -> usize {
        self.layout.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.batches.iter().map(ConstraintBatch::len).sum()
    }

    /// Re-measures every rest length from `positions`.
    pub fn recompute_lengths(&mut self, positions: &[Vec3]) {
        for kind in ConstraintType::ALL {
            for constraint in &mut self.families[kind] {
                constraint.rebind(|index| positions[index]);
            }
        }
        for batch in &mut self.batches {
            batch.recompute_lengths(positions);
        }
    }
}

/// Builds the constraint topology of `hierarchy`.
///
/// Malformed input never fails: a family that cannot be formed, such as
/// horizontal bending with fewer than three strands, is simply empty.
pub fn build_topology(hierarchy: &JointHierarchy, options: &TopologyOptions) -> Topology {
    let mut layout = vec![PointLayout::default(); hierarchy.len()];
    let mut max_depth = 0;
    let mut visited = vec![false; hierarchy.len()];

    let mut stack: Vec<(usize, Option<usize>, u32)> = Vec::new();
    for &root in hierarchy.roots() {
        stack.push((root, None, 0));
        while let Some((index, parent, depth)) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            max_depth = max_depth.max(depth);

            let node = &hierarchy.nodes()[index];
            let point = &mut layout[index];
            point.parent = parent;
            point.depth = depth;
            point.child = hierarchy.last_child(index);
            point.fixed = depth == 0 || (options.fix_tails && node.children.is_empty());
            if let Some(child) = point.child {
                let local = node.rotation.inverse() * (hierarchy.nodes()[child].position - node.position);
                point.bone_axis = local.try_normalize().unwrap_or(Vec3::Y);
            }

            for &child in node.children.iter().rev() {
                stack.push((child, Some(index), depth + 1));
            }
        }
    }

    let mut builder = FamilyBuilder {
        hierarchy,
        layout: &layout,
        options,
        families: FamilyMap::default(),
    };
    builder.build();
    let families = builder.families;

    let batches = build_batches(
        ConstraintType::SOLVE_ORDER
            .iter()
            .filter(|kind| options.enabled[**kind])
            .flat_map(|kind| families[*kind].iter()),
    );

    let topology = Topology {
        layout,
        max_depth,
        families,
        batches,
    };
    log::debug!(
        "built topology: {} points, {} constraints in {} batches, max depth {}",
        topology.point_count(),
        topology.constraint_count(),
        topology.batches.len(),
        topology.max_depth
    );
    topology
}

struct FamilyBuilder<'a> {
    hierarchy: &'a JointHierarchy,
    layout: &'a [PointLayout],
    options: &'a TopologyOptions,
    families: FamilyMap<Vec<Constraint>>,
}

impl FamilyBuilder<'_> {
    fn build(&mut self) {
        let hierarchy = self.hierarchy;
        let roots = hierarchy.roots();
        let count = roots.len();

        for &root in roots {
            self.structural_vertical(root);
            self.bending_vertical(root);
        }

        for (a, b) in strand_pairs(count, 1, self.options.wrap_horizontal) {
            self.horizontal(ConstraintType::StructuralHorizontal, roots[a], roots[b]);
            self.shear(Some(roots[a]), Some(roots[b]));
        }

        for (a, b) in strand_pairs(count, 2, self.options.wrap_horizontal) {
            self.horizontal(ConstraintType::BendingHorizontal, roots[a], roots[b]);
        }
    }

    fn link(&mut self, kind: ConstraintType, a: usize, b: usize) {
        self.link_into(kind, kind, a, b);
    }

    /// Pushes a `kind` link into the `family` list, taking strength and the
    /// collision flag from the family.
    fn link_into(&mut self, family: ConstraintType, kind: ConstraintType, a: usize, b: usize) {
        let hierarchy = self.hierarchy;
        let nodes = hierarchy.nodes();
        let length = nodes[a].position.distance(nodes[b].position);
        let collision = self.options.collide[family] && !self.layout[a].fixed && !self.layout[b].fixed;
        let constraint = Constraint::new(kind, a, b, length)
            .with_strength(self.options.strength[family])
            .with_collision(collision);
        self.families[family].push(constraint);
    }

    /// One link per hierarchy edge, depth first.
    fn structural_vertical(&mut self, root: usize) {
        let hierarchy = self.hierarchy;
        let mut stack = vec![root];
        let mut seen = vec![false; hierarchy.len()];
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut seen[index], true) {
                continue;
            }
            let children = &hierarchy.nodes()[index].children;
            for &child in children {
                if !seen[child] {
                    self.link(ConstraintType::StructuralVertical, index, child);
                }
            }
            stack.extend(children.iter().rev());
        }
    }

    /// Links a joint to its grandchild wherever the path between them does
    /// not branch.
    fn bending_vertical(&mut self, root: usize) {
        let mut cursor = root;
        for _ in 0..self.hierarchy.len() {
            let Some(child) = self.hierarchy.only_child(cursor) else {
                return;
            };
            if let Some(grandchild) = self.hierarchy.only_child(child) {
                self.link(ConstraintType::BendingVertical, cursor, grandchild);
            }
            cursor = child;
        }
    }

    /// Walks two strands side by side one depth at a time, linking the
    /// structural children. When one strand ends the last link goes to the
    /// other strand's child and the walk stops.
    ///
    /// Only the first depth carries the family tag. Deeper links are tagged
    /// structural but stay in the family list with its strength.
    fn horizontal(&mut self, family: ConstraintType, mut a: usize, mut b: usize) {
        let mut kind = family;
        for _ in 0..self.hierarchy.len() {
            if a == b {
                return;
            }
            match (self.hierarchy.first_child(a), self.hierarchy.first_child(b)) {
                (Some(child_a), None) => return self.link_into(family, kind, child_a, b),
                (None, Some(child_b)) => return self.link_into(family, kind, a, child_b),
                (Some(child_a), Some(child_b)) => {
                    self.link_into(family, kind, child_a, child_b);
                    a = child_a;
                    b = child_b;
                }
                (None, None) => return,
            }
            kind = ConstraintType::StructuralHorizontal;
        }
    }

    /// Crosses every depth of two neighbouring strands with both diagonals.
    fn shear(&mut self, mut a: Option<usize>, mut b: Option<usize>) {
        for _ in 0..self.hierarchy.len() {
            let (Some(point_a), Some(point_b)) = (a, b) else {
                return;
            };
            if point_a == point_b {
                return;
            }
            let child_a = self.hierarchy.first_child(point_a);
            let child_b = self.hierarchy.first_child(point_b);
            if let Some(child_a) = child_a {
                self.link(ConstraintType::Shear, child_a, point_b);
            }
            if let Some(child_b) = child_b {
                self.link(ConstraintType::Shear, point_a, child_b);
            }
            a = child_a;
            b = child_b;
        }
    }
}

/// Index pairs of strands `offset` apart, closed into a ring when `wrap` is
/// set.
fn strand_pairs(count: usize, offset: usize, wrap: bool) -> Vec<(usize, usize)> {
    if count == 0 {
        return Vec::new();
    }
    if wrap {
        (0..count).map(|i| (i, (i + offset) % count)).collect()
    } else {
        (0..count.saturating_sub(offset)).map(|i| (i, i + offset)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_pairs_wrap_around() {
        assert_eq!(strand_pairs(3, 1, false), vec![(0, 1), (1, 2)]);
        assert_eq!(strand_pairs(3, 1, true), vec![(0, 1), (1, 2), (2, 0)]);
        assert!(strand_pairs(2, 2, false).is_empty());
        assert!(strand_pairs(0, 1, true).is_empty());
    }

    #[test]
    fn rate_is_zero_for_flat_hierarchies() {
        let mut hierarchy = JointHierarchy::new();
        hierarchy.add_chain(&[Vec3::ZERO], 1.0);
        let topology = build_topology(&hierarchy, &TopologyOptions::default());
        assert_eq!(topology.max_depth, 0);
        assert_eq!(topology.rate(0), 0.0);
    }
}
