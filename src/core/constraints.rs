use std::ops::{Index, IndexMut};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The five constraint families derived from a particle hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Parent to structural child along one chain.
    StructuralVertical,
    /// Same depth across two adjacent chains.
    StructuralHorizontal,
    /// Diagonal across two adjacent chains.
    Shear,
    /// Point to grandchild along one chain.
    BendingVertical,
    /// Same depth across chains two apart.
    BendingHorizontal,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 5] = [
        ConstraintType::StructuralVertical,
        ConstraintType::StructuralHorizontal,
        ConstraintType::Shear,
        ConstraintType::BendingVertical,
        ConstraintType::BendingHorizontal,
    ];

    /// Order in which families are inserted into the batch table.
    pub const SOLVE_ORDER: [ConstraintType; 5] = [
        ConstraintType::BendingHorizontal,
        ConstraintType::StructuralHorizontal,
        ConstraintType::Shear,
        ConstraintType::BendingVertical,
        ConstraintType::StructuralVertical,
    ];

    pub fn index(self) -> usize {
        match self {
            ConstraintType::StructuralVertical => 0,
            ConstraintType::StructuralHorizontal => 1,
            ConstraintType::Shear => 2,
            ConstraintType::BendingVertical => 3,
            ConstraintType::BendingHorizontal => 4,
        }
    }
}

/// One value per constraint family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyMap<T> {
    values: [T; 5],
}

impl<T: Copy> FamilyMap<T> {
    pub fn splat(value: T) -> Self {
        Self { values: [value; 5] }
    }
}

impl<T> FamilyMap<T> {
    /// Values ordered like [`ConstraintType::ALL`].
    pub fn new(values: [T; 5]) -> Self {
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstraintType, &T)> {
        ConstraintType::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(ConstraintType, &T) -> U) -> FamilyMap<U> {
        FamilyMap {
            values: ConstraintType::ALL.map(|kind| f(kind, &self.values[kind.index()])),
        }
    }
}

impl<T: Default> Default for FamilyMap<T> {
    fn default() -> Self {
        Self {
            values: Default::default(),
        }
    }
}

impl<T> Index<ConstraintType> for FamilyMap<T> {
    type Output = T;

    fn index(&self, kind: ConstraintType) -> &T {
        &self.values[kind.index()]
    }
}

impl<T> IndexMut<ConstraintType> for FamilyMap<T> {
    fn index_mut(&mut self, kind: ConstraintType) -> &mut T {
        &mut self.values[kind.index()]
    }
}

/// Response of a link when it is too long (`shrink`) or too short (`stretch`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strength {
    pub shrink: f32,
    pub stretch: f32,
}

impl Default for Strength {
    fn default() -> Self {
        Self {
            shrink: 1.0,
            stretch: 1.0,
        }
    }
}

impl Strength {
    pub fn new(shrink: f32, stretch: f32) -> Self {
        Self { shrink, stretch }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            shrink: self.shrink * factor,
            stretch: self.stretch * factor,
        }
    }

    pub fn select(&self, is_shrink: bool) -> f32 {
        if is_shrink {
            self.shrink
        } else {
            self.stretch
        }
    }
}

/// Elastic link between two particle indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintType,
    pub index_a: usize,
    pub index_b: usize,
    /// Rest length measured at bind time.
    pub length: f32,
    pub shrink: f32,
    pub stretch: f32,
    /// Whether the link is pushed out of colliders during relaxation.
    pub collision: bool,
}

impl Constraint {
    pub fn new(kind: ConstraintType, index_a: usize, index_b: usize, length: f32) -> Self {
        Self {
            kind,
            index_a,
            index_b,
            length: length.max(0.0),
            shrink: 1.0,
            stretch: 1.0,
            collision: false,
        }
    }

    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.shrink = strength.shrink;
        self.stretch = strength.stretch;
        self
    }

    pub fn with_collision(mut self, collision: bool) -> Self {
        self.collision = collision;
        self
    }

    pub fn touches(&self, index: usize) -> bool {
        self.index_a == index || self.index_b == index
    }

    pub fn shares_point(&self, other: &Constraint) -> bool {
        self.touches(other.index_a) || self.touches(other.index_b)
    }

    /// Distance between the endpoints in `positions`.
    pub fn measure(&self, positions: impl Fn(usize) -> Vec3) -> f32 {
        positions(self.index_a).distance(positions(self.index_b))
    }

    /// Replaces the rest length with the live endpoint distance.
    pub fn rebind(&mut self, positions: impl Fn(usize) -> Vec3) {
        self.length = self.measure(positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_map_indexes_by_kind() {
        let mut flags = FamilyMap::splat(false);
        flags[ConstraintType::Shear] = true;
        assert!(flags[ConstraintType::Shear]);
        assert!(!flags[ConstraintType::BendingVertical]);
        assert_eq!(flags.iter().filter(|(_, on)| **on).count(), 1);
    }

    #[test]
    fn constraints_sharing_an_endpoint_are_detected() {
        let a = Constraint::new(ConstraintType::Shear, 1, 2, 1.0);
        let b = Constraint::new(ConstraintType::Shear, 2, 3, 1.0);
        let c = Constraint::new(ConstraintType::Shear, 4, 5, 1.0);
        assert!(a.shares_point(&b));
        assert!(!a.shares_point(&c));
    }

    #[test]
    fn negative_lengths_are_clamped() {
        let c = Constraint::new(ConstraintType::StructuralVertical, 0, 1, -2.0);
        assert_eq!(c.length, 0.0);
    }
}
