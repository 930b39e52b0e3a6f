use std::collections::HashSet;

use glam::Vec3;

use crate::core::constraints::Constraint;

/// Constraints that share no particle and can be relaxed side by side.
#[derive(Debug, Clone, Default)]
pub struct ConstraintBatch {
    constraints: Vec<Constraint>,
    endpoints: HashSet<usize>,
}

impl ConstraintBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn accepts(&self, constraint: &Constraint) -> bool {
        !self.endpoints.contains(&constraint.index_a) && !self.endpoints.contains(&constraint.index_b)
    }

    /// Adds `constraint` if neither endpoint is already used by this batch.
    pub fn try_push(&mut self, constraint: Constraint) -> bool {
        if !self.accepts(&constraint) {
            return false;
        }
        self.endpoints.insert(constraint.index_a);
        self.endpoints.insert(constraint.index_b);
        self.constraints.push(constraint);
        true
    }

    pub fn recompute_lengths(&mut self, positions: &[Vec3]) {
        for constraint in &mut self.constraints {
            constraint.rebind(|index| positions[index]);
        }
    }
}

/// First-fit partition: each constraint goes into the earliest batch that
/// does not touch its endpoints, or opens a new batch.
pub fn build_batches<'a>(constraints: impl IntoIterator<Item = &'a Constraint>) -> Vec<ConstraintBatch> {
    let mut batches: Vec<ConstraintBatch> = Vec::new();
    for constraint in constraints {
        if let Some(batch) = batches.iter_mut().find(|batch| batch.accepts(constraint)) {
            batch.try_push(*constraint);
            continue;
        }
        let mut batch = ConstraintBatch::new();
        batch.try_push(*constraint);
        batches.push(batch);
    }
    batches
}
