//! Constraint storage with a per-type index, plus the variable usage index.

use crate::instance::SolverInstance;
use crate::instance::arena::{Arena, SlotKey};
use optera_expr::{ConstraintRef, ConstraintType, Function, InstanceId, Set, VariableRef};
use optera_solver::{Backend, SolverError};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub(crate) struct StoredConstraint {
    pub function: Function,
    pub set: Set,
    /// False once a variable the function references has been deleted.
    pub consistent: bool,
}

/// Live variables and the constraints that reference each of them.
#[derive(Debug, Clone, Default)]
pub(crate) struct VariableEntry {
    pub users: BTreeSet<ConstraintRef>,
}

pub(crate) fn variable_key(variable: VariableRef) -> SlotKey {
    SlotKey {
        index: variable.index(),
        generation: variable.generation(),
    }
}

pub(crate) fn constraint_key(constraint: ConstraintRef) -> SlotKey {
    SlotKey {
        index: constraint.index(),
        generation: constraint.generation(),
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ConstraintStore {
    entries: Arena<StoredConstraint>,
    by_type: BTreeMap<ConstraintType, BTreeMap<u64, ConstraintRef>>,
}

impl ConstraintStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Handle the next insert of a constraint of `constraint_type` will get.
    pub fn next_ref(&self, owner: InstanceId, constraint_type: ConstraintType) -> ConstraintRef {
        let key = self.entries.next_key();
        ConstraintRef::new(owner, key.index, key.generation, constraint_type)
    }

    pub fn insert(&mut self, constraint: ConstraintRef, function: Function, set: Set) {
        let key = self.entries.insert(StoredConstraint {
            function,
            set,
            consistent: true,
        });
        debug_assert_eq!(key, constraint_key(constraint));
        if let Some(sequence) = self.entries.sequence(key) {
            self.by_type
                .entry(constraint.constraint_type())
                .or_default()
                .insert(sequence, constraint);
        }
    }

    /// Entry behind a handle whose generation and type still match.
    pub fn get(&self, constraint: ConstraintRef) -> Option<&StoredConstraint> {
        let key = constraint_key(constraint);
        self.entries.get(key).filter(|entry| {
            ConstraintType::of(&entry.function, &entry.set) == constraint.constraint_type()
        })
    }

    pub fn get_mut(&mut self, constraint: ConstraintRef) -> Option<&mut StoredConstraint> {
        let expected = constraint.constraint_type();
        self.entries
            .get_mut(constraint_key(constraint))
            .filter(|entry| ConstraintType::of(&entry.function, &entry.set) == expected)
    }

    pub fn remove(&mut self, constraint: ConstraintRef) -> Option<StoredConstraint> {
        let key = constraint_key(constraint);
        let sequence = self.entries.sequence(key)?;
        let removed = self.entries.remove(key)?;
        let constraint_type = constraint.constraint_type();
        if let Some(index) = self.by_type.get_mut(&constraint_type) {
            index.remove(&sequence);
            if index.is_empty() {
                self.by_type.remove(&constraint_type);
            }
        }
        Some(removed)
    }

    pub fn count_of_type(&self, constraint_type: ConstraintType) -> usize {
        self.by_type.get(&constraint_type).map_or(0, BTreeMap::len)
    }

    /// Constraints of one type in creation order.
    pub fn refs_of_type(&self, constraint_type: ConstraintType) -> Vec<ConstraintRef> {
        self.by_type
            .get(&constraint_type)
            .map(|index| index.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn types_present(&self) -> Vec<ConstraintType> {
        self.by_type.keys().copied().collect()
    }

    /// All constraints in creation order.
    pub fn iter(&self, owner: InstanceId) -> impl Iterator<Item = (ConstraintRef, &StoredConstraint)> + '_ {
        self.entries.iter().map(move |(key, entry)| {
            (
                ConstraintRef::new(
                    owner,
                    key.index,
                    key.generation,
                    ConstraintType::of(&entry.function, &entry.set),
                ),
                entry,
            )
        })
    }

    pub fn has_inconsistent(&self) -> bool {
        self.entries.iter().any(|(_, entry)| !entry.consistent)
    }
}

impl<B: Backend> SolverInstance<B> {
    /// The stored function of a live, consistent constraint.
    pub fn constraint_function(&self, constraint: ConstraintRef) -> Result<&Function, SolverError> {
        self.ensure_constraint(constraint).map(|entry| &entry.function)
    }

    /// The stored set of a live, consistent constraint.
    pub fn constraint_set(&self, constraint: ConstraintRef) -> Result<&Set, SolverError> {
        self.ensure_constraint(constraint).map(|entry| &entry.set)
    }

    pub fn number_of_constraints(&self, constraint_type: ConstraintType) -> usize {
        self.constraints.count_of_type(constraint_type)
    }

    /// Constraints of one type in creation order.
    pub fn list_of_constraints(&self, constraint_type: ConstraintType) -> Vec<ConstraintRef> {
        self.constraints.refs_of_type(constraint_type)
    }

    pub fn list_of_constraint_types_present(&self) -> Vec<ConstraintType> {
        self.constraints.types_present()
    }

    pub fn total_constraints(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optera_expr::{FunctionType, SetType};

    fn scalar_le(owner: InstanceId, store: &ConstraintStore, x: VariableRef) -> (ConstraintRef, Function, Set) {
        let function = Function::ScalarVariable(x);
        let set = Set::LessThan { upper: 1.0 };
        let tag = ConstraintType::of(&function, &set);
        (store.next_ref(owner, tag), function, set)
    }

    #[test]
    fn test_type_index_tracks_inserts_and_removals() {
        let owner = InstanceId::fresh();
        let x = VariableRef::new(owner, 0, 0);
        let mut store = ConstraintStore::default();
        let (c1, f1, s1) = scalar_le(owner, &store, x);
        store.insert(c1, f1, s1);
        let (c2, f2, s2) = scalar_le(owner, &store, x);
        store.insert(c2, f2, s2);

        let tag = ConstraintType::new(FunctionType::ScalarVariable, SetType::LessThan);
        assert_eq!(store.count_of_type(tag), 2);
        assert_eq!(store.refs_of_type(tag), vec![c1, c2]);

        store.remove(c1);
        assert_eq!(store.refs_of_type(tag), vec![c2]);
        store.remove(c2);
        assert!(store.types_present().is_empty());
        assert!(store.get(c2).is_none());
    }

    #[test]
    fn test_wrong_type_tag_does_not_resolve() {
        let owner = InstanceId::fresh();
        let x = VariableRef::new(owner, 0, 0);
        let mut store = ConstraintStore::default();
        let (c, f, s) = scalar_le(owner, &store, x);
        store.insert(c, f, s);
        let forged = ConstraintRef::new(
            owner,
            c.index(),
            c.generation(),
            ConstraintType::new(FunctionType::ScalarVariable, SetType::GreaterThan),
        );
        assert!(store.get(forged).is_none());
        assert!(store.get(c).is_some());
    }
}
