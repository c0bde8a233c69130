//! Opaque, instance-scoped handles for variables and constraints.
//!
//! A handle is `(owner, index, generation)`. The index addresses an arena slot
//! inside the owning instance; the generation changes every time the slot is
//! vacated, so a handle that outlived its target never aliases a newer entity.

use crate::constraint::ConstraintType;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identity of the solver instance that issued a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct InstanceId(u32);

static NEXT_INSTANCE_ID: AtomicU32 = AtomicU32::new(1);

impl InstanceId {
    /// Allocate a process-unique instance id.
    pub fn fresh() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the inner u32 value.
    pub fn inner(self) -> u32 {
        self.0
    }
}

macro_rules! define_handle_accessors {
    () => {
        /// Instance that issued this handle.
        pub fn owner(self) -> InstanceId {
            self.owner
        }

        /// Arena slot of the handle inside its instance.
        pub fn index(self) -> u32 {
            self.index
        }

        /// Generation of the slot when the handle was issued.
        pub fn generation(self) -> u32 {
            self.generation
        }
    };
}

/// Handle to a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariableRef {
    owner: InstanceId,
    index: u32,
    generation: u32,
}

impl VariableRef {
    /// Create a handle. Instances mint these; constructing one by hand only
    /// yields a reference the issuing instance will validate.
    pub fn new(owner: InstanceId, index: u32, generation: u32) -> Self {
        Self {
            owner,
            index,
            generation,
        }
    }

    define_handle_accessors!();
}

impl std::fmt::Display for VariableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}#{}", self.index, self.generation)
    }
}

/// Handle to a constraint, tagged with the `(FunctionType, SetType)` it was
/// created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstraintRef {
    owner: InstanceId,
    index: u32,
    generation: u32,
    constraint_type: ConstraintType,
}

impl ConstraintRef {
    pub fn new(
        owner: InstanceId,
        index: u32,
        generation: u32,
        constraint_type: ConstraintType,
    ) -> Self {
        Self {
            owner,
            index,
            generation,
            constraint_type,
        }
    }

    define_handle_accessors!();

    /// The immutable type tag assigned at creation.
    pub fn constraint_type(self) -> ConstraintType {
        self.constraint_type
    }
}

impl std::fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "c{}#{}[{}]",
            self.index, self.generation, self.constraint_type
        )
    }
}
