//! # VECS
//!
//! Archetype-based entity-component storage and query engine.
//!
//! An *entity* is an opaque, generation-checked [`Handle`]; its
//! *components* are values of arbitrary user types stored column-wise.
//! Entities sharing the same set of component types live together in an
//! *archetype*, a group of dense, aligned columns, so queries iterate
//! contiguous memory and touch only the columns they ask for.
//!
//! ## Design Goals
//! - Archetype-based columnar storage for cache efficiency
//! - Stable handles across any internal storage reorganization
//! - Structural changes as single archetype transitions
//! - Explicit, recoverable errors on every fallible operation
//!
//! ## Example
//! ```
//! use vecs::Registry;
//!
//! #[derive(Debug, PartialEq)]
//! struct Health(f32);
//! struct Armour(u32);
//!
//! let mut registry = Registry::new();
//! let soldier = registry.create((Health(100.0), Armour(3))).unwrap();
//!
//! for (_handle, (health,)) in registry.view::<(Health,)>() {
//!     assert_eq!(*health, Health(100.0));
//! }
//!
//! registry.remove::<(Armour,)>(soldier).unwrap();
//! assert!(!registry.has::<Armour>(soldier));
//! assert!(registry.exists(soldier));
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::registry::Registry;

pub use engine::slot_map::{EntityLocation, Handle, SlotMap};

pub use engine::component::{
    Component,
    ComponentBundle,
    ComponentSet,
    ComponentTypeId,
    TypeInfo,
    TypeRegistry,
    TypeSet,
};

pub use engine::archetype::Archetype;

pub use engine::view::{Query, View, ViewIter, ViewIterMut};

pub use engine::error::{
    CapacityError,
    ColumnError,
    DuplicateComponentError,
    EcsError,
    EcsResult,
    MissingComponentError,
    PositionOutOfBoundsError,
    TypeMismatchError,
};

pub use engine::types::{ArchetypeId, Generation, RowIndex, SlotIndex, StorageId};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use vecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Component,
        EcsError,
        EcsResult,
        Handle,
        Query,
        Registry,
        View,
    };
}
