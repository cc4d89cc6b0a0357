//! Component type identity, per-registry type metadata, and bundles.
//!
//! This module provides the type service that the rest of the engine is
//! built on:
//!
//! - [`ComponentTypeId`], a stable, comparable identifier derived from a
//!   component's Rust type,
//! - [`TypeRegistry`], the per-registry table mapping identifiers to
//!   component metadata and column factories,
//! - [`TypeSet`], the canonical sorted list of component types that names
//!   an archetype,
//! - [`ComponentBundle`] and [`ComponentSet`], the tuple traits through
//!   which callers supply component values and component type lists.
//!
//! ## Design
//! Type metadata is owned by each registry rather than stored in a
//! process-wide table, so multiple registries coexist within one process
//! and within one test binary. Registration is lazy and idempotent: the
//! first `create` or `put` that mentions a component type installs its
//! metadata and column factory.
//!
//! ## Invariants
//! - `ComponentTypeId(T) == ComponentTypeId(U)` iff `T` and `U` are the
//!   same type.
//! - A registered component always has a corresponding column factory.
//! - A [`TypeSet`] is sorted and free of duplicates.

use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{align_of, size_of};

use crate::engine::error::DuplicateComponentError;
use crate::engine::storage::{Column, TypeErasedColumn};

/// Marker trait satisfied by any type usable as a component.
///
/// The engine treats components opaquely; the only requirements are the
/// ones needed to store them in columns and read them from the rayon
/// pool. Implemented automatically for every eligible type.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Stable, comparable identifier for a component type.
///
/// ## Purpose
/// Identifies a component type at runtime. Two distinct types always
/// yield two distinct identifiers; the same type always yields the same
/// identifier within a process.
///
/// ## Representation
/// Wraps [`std::any::TypeId`] and carries the type name for diagnostics.
/// Equality, ordering and hashing use the id only, so the name never
/// influences archetype identity.
#[derive(Clone, Copy, Debug)]
pub struct ComponentTypeId {
    id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Returns the identifier for component type `T`.
    #[inline]
    pub fn of<T: Component>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>() }
    }

    /// Returns the underlying [`TypeId`].
    #[inline]
    pub fn type_id(self) -> TypeId { self.id }

    /// Returns the Rust type name, for diagnostics only.
    #[inline]
    pub fn name(self) -> &'static str { self.name }
}

impl PartialEq for ComponentTypeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for ComponentTypeId {}

impl PartialOrd for ComponentTypeId {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ComponentTypeId {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering { self.id.cmp(&other.id) }
}

impl Hash for ComponentTypeId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Factory function constructing an empty type-erased column.
pub type ColumnFactory = fn() -> Box<dyn TypeErasedColumn>;

fn new_column_storage<T: Component>() -> Box<dyn TypeErasedColumn> {
    Box::new(Column::<T>::default())
}

/// Describes a registered component type.
///
/// ## Fields
/// - `name`: The Rust type name (`type_name::<T>()`).
/// - `size`: `size_of::<T>()` in bytes.
/// - `align`: `align_of::<T>()` in bytes.
/// - `factory`: Constructs an empty column for this type; used when a new
///   archetype needs a column it has never seen.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// Constructs an empty column storing this component type.
    pub factory: ColumnFactory,
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .finish()
    }
}

/// Per-registry mapping between component types and their metadata.
///
/// ## Purpose
/// Associates each [`ComponentTypeId`] with the metadata and column
/// factory needed to allocate archetype storage for that type.
///
/// ## Design
/// Owned by the registry it serves; no process-wide state. Registration
/// is idempotent.
#[derive(Default)]
pub struct TypeRegistry {
    infos: HashMap<ComponentTypeId, TypeInfo>,
}

impl TypeRegistry {
    /// Creates an empty type registry.
    pub fn new() -> Self { Self::default() }

    /// Registers component type `T`, returning its identifier.
    ///
    /// Re-registering an already known type is a no-op.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        let id = ComponentTypeId::of::<T>();
        self.infos.entry(id).or_insert_with(|| TypeInfo {
            name: type_name::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            factory: new_column_storage::<T>,
        });
        id
    }

    /// Returns the metadata for a registered component type.
    pub fn info(&self, id: ComponentTypeId) -> Option<&TypeInfo> {
        self.infos.get(&id)
    }

    /// Constructs an empty column for a registered component type.
    pub fn new_column(&self, id: ComponentTypeId) -> Option<Box<dyn TypeErasedColumn>> {
        self.infos.get(&id).map(|info| (info.factory)())
    }

    /// Returns the number of registered component types.
    pub fn len(&self) -> usize { self.infos.len() }

    /// Returns `true` if no component types are registered.
    pub fn is_empty(&self) -> bool { self.infos.is_empty() }
}

/// Canonical sorted list of component types identifying an archetype.
///
/// ## Invariants
/// - The list is sorted by [`ComponentTypeId`] ordering.
/// - Each type appears at most once.
///
/// Two type-sets built from the same types in any order compare and hash
/// identically, so archetype identity is order-independent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TypeSet(Vec<ComponentTypeId>);

impl TypeSet {
    /// Builds a canonical type-set from a list of component identifiers.
    ///
    /// ## Errors
    /// Returns [`DuplicateComponentError`] naming the first type that
    /// appears more than once.
    pub fn new(mut ids: Vec<ComponentTypeId>) -> Result<Self, DuplicateComponentError> {
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(DuplicateComponentError { component: pair[0] });
            }
        }
        Ok(Self(ids))
    }

    /// Returns the empty type-set.
    ///
    /// Only the handle-only archetype carries an empty set; entity
    /// creation always supplies at least one component.
    pub fn empty() -> Self { Self(Vec::new()) }

    /// Returns the component identifiers in canonical order.
    #[inline]
    pub fn as_slice(&self) -> &[ComponentTypeId] { &self.0 }

    /// Returns the number of component types in the set.
    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `true` if the set contains no component types.
    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns `true` if `id` is a member of this set.
    #[inline]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Returns the position of `id` within the canonical order.
    #[inline]
    pub fn position(&self, id: ComponentTypeId) -> Option<usize> {
        self.0.binary_search(&id).ok()
    }

    /// Returns `true` if every id in `ids` is a member of this set.
    pub fn contains_all(&self, ids: &[ComponentTypeId]) -> bool {
        ids.iter().all(|&id| self.contains(id))
    }

    /// Returns this set extended with `ids`.
    ///
    /// Members of `ids` already present are kept once.
    pub fn with(&self, ids: &[ComponentTypeId]) -> TypeSet {
        let mut merged = self.0.clone();
        merged.extend(ids.iter().copied().filter(|&id| !self.contains(id)));
        merged.sort_unstable();
        TypeSet(merged)
    }

    /// Returns this set with every member of `ids` removed.
    pub fn without(&self, ids: &[ComponentTypeId]) -> TypeSet {
        TypeSet(
            self.0
                .iter()
                .copied()
                .filter(|id| !ids.contains(id))
                .collect(),
        )
    }

    /// Iterates over the component identifiers in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.0.iter().copied()
    }
}

/// Verifies that a list of component identifiers is free of duplicates.
pub(crate) fn check_distinct(ids: &[ComponentTypeId]) -> Result<(), DuplicateComponentError> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(DuplicateComponentError { component: pair[0] });
        }
    }
    Ok(())
}

/// Tuple of component values supplied to `create` and `put`.
///
/// Implemented for tuples of one to eight components. A bundle is
/// consumed into `(id, value)` pairs; the registry canonicalises the
/// type list and rejects duplicates before any state changes.
pub trait ComponentBundle {
    /// Returns the component identifiers in declaration order.
    fn component_ids() -> Vec<ComponentTypeId>;

    /// Registers every component type in the bundle.
    fn register(types: &mut TypeRegistry);

    /// Consumes the bundle into type-erased component values.
    fn into_values(self) -> Vec<(ComponentTypeId, Box<dyn Any>)>;
}

/// Tuple of component *types* supplied to `remove`.
///
/// Implemented for tuples of one to eight components. Only the type list
/// matters; no values are carried.
pub trait ComponentSet {
    /// Returns the component identifiers in declaration order.
    fn component_ids() -> Vec<ComponentTypeId>;
}

macro_rules! impl_component_bundle {
    ($(($T:ident, $i:tt)),+) => {
        impl<$($T: Component),+> ComponentBundle for ($($T,)+) {
            fn component_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$T>()),+]
            }

            fn register(types: &mut TypeRegistry) {
                $(types.register::<$T>();)+
            }

            fn into_values(self) -> Vec<(ComponentTypeId, Box<dyn Any>)> {
                vec![$(
                    (ComponentTypeId::of::<$T>(), Box::new(self.$i) as Box<dyn Any>)
                ),+]
            }
        }
    };
}

impl_component_bundle!((A, 0));
impl_component_bundle!((A, 0), (B, 1));
impl_component_bundle!((A, 0), (B, 1), (C, 2));
impl_component_bundle!((A, 0), (B, 1), (C, 2), (D, 3));
impl_component_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_component_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_component_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_component_bundle!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6), (H, 7));

macro_rules! impl_component_set {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            fn component_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$T>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
